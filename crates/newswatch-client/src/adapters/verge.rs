use std::collections::BTreeSet;

use newswatch_core::error::ExtractError;
use newswatch_core::traits::SourceAdapter;
use scraper::{Html, Selector};

use super::{collected_text, first_heading, is_dated_path};

/// Adapter for The Verge tech section.
///
/// Article links are the anchors inside `h2` teasers, restricted to dated
/// site-relative paths. Headings have two known templates; body text lives
/// in CMS-markup paragraphs.
pub struct VergeAdapter {
    links: Selector,
    headings: Vec<Selector>,
    content: Selector,
}

impl VergeAdapter {
    pub fn new() -> Self {
        Self {
            links: Selector::parse("h2 a").expect("static selector"),
            headings: vec![
                Selector::parse("h1.inline").expect("static selector"),
                Selector::parse("h1.duet--article--feature-headline").expect("static selector"),
            ],
            content: Selector::parse("p.duet--article--dangerously-set-cms-markup")
                .expect("static selector"),
        }
    }
}

impl Default for VergeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for VergeAdapter {
    fn name(&self) -> &str {
        "verge"
    }

    fn discover_links(&self, landing_html: &str) -> BTreeSet<String> {
        let doc = Html::parse_document(landing_html);
        doc.select(&self.links)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| is_dated_path(href))
            .map(str::to_string)
            .collect()
    }

    fn extract_article(&self, article_html: &str) -> Result<(String, String), ExtractError> {
        let doc = Html::parse_document(article_html);
        let heading = first_heading(&doc, &self.headings).ok_or(ExtractError::MissingHeading)?;
        let content = collected_text(&doc, &self.content);
        if content.is_empty() {
            return Err(ExtractError::MissingContent);
        }
        Ok((heading, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"
        <html><body>
          <h2><a href="/2024/1/5/phone-review">Phone review</a></h2>
          <h2><a href="/2024/1/6/laptop-news">Laptop news</a></h2>
          <h2><a href="/2024/1/5/phone-review">Phone review repeat</a></h2>
          <h2><a href="/podcasts">Podcasts</a></h2>
          <h2>No link here</h2>
          <a href="/2024/1/7/not-a-teaser">Outside an h2</a>
        </body></html>
    "#;

    #[test]
    fn discovers_only_dated_teaser_links() {
        let adapter = VergeAdapter::new();
        let links = adapter.discover_links(LANDING);
        assert_eq!(links.len(), 2);
        assert!(links.contains("/2024/1/5/phone-review"));
        assert!(links.contains("/2024/1/6/laptop-news"));
    }

    #[test]
    fn heading_candidates_are_tried_in_order() {
        let adapter = VergeAdapter::new();

        let inline = r#"
            <html><body>
              <h1 class="inline">Inline headline</h1>
              <p class="duet--article--dangerously-set-cms-markup">Body.</p>
            </body></html>
        "#;
        let (heading, _) = adapter.extract_article(inline).unwrap();
        assert_eq!(heading, "Inline headline");

        let feature = r#"
            <html><body>
              <h1 class="duet--article--feature-headline">Feature headline</h1>
              <p class="duet--article--dangerously-set-cms-markup">Body.</p>
            </body></html>
        "#;
        let (heading, _) = adapter.extract_article(feature).unwrap();
        assert_eq!(heading, "Feature headline");
    }

    #[test]
    fn paragraphs_concatenate_in_document_order() {
        let html = r#"
            <html><body>
              <h1 class="inline">Headline</h1>
              <p class="duet--article--dangerously-set-cms-markup">First   paragraph.</p>
              <p>Unrelated paragraph.</p>
              <p class="duet--article--dangerously-set-cms-markup">Second
                 paragraph.</p>
            </body></html>
        "#;
        let (_, content) = VergeAdapter::new().extract_article(html).unwrap();
        assert_eq!(content, "First paragraph. Second paragraph.");
    }

    #[test]
    fn missing_heading_and_content_are_distinct_errors() {
        let adapter = VergeAdapter::new();
        let no_heading = r#"
            <html><body>
              <p class="duet--article--dangerously-set-cms-markup">Body.</p>
            </body></html>
        "#;
        assert_eq!(
            adapter.extract_article(no_heading).unwrap_err(),
            ExtractError::MissingHeading
        );

        let no_content = r#"<html><body><h1 class="inline">Headline</h1></body></html>"#;
        assert_eq!(
            adapter.extract_article(no_content).unwrap_err(),
            ExtractError::MissingContent
        );
    }
}
