use std::collections::BTreeSet;

use newswatch_core::error::ExtractError;
use newswatch_core::traits::SourceAdapter;
use scraper::{Html, Selector};

use super::{collected_text, first_heading};

/// Adapter for the TechCrunch landing page and article layout.
///
/// Links come from the post-title anchors and are absolute; the heading
/// candidates cover the classic and the block-editor article templates.
pub struct TechCrunchAdapter {
    links: Selector,
    headings: Vec<Selector>,
    content: Selector,
}

impl TechCrunchAdapter {
    pub fn new() -> Self {
        Self {
            links: Selector::parse("a.post-block__title__link").expect("static selector"),
            headings: vec![
                Selector::parse("h1.article__title").expect("static selector"),
                Selector::parse("h1.wp-block-post-title").expect("static selector"),
            ],
            content: Selector::parse("div.article-content").expect("static selector"),
        }
    }
}

impl Default for TechCrunchAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for TechCrunchAdapter {
    fn name(&self) -> &str {
        "techcrunch"
    }

    fn discover_links(&self, landing_html: &str) -> BTreeSet<String> {
        let doc = Html::parse_document(landing_html);
        doc.select(&self.links)
            .filter_map(|a| a.value().attr("href"))
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
          <article>
            <a class="post-block__title__link" href="https://techcrunch.com/2024/01/05/first/">First</a>
          </article>
          <article>
            <a class="post-block__title__link" href="https://techcrunch.com/2024/01/05/second/">Second</a>
          </article>
          <article>
            <a class="post-block__title__link" href="https://techcrunch.com/2024/01/05/first/">First again</a>
          </article>
          <a href="https://techcrunch.com/events/">Events</a>
        </body></html>
    "#;

    #[test]
    fn discovers_deduplicated_post_links() {
        let adapter = TechCrunchAdapter::new();
        let links = adapter.discover_links(LANDING);
        assert_eq!(links.len(), 2);
        assert!(links.contains("https://techcrunch.com/2024/01/05/first/"));
        assert!(links.contains("https://techcrunch.com/2024/01/05/second/"));
    }

    #[test]
    fn zero_matches_is_an_empty_set() {
        let adapter = TechCrunchAdapter::new();
        assert!(adapter.discover_links("<html><body></body></html>").is_empty());
    }

    #[test]
    fn extracts_heading_and_joined_content() {
        let html = r#"
            <html><body>
              <h1 class="article__title">  Startup   raises round </h1>
              <div class="article-content"><p>Part one.</p></div>
              <div class="article-content"><p>Part two.</p></div>
            </body></html>
        "#;
        let adapter = TechCrunchAdapter::new();
        let (heading, content) = adapter.extract_article(html).unwrap();
        assert_eq!(heading, "Startup raises round");
        assert_eq!(content, "Part one. Part two.");
    }

    #[test]
    fn block_editor_heading_is_a_fallback() {
        let html = r#"
            <html><body>
              <h1 class="wp-block-post-title">New template</h1>
              <div class="article-content">Body.</div>
            </body></html>
        "#;
        let adapter = TechCrunchAdapter::new();
        let (heading, _) = adapter.extract_article(html).unwrap();
        assert_eq!(heading, "New template");
    }

    #[test]
    fn missing_heading_is_reported() {
        let html = r#"<html><body><div class="article-content">Body.</div></body></html>"#;
        let err = TechCrunchAdapter::new().extract_article(html).unwrap_err();
        assert_eq!(err, ExtractError::MissingHeading);
    }

    #[test]
    fn missing_content_is_reported() {
        let html = r#"<html><body><h1 class="article__title">Title</h1></body></html>"#;
        let err = TechCrunchAdapter::new().extract_article(html).unwrap_err();
        assert_eq!(err, ExtractError::MissingContent);
    }
}
