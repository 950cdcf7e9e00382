//! Per-site source adapters.
//!
//! Each supported site gets one `SourceAdapter` implementation carrying its
//! selectors and URL-pattern policy. Adding a site means adding a variant
//! here and listing it in [`adapter_by_name`].

use std::sync::Arc;

use newswatch_core::traits::SourceAdapter;
use scraper::{ElementRef, Html, Selector};

mod techcrunch;
mod verge;

pub use techcrunch::TechCrunchAdapter;
pub use verge::VergeAdapter;

/// Look up a registered adapter by its config name.
pub fn adapter_by_name(name: &str) -> Option<Arc<dyn SourceAdapter>> {
    match name {
        "techcrunch" => Some(Arc::new(TechCrunchAdapter::new())),
        "verge" => Some(Arc::new(VergeAdapter::new())),
        _ => None,
    }
}

/// Names accepted by [`adapter_by_name`], for config error messages.
pub fn known_adapters() -> &'static [&'static str] {
    &["techcrunch", "verge"]
}

/// Element text with runs of whitespace collapsed to single spaces.
fn normalized_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty text among an ordered list of heading candidates.
fn first_heading(doc: &Html, candidates: &[Selector]) -> Option<String> {
    candidates
        .iter()
        .flat_map(|sel| doc.select(sel))
        .map(|el| normalized_text(&el))
        .find(|text| !text.is_empty())
}

/// Text of every element matching `selector`, concatenated in document order.
fn collected_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .map(|el| normalized_text(&el))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True for site-relative links under a dated path, e.g. `/2024/1/...`.
/// Any four-digit year is accepted; pinning a year would go stale.
fn is_dated_path(href: &str) -> bool {
    let Some(rest) = href.strip_prefix('/') else {
        return false;
    };
    match rest.split('/').next() {
        Some(seg) => seg.len() == 4 && seg.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_path_accepts_any_four_digit_year() {
        assert!(is_dated_path("/2023/12/31/story"));
        assert!(is_dated_path("/2024/1/a"));
        assert!(is_dated_path("/1999/1/retro"));
    }

    #[test]
    fn dated_path_rejects_other_shapes() {
        assert!(!is_dated_path("/about"));
        assert!(!is_dated_path("/202/1/short-year"));
        assert!(!is_dated_path("2024/1/relative-no-slash"));
        assert!(!is_dated_path("https://example.com/2024/1/absolute"));
        assert!(!is_dated_path("/"));
    }

    #[test]
    fn normalized_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  spaced \n  out\ttext </p>");
        let sel = Selector::parse("p").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(normalized_text(&el), "spaced out text");
    }

    #[test]
    fn registry_knows_both_sites() {
        for name in known_adapters() {
            let adapter = adapter_by_name(name).unwrap();
            assert_eq!(adapter.name(), *name);
        }
        assert!(adapter_by_name("unknown-site").is_none());
    }
}
