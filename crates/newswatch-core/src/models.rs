use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::ArticleError;
use crate::traits::SourceAdapter;

/// How a page is retrieved: raw markup or a headless-browser render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Direct HTTP retrieval of the raw markup.
    Static,
    /// Headless-browser load that executes client-side scripts first.
    Rendered,
}

/// A configured external site to monitor.
///
/// Sources are built from the registry at startup and immutable afterwards.
/// The adapter carries the site-specific link-discovery and extraction rules.
#[derive(Clone)]
pub struct Source {
    pub name: String,
    pub landing_url: String,
    /// Base for resolving relative article links.
    pub base_url: Url,
    pub landing_mode: FetchMode,
    pub article_mode: FetchMode,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        landing_url: impl Into<String>,
        base_url: Url,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self {
            name: name.into(),
            landing_url: landing_url.into(),
            base_url,
            landing_mode: FetchMode::Rendered,
            article_mode: FetchMode::Static,
            adapter,
        }
    }

    pub fn with_landing_mode(mut self, mode: FetchMode) -> Self {
        self.landing_mode = mode;
        self
    }

    pub fn with_article_mode(mut self, mode: FetchMode) -> Self {
        self.article_mode = mode;
        self
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("landing_url", &self.landing_url)
            .field("base_url", &self.base_url.as_str())
            .field("landing_mode", &self.landing_mode)
            .field("article_mode", &self.article_mode)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Last-seen state of a source's landing page, as persisted by the hash store.
///
/// One logical snapshot per source; prior values are overwritten, not
/// versioned. The hash is always the hash of the most recent successfully
/// fetched landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub source_name: String,
    pub content_hash: String,
    pub observed_at: DateTime<Utc>,
}

/// An article produced by extraction. Ownership transfers to the ingestion
/// sink as soon as the batch completes; the monitor keeps no reference.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapedArticle {
    pub source_name: String,
    pub url: String,
    pub heading: String,
    pub content: String,
    pub discovered_at: DateTime<Utc>,
}

/// A discovered article link that could not be turned into an article.
#[derive(Debug)]
pub struct ArticleFailure {
    pub url: String,
    pub error: ArticleError,
}

/// Outcome of one orchestration run over a changed source.
///
/// A failed article appears in `errors` and nowhere else; it never shrinks
/// `articles` beyond its own absence.
#[derive(Debug, Default)]
pub struct ScrapeResult {
    pub articles: Vec<ScrapedArticle>,
    pub errors: Vec<ArticleFailure>,
}

/// Compute a SHA-256 hash over raw page bytes, returned as 64-char hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash_consistency() {
        let h1 = compute_hash(b"<html>hello</html>");
        let h2 = compute_hash(b"<html>hello</html>");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_compute_hash_different_inputs() {
        assert_ne!(compute_hash(b"hello"), compute_hash(b"world"));
    }

    #[test]
    fn test_fetch_mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&FetchMode::Rendered).unwrap(),
            "\"rendered\""
        );
        let parsed: FetchMode = serde_json::from_str("\"static\"").unwrap();
        assert_eq!(parsed, FetchMode::Static);
    }
}
