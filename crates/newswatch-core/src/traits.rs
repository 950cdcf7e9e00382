use std::collections::BTreeSet;
use std::future::Future;

use crate::error::{ExtractError, FetchError, SinkError, StoreError};
use crate::models::{FetchMode, ScrapedArticle};

/// Retrieves page content for a URL, either as raw markup or as the
/// fully rendered document.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Durable source-name → content-hash persistence.
///
/// `get` and `set` are individually atomic; the monitor performs
/// get-then-decide-then-set without store-level transactions, which is safe
/// because two cycles for the same source never overlap.
pub trait HashStore: Send + Sync + Clone {
    fn get(
        &self,
        source_name: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(
        &self,
        source_name: &str,
        hash: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Site-specific link discovery and article extraction rules.
///
/// One implementation per supported site; new sites are added by
/// implementing this trait, not by copying a module. Methods are
/// synchronous DOM work over already-fetched markup, so the trait stays
/// dyn-compatible and a `Source` can carry `Arc<dyn SourceAdapter>`.
pub trait SourceAdapter: Send + Sync {
    /// Short identifier used in config and logs (e.g. "verge").
    fn name(&self) -> &str;

    /// Parse the landing page and return de-duplicated article URLs,
    /// relative or absolute, matching the site's URL-pattern policy.
    /// Zero matches is an empty set, not an error.
    fn discover_links(&self, landing_html: &str) -> BTreeSet<String>;

    /// Locate the headline and concatenate the content-bearing elements of
    /// an article page, in document order, with whitespace normalised.
    fn extract_article(&self, article_html: &str) -> Result<(String, String), ExtractError>;
}

/// Receives completed article batches. The monitor makes no assumption
/// about how articles are stored or deduplicated downstream.
pub trait ArticleSink: Send + Sync + Clone {
    fn ingest(
        &self,
        batch: Vec<ScrapedArticle>,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// A no-op sink for when articles only need to be logged, not handed off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ArticleSink for NullSink {
    async fn ingest(&self, _batch: Vec<ScrapedArticle>) -> Result<(), SinkError> {
        Ok(())
    }
}
