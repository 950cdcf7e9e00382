use chrono::Utc;
use url::Url;

use crate::error::{ArticleError, FetchError};
use crate::models::{ArticleFailure, ScrapeResult, ScrapedArticle, Source};
use crate::traits::Fetcher;

/// Turns a changed landing page into a batch of articles.
///
/// Invoked only after the change detector reports `Changed`; link discovery
/// runs against the landing HTML the detector already fetched. Articles are
/// fetched and extracted one at a time — work for a single source is
/// strictly sequential — and a failed article lands in `errors` without
/// aborting the rest of the batch.
pub struct ScrapeOrchestrator<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> ScrapeOrchestrator<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn run(&self, source: &Source, landing_html: &str) -> ScrapeResult {
        let links = source.adapter.discover_links(landing_html);
        tracing::debug!(
            source = %source.name,
            links = links.len(),
            "Discovered article links"
        );

        let mut result = ScrapeResult::default();
        for link in links {
            let url = match resolve_link(&source.base_url, &link) {
                Ok(url) => url,
                Err(e) => {
                    result.errors.push(ArticleFailure {
                        url: link,
                        error: ArticleError::Fetch(e),
                    });
                    continue;
                }
            };
            match self.scrape_article(source, url.as_str()).await {
                Ok(article) => result.articles.push(article),
                Err(error) => result.errors.push(ArticleFailure {
                    url: url.into(),
                    error,
                }),
            }
        }

        tracing::info!(
            source = %source.name,
            articles = result.articles.len(),
            failed = result.errors.len(),
            "Scrape run complete"
        );
        result
    }

    async fn scrape_article(
        &self,
        source: &Source,
        url: &str,
    ) -> Result<ScrapedArticle, ArticleError> {
        let html = self.fetcher.fetch(url, source.article_mode).await?;
        let (heading, content) = source.adapter.extract_article(&html)?;
        Ok(ScrapedArticle {
            source_name: source.name.clone(),
            url: url.to_string(),
            heading,
            content,
            discovered_at: Utc::now(),
        })
    }
}

/// Resolve a discovered link against the source's base URL. Already-absolute
/// hrefs pass through unchanged.
fn resolve_link(base: &Url, link: &str) -> Result<Url, FetchError> {
    base.join(link)
        .map_err(|e| FetchError::InvalidUrl(format!("{link}: {e}")))
}
