use std::sync::Arc;
use std::time::Duration;

use newswatch_core::error::FetchError;
use newswatch_core::models::FetchMode;
use newswatch_core::traits::Fetcher;
use reqwest::Client;

use crate::browser::BrowserPool;

const USER_AGENT: &str = concat!("newswatch/", env!("CARGO_PKG_VERSION"));

/// Static HTTP fetcher using reqwest.
///
/// Downloads raw markup with a configurable timeout; no script execution.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                FetchError::Network(format!("connection failed: {e}"))
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response body: {e}")))
    }
}

/// Combined fetcher: `Static` goes straight over HTTP, `Rendered` through
/// the shared headless-browser pool.
#[derive(Clone)]
pub struct SiteFetcher {
    http: HttpFetcher,
    browser: Arc<BrowserPool>,
}

impl SiteFetcher {
    /// `pool_size` bounds concurrently rendered pages; `timeout` applies to
    /// both fetch paths.
    pub fn new(pool_size: usize, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpFetcher::with_timeout(timeout)?,
            browser: Arc::new(BrowserPool::new(pool_size, timeout)),
        })
    }
}

impl Fetcher for SiteFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<String, FetchError> {
        match mode {
            FetchMode::Static => self.http.get(url).await,
            FetchMode::Rendered => self.browser.render(url).await,
        }
    }
}
