use thiserror::Error;

/// Failure while retrieving a page, static or rendered.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network/connection error.
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its deadline.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Server answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Headless-browser failure (launch, navigation, CDP).
    #[error("browser error: {0}")]
    Browser(String),

    /// An expected element never appeared in the rendered page.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// URL could not be parsed or resolved.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true if this error is transient and a later cycle may succeed
    /// without operator intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Browser(_) | FetchError::ElementNotFound(_) => true,
            FetchError::InvalidUrl(_) => false,
        }
    }
}

/// Failure while pulling a heading/content pair out of an article page.
///
/// These are reported in the aggregate scrape batch, never silently skipped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// None of the heading selector candidates matched.
    #[error("no heading element matched")]
    MissingHeading,

    /// No content-bearing element matched, or all matched elements were empty.
    #[error("no content elements matched")]
    MissingContent,
}

/// Failure of the durable hash store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store backend could not be reached (connect, open, pool exhausted).
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// A write did not commit.
    #[error("store write failed: {0}")]
    Write(String),

    /// A read query failed.
    #[error("store query failed: {0}")]
    Query(String),
}

/// Failure of a single change-detection pass for a source.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure while handing a batch of articles to the external sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink rejected batch: {0}")]
    Ingest(String),
}

/// Why a single discovered article did not make it into the batch.
#[derive(Error, Debug)]
pub enum ArticleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl ArticleError {
    /// A transient failure may clear up on the next scrape of the same page;
    /// extraction failures are structural and will not.
    pub fn is_transient(&self) -> bool {
        match self {
            ArticleError::Fetch(e) => e.is_transient(),
            ArticleError::Extract(_) => false,
        }
    }
}
