pub mod detect;
pub mod error;
pub mod health;
pub mod models;
pub mod monitor;
pub mod orchestrate;
pub mod testutil;
pub mod traits;

pub use detect::{ChangeDetector, Detection};
pub use error::{ArticleError, DetectError, ExtractError, FetchError, SinkError, StoreError};
pub use health::HealthTracker;
pub use models::{
    ArticleFailure, FetchMode, ScrapeResult, ScrapedArticle, Snapshot, Source, compute_hash,
};
pub use monitor::{
    CycleEvent, CycleReporter, MonitorConfig, MonitorService, TracingCycleReporter,
};
pub use orchestrate::ScrapeOrchestrator;
pub use traits::{ArticleSink, Fetcher, HashStore, NullSink, SourceAdapter};
