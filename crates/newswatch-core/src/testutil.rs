//! Test utilities: mock implementations of the core trait seams.
//!
//! Handwritten mocks for dependency injection in unit tests. Shared state
//! sits behind `Arc<Mutex<_>>` so clones observe each other, allowing
//! assertions on recorded calls.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use crate::error::{ExtractError, FetchError, SinkError, StoreError};
use crate::models::{FetchMode, ScrapedArticle, Source};
use crate::monitor::{CycleEvent, CycleReporter};
use crate::traits::{ArticleSink, Fetcher, HashStore, SourceAdapter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FetcherState {
    pages: HashMap<String, String>,
    errors: HashMap<String, Vec<FetchError>>,
    calls: Vec<(String, FetchMode)>,
}

/// Mock fetcher with per-URL canned pages and injectable errors.
///
/// Unknown URLs answer HTTP 404. An injected error for a URL is consumed
/// before the canned page, so a URL can fail once and then succeed.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<FetcherState>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.state
            .lock()
            .unwrap()
            .errors
            .entry(url.to_string())
            .or_default()
            .push(error);
        self
    }

    /// Make every fetch sleep first, to hold a source's cycle open.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace a canned page (simulates the landing page changing).
    pub fn set_page(&self, url: &str, html: &str) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
    }

    /// Every `(url, mode)` pair fetched so far, in order.
    pub fn calls(&self) -> Vec<(String, FetchMode)> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<String, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push((url.to_string(), mode));

        if let Some(queue) = state.errors.get_mut(url) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        match state.pages.get(url) {
            Some(html) => Ok(html.clone()),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryHashStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, String>,
    set_calls: usize,
    next_get_error: Option<StoreError>,
    next_set_error: Option<StoreError>,
}

/// In-memory hash store with single-shot failure injection.
#[derive(Clone, Default)]
pub struct MemoryHashStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_get(&self, error: StoreError) {
        self.state.lock().unwrap().next_get_error = Some(error);
    }

    pub fn fail_next_set(&self, error: StoreError) {
        self.state.lock().unwrap().next_set_error = Some(error);
    }

    /// Number of `set` attempts, including failed ones.
    pub fn set_calls(&self) -> usize {
        self.state.lock().unwrap().set_calls
    }

    pub fn dump(&self) -> HashMap<String, String> {
        self.state.lock().unwrap().entries.clone()
    }
}

impl HashStore for MemoryHashStore {
    async fn get(&self, source_name: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.next_get_error.take() {
            return Err(e);
        }
        Ok(state.entries.get(source_name).cloned())
    }

    async fn set(&self, source_name: &str, hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.set_calls += 1;
        if let Some(e) = state.next_set_error.take() {
            return Err(e);
        }
        state
            .entries
            .insert(source_name.to_string(), hash.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedAdapter
// ---------------------------------------------------------------------------

/// Adapter with a fixed link set and extraction results keyed by the exact
/// article HTML the mock fetcher returns.
#[derive(Default)]
pub struct ScriptedAdapter {
    links: BTreeSet<String>,
    articles: HashMap<String, (String, String)>,
    failures: HashMap<String, ExtractError>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.extend(links.into_iter().map(Into::into));
        self
    }

    pub fn with_article(mut self, html: &str, (heading, content): (&str, &str)) -> Self {
        self.articles
            .insert(html.to_string(), (heading.to_string(), content.to_string()));
        self
    }

    pub fn with_failure(mut self, html: &str, error: ExtractError) -> Self {
        self.failures.insert(html.to_string(), error);
        self
    }
}

impl SourceAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn discover_links(&self, _landing_html: &str) -> BTreeSet<String> {
        self.links.clone()
    }

    fn extract_article(&self, article_html: &str) -> Result<(String, String), ExtractError> {
        if let Some(error) = self.failures.get(article_html) {
            return Err(*error);
        }
        self.articles
            .get(article_html)
            .cloned()
            .ok_or(ExtractError::MissingHeading)
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SinkState {
    batches: Vec<Vec<ScrapedArticle>>,
    next_error: Option<String>,
}

/// Sink that records every ingested batch.
#[derive(Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<SinkState>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().next_error = Some(message.to_string());
    }

    pub fn batches(&self) -> Vec<Vec<ScrapedArticle>> {
        self.state.lock().unwrap().batches.clone()
    }
}

impl ArticleSink for MockSink {
    async fn ingest(&self, batch: Vec<ScrapedArticle>) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.next_error.take() {
            return Err(SinkError::Ingest(message));
        }
        state.batches.push(batch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records event labels for assertions.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e == &label)
            .count()
    }
}

impl CycleReporter for RecordingReporter {
    fn report(&self, event: CycleEvent<'_>) {
        let label = match event {
            CycleEvent::CycleStarted { .. } => "CycleStarted",
            CycleEvent::SourceSkipped { .. } => "SourceSkipped",
            CycleEvent::SourceUnchanged { .. } => "SourceUnchanged",
            CycleEvent::SourceChanged { .. } => "SourceChanged",
            CycleEvent::SourceScraped { .. } => "SourceScraped",
            CycleEvent::SourceFailed { .. } => "SourceFailed",
            CycleEvent::CycleFinished { .. } => "CycleFinished",
            CycleEvent::ShuttingDown { .. } => "ShuttingDown",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A source named `exampleA` over `https://example.com` with no scripted
/// links or articles.
pub fn test_source() -> Source {
    test_source_with(ScriptedAdapter::new())
}

pub fn test_source_with(adapter: ScriptedAdapter) -> Source {
    let base = Url::parse("https://example.com").expect("static test URL");
    Source::new(
        "exampleA",
        "https://example.com/tech",
        base,
        Arc::new(adapter),
    )
}
