use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// In-process liveness indicator: last successful cycle timestamp per source.
///
/// Updated by the scheduler after every cycle that completes for a source
/// (an `Unchanged` detection counts as success). Cheap to clone; all clones
/// share the same map. The durable counterpart is the hash store's
/// `observed_at`, which only moves when a page actually changes.
#[derive(Clone, Default)]
pub struct HealthTracker {
    inner: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self, source_name: &str) {
        self.inner
            .lock()
            .await
            .insert(source_name.to_string(), Utc::now());
    }

    pub async fn last_success(&self, source_name: &str) -> Option<DateTime<Utc>> {
        self.inner.lock().await.get(source_name).copied()
    }

    pub async fn snapshot(&self) -> HashMap<String, DateTime<Utc>> {
        self.inner.lock().await.clone()
    }
}
