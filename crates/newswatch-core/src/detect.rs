use crate::error::DetectError;
use crate::models::{Source, compute_hash};
use crate::traits::{Fetcher, HashStore};

/// Outcome of a change-detection pass.
#[derive(Debug)]
pub enum Detection {
    /// Landing page hashes to the stored value; nothing to scrape.
    Unchanged,
    /// Page is new or different. Carries the freshly fetched landing HTML so
    /// the orchestrator does not fetch it a second time.
    Changed {
        hash: String,
        landing_html: String,
    },
}

/// Decides whether a source's landing page has changed since the last check.
///
/// Fetches the page in the source's configured mode, hashes the raw bytes,
/// and compares against the stored hash. The detector never writes the
/// store: recording the new hash is an explicit side effect at the
/// orchestration boundary, which keeps detection a pure read+compare and
/// makes a dry-run mode trivial.
pub struct ChangeDetector<F, H>
where
    F: Fetcher,
    H: HashStore,
{
    fetcher: F,
    store: H,
}

impl<F, H> ChangeDetector<F, H>
where
    F: Fetcher,
    H: HashStore,
{
    pub fn new(fetcher: F, store: H) -> Self {
        Self { fetcher, store }
    }

    pub async fn detect(&self, source: &Source) -> Result<Detection, DetectError> {
        let landing_html = self
            .fetcher
            .fetch(&source.landing_url, source.landing_mode)
            .await?;
        let hash = compute_hash(landing_html.as_bytes());

        let stored = self.store.get(&source.name).await?;
        match stored {
            Some(prev) if prev == hash => {
                tracing::debug!(source = %source.name, hash = %&hash[..8], "Landing page unchanged");
                Ok(Detection::Unchanged)
            }
            stored => {
                tracing::info!(
                    source = %source.name,
                    hash = %&hash[..8],
                    first_seen = stored.is_none(),
                    "Landing page changed"
                );
                Ok(Detection::Changed { hash, landing_html })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use crate::models::FetchMode;
    use crate::testutil::*;

    #[tokio::test]
    async fn first_observation_is_changed() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        let detector = ChangeDetector::new(fetcher, store);

        let detection = detector.detect(&test_source()).await.unwrap();
        match detection {
            Detection::Changed { hash, landing_html } => {
                assert_eq!(hash, compute_hash(b"<html>v1</html>"));
                assert_eq!(landing_html, "<html>v1</html>");
            }
            Detection::Unchanged => panic!("expected Changed for first observation"),
        }
    }

    #[tokio::test]
    async fn same_hash_is_unchanged() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        store
            .set("exampleA", &compute_hash(b"<html>v1</html>"))
            .await
            .unwrap();

        let detector = ChangeDetector::new(fetcher, store);
        let detection = detector.detect(&test_source()).await.unwrap();
        assert!(matches!(detection, Detection::Unchanged));
    }

    #[tokio::test]
    async fn different_hash_is_changed_with_new_hash() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v2</html>");
        let store = MemoryHashStore::new();
        store
            .set("exampleA", &compute_hash(b"<html>v1</html>"))
            .await
            .unwrap();

        let detector = ChangeDetector::new(fetcher, store);
        match detector.detect(&test_source()).await.unwrap() {
            Detection::Changed { hash, .. } => {
                assert_eq!(hash, compute_hash(b"<html>v2</html>"));
            }
            Detection::Unchanged => panic!("expected Changed for differing hash"),
        }
    }

    #[tokio::test]
    async fn detect_is_idempotent_after_recording() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        let detector = ChangeDetector::new(fetcher, store.clone());
        let source = test_source();

        let first = detector.detect(&source).await.unwrap();
        let Detection::Changed { hash, .. } = first else {
            panic!("expected Changed");
        };
        // The caller records the hash; with no intervening page change the
        // second pass must be Unchanged.
        store.set(&source.name, &hash).await.unwrap();
        assert!(matches!(
            detector.detect(&source).await.unwrap(),
            Detection::Unchanged
        ));
    }

    #[tokio::test]
    async fn detector_never_writes_the_store() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        let detector = ChangeDetector::new(fetcher, store.clone());

        detector.detect(&test_source()).await.unwrap();
        assert_eq!(store.set_calls(), 0);
        assert!(store.dump().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates_and_preserves_prior_snapshot() {
        let fetcher = MockFetcher::new().with_error(
            "https://example.com/tech",
            FetchError::Timeout(30),
        );
        let store = MemoryHashStore::new();
        store.set("exampleA", "h0").await.unwrap();

        let detector = ChangeDetector::new(fetcher, store.clone());
        let err = detector.detect(&test_source()).await.unwrap_err();
        assert!(matches!(err, DetectError::Fetch(FetchError::Timeout(30))));
        // Stale-but-valid fallback: prior hash untouched.
        assert_eq!(store.get("exampleA").await.unwrap().as_deref(), Some("h0"));
    }

    #[tokio::test]
    async fn store_read_failure_propagates() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        store.fail_next_get(StoreError::Unreachable("connection refused".into()));

        let detector = ChangeDetector::new(fetcher, store);
        let err = detector.detect(&test_source()).await.unwrap_err();
        assert!(matches!(err, DetectError::Store(StoreError::Unreachable(_))));
    }

    #[tokio::test]
    async fn landing_fetch_uses_configured_mode() {
        let fetcher = MockFetcher::new().with_page("https://example.com/tech", "<html>v1</html>");
        let store = MemoryHashStore::new();
        let detector = ChangeDetector::new(fetcher.clone(), store);

        detector.detect(&test_source()).await.unwrap();
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, FetchMode::Rendered);
    }
}
