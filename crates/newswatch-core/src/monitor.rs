use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::detect::{ChangeDetector, Detection};
use crate::health::HealthTracker;
use crate::models::Source;
use crate::orchestrate::ScrapeOrchestrator;
use crate::traits::{ArticleSink, Fetcher, HashStore};

/// Lifecycle events emitted by the monitor loop.
#[derive(Debug, Clone)]
pub enum CycleEvent<'a> {
    CycleStarted {
        seq: u64,
        sources: usize,
    },
    /// A previous cycle for this source is still in flight; this tick
    /// does not start another.
    SourceSkipped {
        source: &'a str,
    },
    SourceUnchanged {
        source: &'a str,
    },
    SourceChanged {
        source: &'a str,
        hash: &'a str,
    },
    SourceScraped {
        source: &'a str,
        articles: usize,
        failed: usize,
    },
    SourceFailed {
        source: &'a str,
        error: &'a str,
    },
    /// Every source of this tick has been dispatched or skipped. Source
    /// work may still be running; ticks are allowed to overlap as long as
    /// no single source overlaps itself.
    CycleFinished {
        seq: u64,
    },
    ShuttingDown {
        in_flight: usize,
    },
}

/// Receives monitor lifecycle events (decoupled logging).
pub trait CycleReporter: Send + Sync {
    fn report(&self, event: CycleEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCycleReporter;

impl CycleReporter for TracingCycleReporter {
    fn report(&self, event: CycleEvent<'_>) {
        match event {
            CycleEvent::CycleStarted { seq, sources } => {
                tracing::info!(%seq, %sources, "Cycle started");
            }
            CycleEvent::SourceSkipped { source } => {
                tracing::warn!(%source, "Previous cycle still running, skipping");
            }
            CycleEvent::SourceUnchanged { source } => {
                tracing::debug!(%source, "Unchanged");
            }
            CycleEvent::SourceChanged { source, hash } => {
                tracing::info!(%source, hash = %&hash[..8.min(hash.len())], "Changed, scraping");
            }
            CycleEvent::SourceScraped {
                source,
                articles,
                failed,
            } => {
                tracing::info!(%source, %articles, %failed, "Scrape batch complete");
            }
            CycleEvent::SourceFailed { source, error } => {
                tracing::warn!(%source, %error, "Source cycle failed");
            }
            CycleEvent::CycleFinished { seq } => {
                tracing::debug!(%seq, "Cycle dispatched");
            }
            CycleEvent::ShuttingDown { in_flight } => {
                tracing::info!(%in_flight, "Monitor shutting down");
            }
        }
    }
}

/// Configuration for the monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Wall-clock interval between cycles.
    pub interval: Duration,
    /// Upper bound on sources processed concurrently within a cycle.
    pub max_concurrent_sources: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            max_concurrent_sources: 4,
        }
    }
}

impl MonitorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_concurrent_sources(mut self, max: usize) -> Self {
        self.max_concurrent_sources = max.max(1);
        self
    }
}

/// Timer-driven monitor: one cycle per interval, fanning registered sources
/// out to a bounded set of tasks.
///
/// Per-source sequence within a cycle is strict: detect, record the new
/// hash, orchestrate, hand the batch to the sink. Failures never escape a
/// source's cycle; the loop itself only stops on cancellation.
pub struct MonitorService<F, H, S>
where
    F: Fetcher + 'static,
    H: HashStore + 'static,
    S: ArticleSink + 'static,
{
    fetcher: F,
    store: H,
    sink: S,
    sources: Arc<Vec<Source>>,
    config: MonitorConfig,
    health: HealthTracker,
    in_flight: Arc<Mutex<HashSet<String>>>,
    limiter: Arc<Semaphore>,
}

impl<F, H, S> MonitorService<F, H, S>
where
    F: Fetcher + 'static,
    H: HashStore + 'static,
    S: ArticleSink + 'static,
{
    pub fn new(fetcher: F, store: H, sink: S, sources: Vec<Source>, config: MonitorConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_sources));
        Self {
            fetcher,
            store,
            sink,
            sources: Arc::new(sources),
            config,
            health: HealthTracker::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            limiter,
        }
    }

    /// Shared liveness tracker, updated as cycles complete.
    pub fn health(&self) -> HealthTracker {
        self.health.clone()
    }

    /// Run until cancellation. The first cycle runs immediately; afterwards
    /// one cycle starts per interval tick. After the shutdown signal no new
    /// source-cycles start, but dispatched ones run to completion.
    pub async fn run<R>(&self, cancel: CancellationToken, reporter: Arc<R>)
    where
        R: CycleReporter + 'static,
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tasks = JoinSet::new();
        let mut seq: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    seq += 1;
                    self.dispatch_cycle(seq, &cancel, &reporter, &mut tasks).await;
                    // Reap finished source tasks between ticks.
                    while tasks.try_join_next().is_some() {}
                }
                () = cancel.cancelled() => break,
            }
        }

        reporter.report(CycleEvent::ShuttingDown {
            in_flight: tasks.len(),
        });
        while tasks.join_next().await.is_some() {}
    }

    /// Run exactly one cycle to completion (CLI `--once`, tests).
    pub async fn run_once<R>(&self, reporter: Arc<R>)
    where
        R: CycleReporter + 'static,
    {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        self.dispatch_cycle(1, &cancel, &reporter, &mut tasks).await;
        while tasks.join_next().await.is_some() {}
    }

    async fn dispatch_cycle<R>(
        &self,
        seq: u64,
        cancel: &CancellationToken,
        reporter: &Arc<R>,
        tasks: &mut JoinSet<()>,
    ) where
        R: CycleReporter + 'static,
    {
        reporter.report(CycleEvent::CycleStarted {
            seq,
            sources: self.sources.len(),
        });

        for source in self.sources.iter() {
            if cancel.is_cancelled() {
                break;
            }

            // Re-entrancy guard, per source not global: a cycle still in
            // flight from an earlier tick blocks this tick for that source.
            {
                let mut in_flight = self.in_flight.lock().await;
                if !in_flight.insert(source.name.clone()) {
                    reporter.report(CycleEvent::SourceSkipped {
                        source: &source.name,
                    });
                    continue;
                }
            }

            let permit = tokio::select! {
                permit = self.limiter.clone().acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            self.in_flight.lock().await.remove(&source.name);
                            break;
                        }
                    }
                }
                () = cancel.cancelled() => {
                    self.in_flight.lock().await.remove(&source.name);
                    break;
                }
            };

            let fetcher = self.fetcher.clone();
            let store = self.store.clone();
            let sink = self.sink.clone();
            let health = self.health.clone();
            let in_flight = Arc::clone(&self.in_flight);
            let reporter = Arc::clone(reporter);
            let source = source.clone();
            tasks.spawn(async move {
                let _permit = permit;
                run_source(&fetcher, &store, &sink, &health, &source, reporter.as_ref()).await;
                in_flight.lock().await.remove(&source.name);
            });
        }

        reporter.report(CycleEvent::CycleFinished { seq });
    }
}

/// One source's cycle: detect, record, orchestrate, hand off.
async fn run_source<F, H, S, R>(
    fetcher: &F,
    store: &H,
    sink: &S,
    health: &HealthTracker,
    source: &Source,
    reporter: &R,
) where
    F: Fetcher,
    H: HashStore,
    S: ArticleSink,
    R: CycleReporter + ?Sized,
{
    let detector = ChangeDetector::new(fetcher.clone(), store.clone());
    match detector.detect(source).await {
        Ok(Detection::Unchanged) => {
            reporter.report(CycleEvent::SourceUnchanged {
                source: &source.name,
            });
            health.record_success(&source.name).await;
        }
        Ok(Detection::Changed { hash, landing_html }) => {
            reporter.report(CycleEvent::SourceChanged {
                source: &source.name,
                hash: &hash,
            });

            // "Seen" is recorded before any extraction attempt: a broken
            // extractor must not cause re-scrape storms on an unchanged page.
            if let Err(e) = store.set(&source.name, &hash).await {
                let error = e.to_string();
                reporter.report(CycleEvent::SourceFailed {
                    source: &source.name,
                    error: &error,
                });
                return;
            }

            let orchestrator = ScrapeOrchestrator::new(fetcher.clone());
            let result = orchestrator.run(source, &landing_html).await;
            reporter.report(CycleEvent::SourceScraped {
                source: &source.name,
                articles: result.articles.len(),
                failed: result.errors.len(),
            });
            for failure in &result.errors {
                tracing::warn!(
                    source = %source.name,
                    url = %failure.url,
                    error = %failure.error,
                    transient = failure.error.is_transient(),
                    "Article skipped"
                );
            }

            if !result.articles.is_empty() {
                if let Err(e) = sink.ingest(result.articles).await {
                    let error = e.to_string();
                    reporter.report(CycleEvent::SourceFailed {
                        source: &source.name,
                        error: &error,
                    });
                    return;
                }
            }
            health.record_success(&source.name).await;
        }
        Err(e) => {
            let error = e.to_string();
            reporter.report(CycleEvent::SourceFailed {
                source: &source.name,
                error: &error,
            });
        }
    }
}
