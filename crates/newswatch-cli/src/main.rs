mod config;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use newswatch_client::SiteFetcher;
use newswatch_core::detect::{ChangeDetector, Detection};
use newswatch_core::monitor::{MonitorConfig, MonitorService, TracingCycleReporter};
use newswatch_store::{SnapshotRepository, StoreConfig};

use crate::config::FileConfig;
use crate::sink::JsonLinesSink;

#[derive(Parser)]
#[command(name = "newswatch", version, about = "News source monitor and scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor configured sources and scrape the ones that changed
    Run {
        /// Path to the JSON source configuration
        #[arg(short, long, default_value = "sources.json")]
        config: PathBuf,

        /// Override the cycle interval from the config file
        #[arg(long, env = "NEWSWATCH_INTERVAL_SECS")]
        interval_secs: Option<u64>,

        /// Snapshot database path
        #[arg(long, env = "NEWSWATCH_STORE_PATH")]
        store: Option<PathBuf>,

        /// Run a single cycle and exit instead of looping
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Append scraped articles to this JSON-lines file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Probe one source for changes without recording anything
    Check {
        /// Path to the JSON source configuration
        #[arg(short, long, default_value = "sources.json")]
        config: PathBuf,

        /// Snapshot database path
        #[arg(long, env = "NEWSWATCH_STORE_PATH")]
        store: Option<PathBuf>,

        /// Name of the source to probe
        #[arg(short, long)]
        source: String,
    },

    /// Show recorded snapshots per source
    Status {
        /// Snapshot database path
        #[arg(long, env = "NEWSWATCH_STORE_PATH")]
        store: Option<PathBuf>,
    },

    /// Forget recorded snapshots so the next cycle re-scrapes
    Reset {
        /// Snapshot database path
        #[arg(long, env = "NEWSWATCH_STORE_PATH")]
        store: Option<PathBuf>,

        /// Source to forget
        #[arg(short, long)]
        source: Option<String>,

        /// Forget every source
        #[arg(long, default_value_t = false)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newswatch=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            interval_secs,
            store,
            once,
            output,
        } => cmd_run(&config, interval_secs, store, once, output).await?,
        Commands::Check {
            config,
            store,
            source,
        } => cmd_check(&config, store, &source).await?,
        Commands::Status { store } => cmd_status(store).await?,
        Commands::Reset { store, source, all } => cmd_reset(store, source, all).await?,
    }

    Ok(())
}

async fn connect_store(path: Option<PathBuf>) -> Result<SnapshotRepository> {
    let config = match path {
        Some(path) => StoreConfig::at(path),
        None => StoreConfig::from_env(),
    };
    let repo = SnapshotRepository::connect(&config)
        .await
        .context("Failed to open snapshot store")?;
    repo.migrate().await.context("Failed to run migrations")?;
    Ok(repo)
}

async fn cmd_run(
    config_path: &PathBuf,
    interval_secs: Option<u64>,
    store: Option<PathBuf>,
    once: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let file = FileConfig::load(config_path)?;
    let sources = file.build_sources()?;
    let interval = Duration::from_secs(interval_secs.unwrap_or(file.interval_secs));

    let fetcher = SiteFetcher::new(
        file.browser_pool_size,
        Duration::from_secs(file.fetch_timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!(e))?;
    let repo = connect_store(store).await?;
    let sink = match output {
        Some(path) => JsonLinesSink::file(path),
        None => JsonLinesSink::stdout(),
    };

    let monitor_config = MonitorConfig::default()
        .with_interval(interval)
        .with_max_concurrent_sources(file.max_concurrent_sources);

    tracing::info!(
        sources = sources.len(),
        interval_secs = interval.as_secs(),
        "Starting monitor"
    );

    let service = MonitorService::new(fetcher, repo, sink, sources, monitor_config);
    let reporter = Arc::new(TracingCycleReporter);

    if once {
        service.run_once(reporter).await;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            signal_cancel.cancel();
        }
    });

    service.run(cancel, reporter).await;
    Ok(())
}

async fn cmd_check(config_path: &PathBuf, store: Option<PathBuf>, name: &str) -> Result<()> {
    let file = FileConfig::load(config_path)?;
    let sources = file.build_sources()?;
    let source = sources
        .iter()
        .find(|s| s.name == name)
        .with_context(|| format!("No source named '{name}' in config"))?;

    let fetcher = SiteFetcher::new(
        file.browser_pool_size,
        Duration::from_secs(file.fetch_timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!(e))?;
    let repo = connect_store(store).await?;

    // Detection alone never records anything, so a check is side-effect free.
    let detector = ChangeDetector::new(fetcher, repo);
    match detector.detect(source).await? {
        Detection::Unchanged => println!("{name}: unchanged"),
        Detection::Changed { hash, .. } => println!("{name}: changed ({hash})"),
    }
    Ok(())
}

async fn cmd_status(store: Option<PathBuf>) -> Result<()> {
    let repo = connect_store(store).await?;
    let snapshots = repo.list().await?;
    if snapshots.is_empty() {
        println!("No snapshots recorded yet.");
        return Ok(());
    }
    for snapshot in snapshots {
        println!(
            "{:<16} {} {}",
            snapshot.source_name,
            &snapshot.content_hash[..12.min(snapshot.content_hash.len())],
            snapshot.observed_at.to_rfc3339(),
        );
    }
    Ok(())
}

async fn cmd_reset(store: Option<PathBuf>, source: Option<String>, all: bool) -> Result<()> {
    let repo = connect_store(store).await?;
    match (source, all) {
        (Some(name), false) => {
            if repo.reset(&name).await? {
                println!("Forgot snapshot for '{name}'.");
            } else {
                println!("No snapshot recorded for '{name}'.");
            }
        }
        (None, true) => {
            let count = repo.reset_all().await?;
            println!("Forgot {count} snapshot(s).");
        }
        _ => bail!("Pass exactly one of --source <name> or --all"),
    }
    Ok(())
}
