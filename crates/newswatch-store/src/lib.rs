//! SQLite-backed snapshot store for newswatch.
//!
//! The monitor records one content hash per source; this crate persists
//! those snapshots durably so change detection survives restarts.

pub mod config;
pub mod repository;

pub use config::StoreConfig;
pub use repository::SnapshotRepository;
