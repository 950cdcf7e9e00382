use std::time::Duration;

use chrono::{DateTime, Utc};
use newswatch_core::error::StoreError;
use newswatch_core::models::Snapshot;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::StoreConfig;

/// Snapshot persistence in SQLite.
///
/// WAL journaling makes writes append-durable: a crash mid-write can lose
/// the in-progress transaction but never a committed one, which is exactly
/// the guarantee the monitor needs from its hash store.
#[derive(Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        tracing::debug!(path = %config.path.display(), "Opened snapshot store");
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Stored hash for a source, if one was ever recorded.
    pub async fn get_hash(&self, source_name: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT content_hash FROM snapshots WHERE source_name = ?1")
                .bind(source_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.map(|r| r.0))
    }

    /// Record a hash, overwriting any previous snapshot for the source.
    pub async fn upsert(&self, source_name: &str, hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (source_name, content_hash, observed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(source_name) DO UPDATE SET
                content_hash = excluded.content_hash,
                observed_at = excluded.observed_at
            "#,
        )
        .bind(source_name)
        .bind(hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    /// Full snapshot row for a source.
    pub async fn snapshot(&self, source_name: &str) -> Result<Option<Snapshot>, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT source_name, content_hash, observed_at FROM snapshots WHERE source_name = ?1",
        )
        .bind(source_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.map(Into::into))
    }

    /// All snapshots, ordered by source name (for `newswatch status`).
    pub async fn list(&self) -> Result<Vec<Snapshot>, StoreError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT source_name, content_hash, observed_at FROM snapshots ORDER BY source_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Administrative reset: forget one source's snapshot. Returns whether
    /// a row existed.
    pub async fn reset(&self, source_name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM snapshots WHERE source_name = ?1")
            .bind(source_name)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Administrative reset: forget every snapshot. Returns the row count.
    pub async fn reset_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM snapshots")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Check store connectivity.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    source_name: String,
    content_hash: String,
    observed_at: DateTime<Utc>,
}

impl From<SnapshotRow> for Snapshot {
    fn from(row: SnapshotRow) -> Self {
        Snapshot {
            source_name: row.source_name,
            content_hash: row.content_hash,
            observed_at: row.observed_at,
        }
    }
}

// -- Trait implementation --

impl newswatch_core::traits::HashStore for SnapshotRepository {
    async fn get(&self, source_name: &str) -> Result<Option<String>, StoreError> {
        SnapshotRepository::get_hash(self, source_name).await
    }

    async fn set(&self, source_name: &str, hash: &str) -> Result<(), StoreError> {
        SnapshotRepository::upsert(self, source_name, hash).await
    }
}
