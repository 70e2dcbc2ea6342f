//! Ledger database pool with split reader/writer connections in WAL mode.
//!
//! Every ledger write is a single-row insert or a singleton update, so one
//! writer connection is enough. Budget and stats queries go through a small
//! read-only pool and never wait on the writer.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

const MAX_READERS: u32 = 4;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: read-only pool for budget, stats and history queries.
/// - `writer`: single connection for ledger inserts and budget updates.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the ledger and run pending migrations.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Migrate before the read-only pool opens so it sees the schema.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(MAX_READERS)
            .connect_with(read_opts)
            .await?;

        tracing::debug!(database_url, "Opened usage ledger");
        Ok(Self { reader, writer })
    }

    /// Flush and close both pools.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "switchboard.db";

/// SQLite URL for the ledger in `data_dir`, created on first open.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        // Verify tables exist by querying sqlite_master
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert!(table_names.contains(&"usage_logs"), "usage_logs table missing");
        assert!(table_names.contains(&"failure_logs"), "failure_logs table missing");
        assert!(table_names.contains(&"budget_config"), "budget_config table missing");
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test_wal.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        let result: (String,) =
            sqlx::query_as("PRAGMA journal_mode")
                .fetch_one(&pool.writer)
                .await
                .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_budget_row_seeded_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());

        // Opening twice reruns the migrator; the singleton must stay single.
        drop(DatabasePool::new(&url).await.unwrap());
        let pool = DatabasePool::new(&url).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM budget_config")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/tmp/switchboard-test"));
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("switchboard.db?mode=rwc"));
    }
}
