//! SQLite connection pools behind the procedure store.
//!
//! Reads and writes use separate pools over one WAL-mode database file.
//! Readers run concurrently; a single writer connection serializes inserts,
//! updates and deletes. The schema in `migrations/` is applied on the writer
//! before any reader connects, so readers never see a half-migrated file.

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure to bring the database up.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid database url: {0}")]
    Url(#[source] sqlx::Error),

    #[error("cannot open database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Reader and writer pools over the Etlas database.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) and migrate the database at `database_url`.
    pub async fn new(database_url: &str) -> Result<Self, PoolError> {
        let options = connect_options(database_url)?;

        let writer = open(options.clone(), 1).await?;
        let migrator = sqlx::migrate!("../../migrations");
        migrator.run(&writer).await?;

        let reader = open(options.read_only(true), READER_CONNECTIONS).await?;

        debug!(
            migrations = migrator.iter().count(),
            readers = READER_CONNECTIONS,
            "database pool ready"
        );
        Ok(Self { reader, writer })
    }

    /// Close both pools, letting in-flight queries finish.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, PoolError> {
    let options = SqliteConnectOptions::from_str(database_url).map_err(PoolError::Url)?;
    Ok(options
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true))
}

async fn open(options: SqliteConnectOptions, connections: u32) -> Result<SqlitePool, PoolError> {
    SqlitePoolOptions::new()
        .max_connections(connections)
        .connect_with(options)
        .await
        .map_err(PoolError::Connect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn database_url_in(dir: &Path) -> String {
        format!("sqlite://{}?mode=rwc", dir.join("test.db").display())
    }

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url_in(dir.path());

        let pool = DatabasePool::new(&url).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(
            table_names,
            vec!["attachments", "chats", "messages", "schemes", "users"]
        );
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url_in(dir.path())).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_foreign_keys_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url_in(dir.path())).await.unwrap();

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(result.0, 1, "foreign keys should be enabled");

        let orphan = sqlx::query("INSERT INTO chats (user_id) VALUES ('no-such-user')")
            .execute(&pool.writer)
            .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn test_store_assigns_uuid_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url_in(dir.path())).await.unwrap();

        let (id, created_at): (String, String) = sqlx::query_as(
            "INSERT INTO users (name, email) VALUES ('Ana', 'ana@example.com') RETURNING id, created_at",
        )
        .fetch_one(&pool.writer)
        .await
        .unwrap();

        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert!(chrono::DateTime::parse_from_rfc3339(&created_at).is_ok());
    }

    #[tokio::test]
    async fn test_reader_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url_in(dir.path())).await.unwrap();

        let write = sqlx::query("INSERT INTO users (name, email) VALUES ('Ana', 'ana@example.com')")
            .execute(&pool.reader)
            .await;

        assert!(write.is_err());
    }

    #[tokio::test]
    async fn test_bad_url_is_rejected() {
        let result = DatabasePool::new("sqlite://etlas.db?mode=sideways").await;
        assert!(matches!(result, Err(PoolError::Url(_))));
    }

    #[tokio::test]
    async fn test_close_shuts_both_pools() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url_in(dir.path())).await.unwrap();

        pool.close().await;

        assert!(pool.reader.is_closed());
        assert!(pool.writer.is_closed());
    }

    #[tokio::test]
    async fn test_reopen_keeps_schema_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url_in(dir.path());
        let first = DatabasePool::new(&url).await.unwrap();
        sqlx::query("INSERT INTO users (name, email) VALUES ('Ana', 'ana@example.com')")
            .execute(&first.writer)
            .await
            .unwrap();
        first.close().await;

        let second = DatabasePool::new(&url).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&second.reader)
            .await
            .unwrap();

        assert_eq!(count, 1);
    }
}
