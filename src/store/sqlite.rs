//! SQLite-backed store: connection pool and schema migration.

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::error::ServiceError;

/// Idempotent schema, applied statement by statement on startup.
/// Timestamps are written from Rust as RFC 3339 text; ids as UUIDs.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS groups (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        invite_code TEXT NOT NULL UNIQUE,
        default_points INTEGER NOT NULL,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS group_members (
        group_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        points_balance INTEGER NOT NULL,
        joined_at TEXT NOT NULL,
        PRIMARY KEY (group_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS pools (
        id TEXT PRIMARY KEY,
        group_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL,
        created_by TEXT NOT NULL,
        winning_option_id TEXT,
        resolved_at TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_pools_group ON pools (group_id)",
    "CREATE TABLE IF NOT EXISTS pool_options (
        id TEXT PRIMARY KEY,
        pool_id TEXT NOT NULL,
        label TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_options_pool ON pool_options (pool_id)",
    "CREATE TABLE IF NOT EXISTS bets (
        id TEXT PRIMARY KEY,
        pool_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        option_id TEXT NOT NULL,
        points_wagered INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (pool_id, user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_bets_pool ON bets (pool_id)",
    "CREATE TABLE IF NOT EXISTS points_log (
        id TEXT PRIMARY KEY,
        group_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        amount INTEGER NOT NULL,
        entry_type TEXT NOT NULL,
        reference_id TEXT,
        note TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_points_log_group ON points_log (group_id)",
    "CREATE INDEX IF NOT EXISTS idx_points_log_user ON points_log (user_id)",
];

/// SQLite-backed store.
///
/// Cheap to clone; all clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (and creates, if missing) the database at `url`.
    ///
    /// WAL journaling and a 5-second busy timeout match the access
    /// pattern of many short write transactions from concurrent
    /// request handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if the URL is malformed or the
    /// database cannot be opened.
    pub async fn open(url: &str, max_connections: u32) -> Result<Self, ServiceError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Opens a private in-memory database on a single connection.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if the connection fails.
    pub async fn open_in_memory() -> Result<Self, ServiceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Applies the schema. Safe to run on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on any DDL failure.
    pub async fn migrate(&self) -> Result<(), ServiceError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Begins a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if no connection is available.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, ServiceError> {
        Ok(self.pool.begin().await?)
    }

    /// Acquires a connection for non-transactional reads.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] if no connection is available.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, ServiceError> {
        Ok(self.pool.acquire().await?)
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn begin_commit_round_trip() {
        let store = Store::open_in_memory().await.unwrap();
        store.migrate().await.unwrap();
        let tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
    }
}
