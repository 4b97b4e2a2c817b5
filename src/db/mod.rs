//! Database module for persistent storage.
//!
//! Provides async SQLite database access using SQLx for:
//! - Accounts, their flags and e-mail history
//! - Channels registered for abuse scanning
//! - Abuse incidents and the banned-word list
//! - The outbound mail queue

mod accounts;
mod badwords;
mod channels;
mod incidents;
mod mail;

pub use accounts::{Account, AccountRepository};
pub use badwords::BadwordRepository;
pub use channels::ChannelRepository;
pub use incidents::IncidentRepository;
pub use mail::{MailRepository, QueuedMail};

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("account already exists: {0}")]
    AccountExists(String),
    #[error("invalid password")]
    InvalidPassword,
}

/// Degrade a failed store call to a default value, logging the failure.
///
/// Store hiccups must never take the link down; a command answers with
/// whatever the default means (not registered, no flags, empty list).
pub trait OrLogDefault<T> {
    fn or_log_default(self, op: &'static str) -> T;
}

impl<T: Default> OrLogDefault<T> for Result<T, DbError> {
    fn or_log_default(self, op: &'static str) -> T {
        self.unwrap_or_else(|e| {
            warn!(op, error = %e, "Store access failed");
            T::default()
        })
    }
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new database connection, running migrations if needed.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let pool = if path == ":memory:" {
            // Uniquely named shared-cache memory database per call so
            // parallel tests never see each other's rows.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:slirc-services-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        Self::run_migrations(&pool).await?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Get reference to the underlying connection pool.
    #[allow(dead_code)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get account repository.
    pub fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.pool)
    }

    /// Get scanned-channel repository.
    pub fn channels(&self) -> ChannelRepository<'_> {
        ChannelRepository::new(&self.pool)
    }

    /// Get incident log.
    pub fn incidents(&self) -> IncidentRepository<'_> {
        IncidentRepository::new(&self.pool)
    }

    /// Get banned-word repository.
    pub fn badwords(&self) -> BadwordRepository<'_> {
        BadwordRepository::new(&self.pool)
    }

    /// Get outbound mail queue.
    pub fn mail(&self) -> MailRepository<'_> {
        MailRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

/// Current time as Unix seconds.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_databases_are_isolated() {
        let a = Database::new(":memory:").await.unwrap();
        let b = Database::new(":memory:").await.unwrap();
        a.incidents().add("flooding").await.unwrap();
        assert_eq!(a.incidents().count().await.unwrap(), 1);
        assert_eq!(b.incidents().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/services.db");
        let path = path.to_str().unwrap();
        {
            let db = Database::new(path).await.unwrap();
            db.channels().add("#test", "oper").await.unwrap();
        }
        let db = Database::new(path).await.unwrap();
        assert!(db.channels().contains("#TEST").await.unwrap());
    }

    #[test]
    fn or_log_default_swallows_errors() {
        let res: Result<Vec<String>, DbError> = Err(DbError::InvalidPassword);
        assert!(res.or_log_default("test").is_empty());
        let res: Result<bool, DbError> = Ok(true);
        assert!(res.or_log_default("test"));
    }
}
