//! Abuse incident log.

use super::{DbError, now};
use sqlx::SqlitePool;

/// Write-only log of abuse incidents.
pub struct IncidentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IncidentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of incidents recorded so far.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM incidents")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Record an incident and return its number.
    pub async fn add(&self, reason: &str) -> Result<i64, DbError> {
        let result = sqlx::query("INSERT INTO incidents (reason, created_at) VALUES (?, ?)")
            .bind(reason)
            .bind(now())
            .execute(self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }
}
