//! Channels registered for abuse scanning.

use super::{DbError, now};
use sqlx::SqlitePool;

/// Repository for scanned-channel operations.
pub struct ChannelRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChannelRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All registered channel names.
    pub async fn all(&self) -> Result<Vec<String>, DbError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM scanned_channels ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(names)
    }

    /// Register a channel. Returns `false` if it was already registered.
    pub async fn add(&self, name: &str, added_by: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO scanned_channels (name, added_by, added_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(added_by)
        .bind(now())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unregister a channel. Returns `false` if it was not registered.
    pub async fn remove(&self, name: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM scanned_channels WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn contains(&self, name: &str) -> Result<bool, DbError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM scanned_channels WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(found > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn add_remove_channels() {
        let db = Database::new(":memory:").await.unwrap();
        let channels = db.channels();
        assert!(channels.add("#test", "alice").await.unwrap());
        assert!(!channels.add("#TEST", "alice").await.unwrap());
        assert!(channels.add("#other", "alice").await.unwrap());
        assert_eq!(channels.all().await.unwrap(), vec!["#other", "#test"]);

        assert!(channels.remove("#Test").await.unwrap());
        assert!(!channels.remove("#test").await.unwrap());
        assert!(!channels.contains("#test").await.unwrap());
    }
}
