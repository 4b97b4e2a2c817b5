//! Persisted banned words.

use super::{DbError, now};
use sqlx::SqlitePool;

pub struct BadwordRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BadwordRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn all(&self) -> Result<Vec<String>, DbError> {
        let words = sqlx::query_scalar::<_, String>("SELECT word FROM badwords ORDER BY word")
            .fetch_all(self.pool)
            .await?;
        Ok(words)
    }

    /// Returns `false` if the word was already stored.
    pub async fn add(&self, word: &str, added_by: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO badwords (word, added_by, added_at) VALUES (?, ?, ?)",
        )
        .bind(word.to_lowercase())
        .bind(added_by)
        .bind(now())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if the word was not stored.
    pub async fn remove(&self, word: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM badwords WHERE word = ? COLLATE NOCASE")
            .bind(word)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
