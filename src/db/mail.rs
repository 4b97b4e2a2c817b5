//! Outbound mail queue.
//!
//! Services never talk SMTP. Generated passwords are queued here and an
//! external mailer delivers and stamps them.

use super::{DbError, now};
use sqlx::SqlitePool;

/// A queued message.
#[derive(Debug, Clone)]
pub struct QueuedMail {
    pub id: i64,
    pub email: String,
    /// `welcome` or `reset`.
    pub kind: String,
    pub account: String,
    pub body: String,
}

pub struct MailRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MailRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Undelivered mail, oldest first.
    pub async fn pending(&self) -> Result<Vec<QueuedMail>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, String, String, String)>(
            "SELECT id, email, kind, account, body FROM mail_queue WHERE sent_at IS NULL ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, email, kind, account, body)| QueuedMail {
                id,
                email,
                kind,
                account,
                body,
            })
            .collect())
    }

    pub async fn mark_sent(&self, id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE mail_queue SET sent_at = ? WHERE id = ?")
            .bind(now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
