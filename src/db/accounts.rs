//! Account repository for the authentication service.
//!
//! Handles account creation, password verification, flags and the
//! e-mail history used to confirm address changes.

use super::{DbError, now};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sqlx::SqlitePool;

/// Length of generated passwords.
const GENERATED_PASSWORD_LEN: usize = 12;

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub flags: u16,
    pub registered_at: i64,
    pub last_host: Option<String>,
    pub last_auth: Option<i64>,
    pub last_pwchange: Option<i64>,
}

type AccountRow = (
    i64,
    String,
    String,
    i64,
    i64,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        let (id, name, email, flags, registered_at, last_host, last_auth, last_pwchange) = row;
        Self {
            id,
            name,
            email,
            flags: flags as u16,
            registered_at,
            last_host,
            last_auth,
            last_pwchange,
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, name, email, flags, registered_at, last_host, last_auth, last_pwchange";

/// Repository for account operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether an account with this name exists.
    pub async fn is_registered(&self, name: &str) -> Result<bool, DbError> {
        Ok(self.id(name).await?.is_some())
    }

    /// Find an account by name (case-insensitive).
    pub async fn find(&self, name: &str) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE name = ? COLLATE NOCASE",
            ACCOUNT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Numeric id of an account.
    pub async fn id(&self, name: &str) -> Result<Option<i64>, DbError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM accounts WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Registration timestamp of an account.
    pub async fn timestamp(&self, name: &str) -> Result<Option<i64>, DbError> {
        let ts = sqlx::query_scalar::<_, i64>(
            "SELECT registered_at FROM accounts WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(ts)
    }

    /// Flags of an account, or empty when the account is unknown.
    pub async fn flags(&self, name: &str) -> Result<u16, DbError> {
        let flags = sqlx::query_scalar::<_, i64>(
            "SELECT flags FROM accounts WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(flags.unwrap_or(0) as u16)
    }

    /// Verify a password, returning the account on success.
    ///
    /// Unknown accounts and wrong passwords both come back as
    /// [`DbError::InvalidPassword`] so callers cannot tell them apart.
    pub async fn verify(&self, name: &str, password: &str) -> Result<Account, DbError> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT password_hash FROM accounts WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        let Some((hash,)) = row else {
            dummy_password_verify(password);
            return Err(DbError::InvalidPassword);
        };
        verify_password(password, &hash)?;

        self.find(name)
            .await?
            .ok_or_else(|| DbError::AccountNotFound(name.to_string()))
    }

    /// Number of accounts registered with this address.
    pub async fn accounts_with_email(&self, email: &str) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Whether any account uses this address.
    pub async fn is_mail(&self, email: &str) -> Result<bool, DbError> {
        Ok(self.accounts_with_email(email).await? > 0)
    }

    /// Whether `email` is, or once was, the address of `name`.
    pub async fn has_email_on_file(&self, name: &str, email: &str) -> Result<bool, DbError> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM accounts a
            WHERE a.name = ? COLLATE NOCASE
              AND (a.email = ? COLLATE NOCASE
                   OR EXISTS (SELECT 1 FROM email_history h
                              WHERE h.account_id = a.id AND h.email = ? COLLATE NOCASE))
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(found > 0)
    }

    /// Create an account with a generated password.
    ///
    /// The password is queued for mail delivery and also returned.
    pub async fn add_user(&self, name: &str, email: &str) -> Result<(Account, String), DbError> {
        let password = generate_password();
        let password_hash = hash_password(&password)?;
        let now = now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, email, password_hash, flags, registered_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::AccountExists(name.to_string());
            }
            DbError::from(e)
        })?;
        let id = result.last_insert_rowid();

        sqlx::query("INSERT INTO email_history (account_id, email, added_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(email)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO mail_queue (email, kind, account, body, created_at) VALUES (?, 'welcome', ?, ?, ?)",
        )
        .bind(email)
        .bind(name)
        .bind(&password)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let account = Account {
            id,
            name: name.to_string(),
            email: email.to_string(),
            flags: 0,
            registered_at: now,
            last_host: None,
            last_auth: None,
            last_pwchange: None,
        };
        Ok((account, password))
    }

    /// Change the current address, remembering it in the history.
    pub async fn set_email(&self, name: &str, email: &str) -> Result<(), DbError> {
        let id = self
            .id(name)
            .await?
            .ok_or_else(|| DbError::AccountNotFound(name.to_string()))?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE accounts SET email = ? WHERE id = ?")
            .bind(email)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT OR IGNORE INTO email_history (account_id, email, added_at) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind(now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the password and stamp the change time.
    pub async fn set_password(&self, name: &str, password: &str) -> Result<(), DbError> {
        let password_hash = hash_password(password)?;
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = ?, last_pwchange = ? WHERE name = ? COLLATE NOCASE",
        )
        .bind(&password_hash)
        .bind(now())
        .bind(name)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::AccountNotFound(name.to_string()));
        }
        Ok(())
    }

    pub async fn set_flags(&self, name: &str, flags: u16) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE accounts SET flags = ? WHERE name = ? COLLATE NOCASE")
            .bind(i64::from(flags))
            .bind(name)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::AccountNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Record a successful login from `host`.
    pub async fn record_auth(&self, name: &str, host: &str) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE accounts SET last_host = ?, last_auth = ? WHERE name = ? COLLATE NOCASE",
        )
        .bind(host)
        .bind(now())
        .bind(name)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Reset the password of every account using `email` and queue the new
    /// passwords for delivery. Returns how many accounts were reset.
    pub async fn submit_new_password(&self, email: &str) -> Result<usize, DbError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM accounts WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_all(self.pool)
        .await?;

        for name in &names {
            let password = generate_password();
            let password_hash = hash_password(&password)?;
            let now = now();
            let mut tx = self.pool.begin().await?;
            sqlx::query(
                "UPDATE accounts SET password_hash = ?, last_pwchange = ? WHERE name = ?",
            )
            .bind(&password_hash)
            .bind(now)
            .bind(name)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "INSERT INTO mail_queue (email, kind, account, body, created_at) VALUES (?, 'reset', ?, ?, ?)",
            )
            .bind(email)
            .bind(name)
            .bind(&password)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        }
        Ok(names.len())
    }
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> Result<String, DbError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| DbError::InvalidPassword)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), DbError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| DbError::InvalidPassword)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| DbError::InvalidPassword)
}

/// Burn roughly one verification's worth of CPU for unknown accounts so
/// response time does not reveal whether a name is registered.
fn dummy_password_verify(password: &str) {
    const DUMMY_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$c2xpcmMtc2VydmljZXM$KM8wAkkiVsXmu6GX8R0tNEJvDqN3g+Tz6qQ1cxPG3Hc";
    let _ = verify_password(password, DUMMY_HASH);
}
