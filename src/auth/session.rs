//! Server-side admin sessions.
//!
//! The cookie carries a random token; the table keeps only its SHA-256
//! digest next to the admin it was issued to. Resolving a token joins
//! `admin_users`, so a session whose account is gone resolves to nothing.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::AdminUser,
    error::{AppError, Result},
};

#[derive(FromRow)]
struct SessionAdminRow {
    admin_id: String,
    email: String,
    admin_created_at: NaiveDateTime,
}

impl TryFrom<SessionAdminRow> for AdminUser {
    type Error = AppError;

    fn try_from(row: SessionAdminRow) -> Result<Self> {
        Ok(AdminUser {
            id: Uuid::parse_str(&row.admin_id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            created_at: DateTime::from_naive_utc_and_offset(row.admin_created_at, Utc),
        })
    }
}

pub struct AdminSessions {
    pool: SqlitePool,
    ttl: Duration,
}

impl AdminSessions {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a session for `admin` and returns the cookie token.
    pub async fn open(&self, admin: &AdminUser) -> Result<String> {
        let token = new_token();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, admin_id, token_hash, expires_at, created_at, last_used_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(admin.id.to_string())
        .bind(digest(&token))
        .bind((now + self.ttl).naive_utc())
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Opened session for admin {}", admin.email);
        Ok(token)
    }

    /// The admin behind a live token. Marks the session as used.
    pub async fn resolve(&self, token: &str) -> Result<Option<AdminUser>> {
        let token_hash = digest(token);
        let now = Utc::now().naive_utc();

        let row = sqlx::query_as::<_, SessionAdminRow>(
            r#"
            SELECT a.id AS admin_id, a.email, a.created_at AS admin_created_at
            FROM sessions s
            JOIN admin_users a ON a.id = s.admin_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#
        )
        .bind(&token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("UPDATE sessions SET last_used_at = ? WHERE token_hash = ?")
            .bind(now)
            .bind(&token_hash)
            .execute(&self.pool)
            .await?;

        AdminUser::try_from(row).map(Some)
    }

    pub async fn close(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(digest(token))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn new_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_sha256_digest_is_stored() {
        let h = digest("abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_ne!(h, digest("abd"));
    }

    #[test]
    fn tokens_are_random_hex() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
