use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::Duration;
use cookie::{Cookie, SameSite};
use sqlx::SqlitePool;

use crate::{
    domain::AdminUser,
    error::{AppError, Result},
};

pub mod session;

use session::AdminSessions;

pub const SESSION_COOKIE: &str = "session";

/// Admin-panel authentication. Sessions are random tokens stored server-side
/// as SHA-256 hashes; nothing is signed.
pub struct AuthService {
    sessions: AdminSessions,
}

impl AuthService {
    pub fn new(pool: SqlitePool, session_duration_hours: i64) -> Self {
        Self {
            sessions: AdminSessions::new(pool, Duration::hours(session_duration_hours)),
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Starts a session for `admin` and returns the cookie token.
    pub async fn create_session(&self, admin: &AdminUser) -> Result<String> {
        self.sessions.open(admin).await
    }

    /// The admin a session cookie belongs to, if it is still valid.
    pub async fn current_admin(&self, token: &str) -> Result<Option<AdminUser>> {
        self.sessions.resolve(token).await
    }

    pub async fn invalidate_session(&self, token: &str) -> Result<()> {
        self.sessions.close(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.sessions.purge_expired().await
    }

    pub fn create_session_cookie(&self, token: &str, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .max_age(cookie::time::Duration::seconds(self.sessions.ttl().num_seconds()))
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_round_trip() {
        let hash = AuthService::hash_password("correct horse").await.unwrap();

        assert!(AuthService::verify_password("correct horse", &hash).await.unwrap());
        assert!(!AuthService::verify_password("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(AuthService::verify_password("x", "not-a-phc-string").await.is_err());
    }
}
