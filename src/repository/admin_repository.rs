use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::AdminUser,
    error::{AppError, Result},
    repository::AdminRepository,
};

#[derive(FromRow)]
struct AdminRow {
    id: String,
    email: String,
    created_at: NaiveDateTime,
}

pub struct SqliteAdminRepository {
    pool: SqlitePool,
}

impl SqliteAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_admin(row: AdminRow) -> Result<AdminUser> {
        Ok(AdminUser {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl AdminRepository for SqliteAdminRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<AdminUser> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            "INSERT INTO admin_users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)"
        )
        .bind(id.to_string())
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.message().contains("UNIQUE") => {
                AppError::Conflict("Admin email already exists".to_string())
            }
            e => AppError::Database(e.to_string()),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created admin".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, created_at FROM admin_users WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_admin).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, created_at FROM admin_users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_admin).transpose()
    }

    async fn password_hash(&self, email: &str) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM admin_users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }
}
