use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
