use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod member_repository;
pub mod admin_repository;

pub use member_repository::SqliteMemberRepository;
pub use admin_repository::SqliteAdminRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, record: NewMemberRecord) -> Result<Member>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Member>>;
    async fn list(&self, filter: &MemberFilter, limit: i64, offset: i64) -> Result<Vec<Member>>;
    async fn count(&self, filter: &MemberFilter) -> Result<i64>;
    async fn update(&self, id: Uuid, application: MembershipApplication) -> Result<Member>;
    async fn update_status(&self, id: Uuid, status: MemberStatus) -> Result<Member>;
    async fn mark_payment_completed(&self, id: Uuid) -> Result<Member>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn stats(&self) -> Result<MemberStats>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str) -> Result<AdminUser>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
}
