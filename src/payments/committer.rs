use std::sync::Arc;

use crate::{
    domain::{Member, MembershipApplication, NewMemberRecord},
    error::{AppError, Result},
    repository::MemberRepository,
};

/// Persists a paid registration. Keyed on the charge id, so committing the
/// same charge twice returns the first record instead of writing again.
pub struct RecordCommitter {
    repo: Arc<dyn MemberRepository>,
}

impl RecordCommitter {
    pub fn new(repo: Arc<dyn MemberRepository>) -> Self {
        Self { repo }
    }

    pub async fn commit(
        &self,
        application: &MembershipApplication,
        charge_id: &str,
    ) -> Result<Member> {
        if let Some(existing) = self.repo.find_by_charge_id(charge_id).await? {
            tracing::warn!("Charge {} already committed as member {}", charge_id, existing.id);
            return Ok(existing);
        }

        match self.repo.create(NewMemberRecord::paid(application.clone(), charge_id)).await {
            Ok(member) => {
                tracing::info!("Committed member {} for charge {}", member.id, charge_id);
                Ok(member)
            }
            // lost a race with another commit of the same charge
            Err(AppError::Conflict(_)) => self.repo
                .find_by_charge_id(charge_id)
                .await?
                .ok_or_else(|| AppError::Database(format!("Member for charge {} vanished", charge_id))),
            Err(e) => Err(e),
        }
    }
}
