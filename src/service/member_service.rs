use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    payments::PaymentGateway,
    repository::MemberRepository,
};

/// Set once at registration; admin edits never change it.
const PINNED_FIELD: &str = "payment_method";

/// Admin-side operations on stored membership records.
pub struct MemberService {
    repo: Arc<dyn MemberRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl MemberService {
    pub fn new(repo: Arc<dyn MemberRepository>, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self { repo, gateway }
    }

    /// Stores a cash registration. No payment is taken online, so the record
    /// starts unpaid.
    pub async fn register_cash(&self, application: MembershipApplication) -> Result<Member> {
        if application.payment_method != PaymentMethod::Cash {
            return Err(AppError::BadRequest("Not a cash registration".to_string()));
        }

        let member = self.repo.create(NewMemberRecord::unpaid(application)).await?;
        tracing::info!("Registered member {} (cash)", member.id);
        Ok(member)
    }

    pub async fn get(&self, id: Uuid) -> Result<Member> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn list(&self, filter: &MemberFilter, limit: i64, offset: i64) -> Result<Vec<Member>> {
        self.repo.list(filter, limit, offset).await
    }

    pub async fn count(&self, filter: &MemberFilter) -> Result<i64> {
        self.repo.count(filter).await
    }

    /// Every member matching the filter, for export.
    pub async fn list_all(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        let total = self.repo.count(filter).await?;
        self.repo.list(filter, total.max(1), 0).await
    }

    /// Applies the fields present in `changes` on top of the stored
    /// application. Unknown keys are ignored, and so is `payment_method`: a
    /// record only becomes PromptPay through a successful charge.
    pub async fn update(&self, id: Uuid, changes: Map<String, Value>) -> Result<Member> {
        let member = self.get(id).await?;

        let mut merged = match serde_json::to_value(&member.application) {
            Ok(Value::Object(fields)) => fields,
            _ => return Err(AppError::Internal("Member did not serialize to an object".to_string())),
        };
        for (key, value) in changes {
            if key == PINNED_FIELD {
                tracing::warn!("Ignoring payment method change on member {}", id);
                continue;
            }
            if merged.contains_key(&key) {
                merged.insert(key, value);
            }
        }

        let application: MembershipApplication = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::BadRequest(format!("Invalid member update: {}", e)))?;
        application.validate()?;

        let updated = self.repo.update(id, application).await?;
        tracing::info!("Updated member {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.repo.delete(id).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<Member> {
        self.set_status(id, MemberStatus::Approved).await
    }

    pub async fn reject(&self, id: Uuid) -> Result<Member> {
        self.set_status(id, MemberStatus::Rejected).await
    }

    async fn set_status(&self, id: Uuid, status: MemberStatus) -> Result<Member> {
        self.repo.update_status(id, status).await
    }

    pub async fn stats(&self) -> Result<MemberStats> {
        self.repo.stats().await
    }

    /// Asks the gateway about the member's charge and records the payment
    /// once the charge is successful.
    pub async fn check_payment(&self, id: Uuid) -> Result<(Member, Charge)> {
        let member = self.get(id).await?;
        let charge = self.member_charge(&member).await?;

        if charge.status == ChargeStatus::Successful && member.payment_status != PaymentStatus::Completed {
            let member = self.repo.mark_payment_completed(id).await?;
            tracing::info!("Payment for member {} confirmed by charge {}", id, charge.id);
            return Ok((member, charge));
        }

        Ok((member, charge))
    }

    /// Member and charge for the payment receipt. Fails unless the charge
    /// has gone through.
    pub async fn receipt(&self, id: Uuid) -> Result<(Member, Charge)> {
        let member = self.get(id).await?;
        if member.charge_id.is_none() {
            return Err(AppError::BadRequest("Payment not completed".to_string()));
        }

        let charge = self.member_charge(&member).await?;
        if charge.status != ChargeStatus::Successful {
            return Err(AppError::BadRequest("Payment not completed".to_string()));
        }

        Ok((member, charge))
    }

    async fn member_charge(&self, member: &Member) -> Result<Charge> {
        let charge_id = member
            .charge_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Member has no online payment".to_string()))?;
        let gateway = self.gateway
            .as_ref()
            .ok_or_else(|| AppError::External("Payment gateway is not configured".to_string()))?;

        gateway.retrieve_charge(charge_id).await
    }
}
