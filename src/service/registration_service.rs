use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    domain::{validation::validate_application, Member, MembershipApplication, PaymentMethod},
    error::{AppError, Result},
    payments::{PaymentFlow, PaymentSessionView},
    service::member_service::MemberService,
};

#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Cash: stored straight away.
    Recorded(Member),
    /// PromptPay: stored once the charge succeeds.
    AwaitingPayment(PaymentSessionView),
}

/// Entry point for the public registration form.
pub struct RegistrationService {
    members: Arc<MemberService>,
    payments: Option<Arc<PaymentFlow>>,
}

impl RegistrationService {
    pub fn new(members: Arc<MemberService>, payments: Option<Arc<PaymentFlow>>) -> Self {
        Self { members, payments }
    }

    pub async fn submit(&self, application: MembershipApplication, today: NaiveDate) -> Result<RegistrationOutcome> {
        validate_application(&application, today)?;

        match application.payment_method {
            PaymentMethod::Cash => {
                let member = self.members.register_cash(application).await?;
                Ok(RegistrationOutcome::Recorded(member))
            }
            PaymentMethod::PromptPay => {
                let flow = self.payments
                    .as_ref()
                    .ok_or_else(|| AppError::Payment("PromptPay is not available".to_string()))?;
                let view = flow.start(application).await?;
                Ok(RegistrationOutcome::AwaitingPayment(view))
            }
        }
    }
}
