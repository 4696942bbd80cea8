use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ChargeStatus, CreateChargeRequest, MembershipApplication, PaymentMethod, SourceRequest},
    error::{AppError, Result},
    payments::{
        ChargeInitiator, PaymentSessionView, PaymentSessions, PaymentState, PollOutcome,
        RecordCommitter, StatusPoller,
    },
};

/// Drives a PromptPay registration from charge creation to the stored
/// record. Each charge gets its own background task; the client follows it
/// through [`PaymentFlow::status`].
pub struct PaymentFlow {
    initiator: ChargeInitiator,
    poller: StatusPoller,
    committer: RecordCommitter,
    sessions: PaymentSessions,
    currency: String,
    party_name: String,
}

impl PaymentFlow {
    pub fn new(
        initiator: ChargeInitiator,
        poller: StatusPoller,
        committer: RecordCommitter,
        currency: impl Into<String>,
        party_name: impl Into<String>,
    ) -> Self {
        Self {
            initiator,
            poller,
            committer,
            sessions: PaymentSessions::new(),
            currency: currency.into(),
            party_name: party_name.into(),
        }
    }

    pub fn charge_request_for(&self, application: &MembershipApplication) -> CreateChargeRequest {
        CreateChargeRequest {
            amount: application.membership_type.amount_satang(),
            currency: self.currency.clone(),
            description: format!(
                "{} Membership - {}",
                self.party_name,
                application.membership_type.label_en()
            ),
            source: SourceRequest::promptpay(),
        }
    }

    /// Creates a charge for the application and starts watching it.
    pub async fn start(self: &Arc<Self>, application: MembershipApplication) -> Result<PaymentSessionView> {
        if application.payment_method != PaymentMethod::PromptPay {
            return Err(AppError::BadRequest(
                "Only PromptPay registrations go through the payment flow".to_string(),
            ));
        }

        let charge = self.initiator.create(&self.charge_request_for(&application)).await?;
        let charge_id = charge.id.clone();
        let cancel = CancellationToken::new();
        let view = self.sessions.insert(application.clone(), charge, cancel.clone()).await;

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            flow.drive(charge_id, application, cancel).await;
        });

        Ok(view)
    }

    /// Replaces a failed charge with a new one for the same application.
    pub async fn retry(self: &Arc<Self>, charge_id: &str) -> Result<PaymentSessionView> {
        match self.sessions.state(charge_id).await {
            None => return Err(AppError::NotFound(format!("Payment {} not found", charge_id))),
            Some(PaymentState::Failed) => {}
            Some(_) => {
                return Err(AppError::BadRequest(
                    "Only a failed payment can be retried".to_string(),
                ))
            }
        }

        let application = self.sessions
            .take_failed(charge_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", charge_id)))?;

        tracing::info!("Retrying payment {} with a new charge", charge_id);
        self.start(application).await
    }

    pub async fn status(&self, charge_id: &str) -> Result<PaymentSessionView> {
        self.sessions
            .view(charge_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", charge_id)))
    }

    /// Abandons a payment. A record already committed for it stays.
    pub async fn cancel(&self, charge_id: &str) -> Result<()> {
        if self.sessions.remove(charge_id).await {
            tracing::info!("Payment {} cancelled", charge_id);
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Payment {} not found", charge_id)))
        }
    }

    /// A charge that comes back successful is always committed, even if its
    /// session was cancelled in the meantime.
    async fn drive(&self, charge_id: String, application: MembershipApplication, cancel: CancellationToken) {
        match self.poller.poll(&charge_id, &cancel).await {
            PollOutcome::Successful(charge) => {
                match self.committer.commit(&application, &charge.id).await {
                    Ok(member) => self.sessions.succeed(&charge_id, Some(member.id), None).await,
                    Err(e) => {
                        tracing::error!("Charge {} paid but the member record was not saved: {}", charge_id, e);
                        self.sessions.succeed(&charge_id, None, Some(e.to_string())).await;
                    }
                }
            }
            PollOutcome::Failed(status) => {
                let reason = match status {
                    ChargeStatus::Expired => "Payment expired",
                    _ => "Payment failed",
                };
                self.sessions.fail(&charge_id, reason).await;
            }
            PollOutcome::TimedOut => {
                self.sessions.fail(&charge_id, "Payment timed out").await;
            }
            PollOutcome::Cancelled => {
                tracing::debug!("Poller for charge {} stopped", charge_id);
            }
        }
    }
}
