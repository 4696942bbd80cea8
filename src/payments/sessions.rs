use std::{collections::HashMap, time::Duration};

use serde::Serialize;
use tokio::{sync::RwLock, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{Charge, MembershipApplication, MembershipType};

/// Settled sessions are kept this long so the client can read the outcome.
const RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Processing,
    Success,
    Failed,
}

/// What the client sees of a payment in progress.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSessionView {
    pub charge_id: String,
    pub state: PaymentState,
    pub amount: i64,
    pub currency: String,
    pub membership_type: MembershipType,
    pub qr_image_url: Option<String>,
    pub qr_download_path: Option<String>,
    pub failure_reason: Option<String>,
    pub member_id: Option<Uuid>,
    /// Set when the charge succeeded but the record could not be saved.
    pub commit_error: Option<String>,
}

struct PaymentSession {
    application: MembershipApplication,
    charge: Charge,
    state: PaymentState,
    failure_reason: Option<String>,
    member_id: Option<Uuid>,
    commit_error: Option<String>,
    cancel: CancellationToken,
    finished_at: Option<Instant>,
}

impl PaymentSession {
    fn view(&self) -> PaymentSessionView {
        let qr_image_url = self.charge.qr_image_url().map(str::to_string);
        let qr_download_path = qr_image_url
            .as_deref()
            .map(|url| format!("/api/download-qr?url={}", urlencoding::encode(url)));

        PaymentSessionView {
            charge_id: self.charge.id.clone(),
            state: self.state,
            amount: self.charge.amount,
            currency: self.charge.currency.clone(),
            membership_type: self.application.membership_type,
            qr_image_url,
            qr_download_path,
            failure_reason: self.failure_reason.clone(),
            member_id: self.member_id,
            commit_error: self.commit_error.clone(),
        }
    }

    fn settle(&mut self, state: PaymentState) {
        self.state = state;
        self.finished_at = Some(Instant::now());
    }
}

/// In-memory table of payment sessions keyed by charge id.
pub struct PaymentSessions {
    inner: RwLock<HashMap<String, PaymentSession>>,
    retention: Duration,
}

impl Default for PaymentSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentSessions {
    pub fn new() -> Self {
        Self::with_retention(RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Opens a processing session for a freshly created charge.
    pub async fn insert(
        &self,
        application: MembershipApplication,
        charge: Charge,
        cancel: CancellationToken,
    ) -> PaymentSessionView {
        let session = PaymentSession {
            application,
            charge,
            state: PaymentState::Processing,
            failure_reason: None,
            member_id: None,
            commit_error: None,
            cancel,
            finished_at: None,
        };
        let view = session.view();

        let mut sessions = self.inner.write().await;
        let retention = self.retention;
        sessions.retain(|_, s| s.finished_at.map_or(true, |at| at.elapsed() < retention));
        sessions.insert(view.charge_id.clone(), session);
        view
    }

    pub async fn view(&self, charge_id: &str) -> Option<PaymentSessionView> {
        self.inner.read().await.get(charge_id).map(PaymentSession::view)
    }

    pub async fn state(&self, charge_id: &str) -> Option<PaymentState> {
        self.inner.read().await.get(charge_id).map(|s| s.state)
    }

    pub async fn succeed(&self, charge_id: &str, member_id: Option<Uuid>, commit_error: Option<String>) {
        if let Some(session) = self.inner.write().await.get_mut(charge_id) {
            session.member_id = member_id;
            session.commit_error = commit_error;
            session.settle(PaymentState::Success);
        }
    }

    pub async fn fail(&self, charge_id: &str, reason: impl Into<String>) {
        if let Some(session) = self.inner.write().await.get_mut(charge_id) {
            session.failure_reason = Some(reason.into());
            session.settle(PaymentState::Failed);
        }
    }

    /// Removes a failed session and hands back its application for a new
    /// charge. Sessions in any other state stay put.
    pub async fn take_failed(&self, charge_id: &str) -> Option<MembershipApplication> {
        let mut sessions = self.inner.write().await;
        match sessions.get(charge_id) {
            Some(s) if s.state == PaymentState::Failed => {
                sessions.remove(charge_id).map(|s| s.application)
            }
            _ => None,
        }
    }

    /// Drops a session and stops its poller. Returns false if it was unknown.
    pub async fn remove(&self, charge_id: &str) -> bool {
        match self.inner.write().await.remove(charge_id) {
            Some(session) => {
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application() -> MembershipApplication {
        serde_json::from_value(serde_json::json!({
            "title": "นาย",
            "first_name": "สมชาย",
            "religion": "พุทธ",
            "nationality": "สัญชาติไทยโดยกำเนิด",
            "id_card": "1103700012345",
            "card_issue_date": "2020-01-01",
            "card_expiry_date": "2028-01-01",
            "birth_date": "1990-05-20",
            "house_number": "1",
            "province": "กรุงเทพมหานคร",
            "district": "เขตพระนคร",
            "sub_district": "พระบรมมหาราชวัง",
            "postal_code": "10200",
            "phone": "0812345678",
            "membership_type": "yearly",
            "payment_method": "promptpay",
            "selfie_with_document_url": "uploads/a.jpg",
            "id_card_image_url": "uploads/b.jpg"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn only_failed_sessions_are_taken() {
        let sessions = PaymentSessions::new();
        let token = CancellationToken::new();
        sessions
            .insert(application(), Charge::synthetic_pending("chrg_1", 2000, "THB"), token.clone())
            .await;

        assert!(sessions.take_failed("chrg_1").await.is_none());
        assert_eq!(sessions.len().await, 1);

        sessions.fail("chrg_1", "Payment expired").await;
        let view = sessions.view("chrg_1").await.unwrap();
        assert_eq!(view.state, PaymentState::Failed);
        assert_eq!(view.qr_download_path, None);

        assert!(sessions.take_failed("chrg_1").await.is_some());
        assert!(sessions.is_empty().await);
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn remove_cancels_the_poller() {
        let sessions = PaymentSessions::new();
        let token = CancellationToken::new();
        sessions
            .insert(application(), Charge::synthetic_pending("chrg_1", 2000, "THB"), token.clone())
            .await;

        assert!(sessions.remove("chrg_1").await);
        assert!(token.is_cancelled());
        assert!(!sessions.remove("chrg_1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_sessions_expire_on_next_insert() {
        let sessions = PaymentSessions::with_retention(Duration::from_secs(60));
        sessions
            .insert(application(), Charge::synthetic_pending("chrg_1", 2000, "THB"), CancellationToken::new())
            .await;
        sessions
            .insert(application(), Charge::synthetic_pending("chrg_2", 2000, "THB"), CancellationToken::new())
            .await;
        sessions.succeed("chrg_1", None, None).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        sessions
            .insert(application(), Charge::synthetic_pending("chrg_3", 2000, "THB"), CancellationToken::new())
            .await;

        // chrg_2 is still processing and survives
        assert!(sessions.view("chrg_1").await.is_none());
        assert!(sessions.view("chrg_2").await.is_some());
        assert_eq!(sessions.len().await, 2);
    }
}
