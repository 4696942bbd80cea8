//! PromptPay charge lifecycle: create a charge at the gateway, poll it to a
//! terminal status, and commit the membership record once it succeeds.

use async_trait::async_trait;

use crate::{
    domain::{Charge, CreateChargeRequest},
    error::Result,
};

pub mod omise_client;
pub mod initiator;
pub mod poller;
pub mod committer;
pub mod qr;
pub mod sessions;
pub mod flow;

pub use omise_client::OmiseClient;
pub use initiator::ChargeInitiator;
pub use poller::{PollOutcome, PollPolicy, StatusPoller};
pub use committer::RecordCommitter;
pub use qr::{QrExport, QrExporter, QrImage};
pub use sessions::{PaymentSessionView, PaymentSessions, PaymentState};
pub use flow::PaymentFlow;

/// The subset of the gateway API this service needs.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: &CreateChargeRequest) -> Result<Charge>;
    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge>;
}
