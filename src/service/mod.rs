pub mod member_service;
pub mod registration_service;
pub mod export;

use std::sync::Arc;
use crate::repository::*;
use crate::auth::AuthService;
use crate::address::AddressBook;
use crate::payments::{PaymentFlow, PaymentGateway, QrExporter};
use member_service::MemberService;
use registration_service::RegistrationService;

pub use registration_service::RegistrationOutcome;

pub struct ServiceContext {
    pub admin_repo: Arc<dyn AdminRepository>,
    pub auth_service: Arc<AuthService>,
    pub member_service: Arc<MemberService>,
    pub registration_service: Arc<RegistrationService>,
    /// `None` when no gateway keys are configured.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub payment_flow: Option<Arc<PaymentFlow>>,
    pub qr_exporter: Arc<QrExporter>,
    pub address_book: Arc<AddressBook>,
}

impl ServiceContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        member_repo: Arc<dyn MemberRepository>,
        admin_repo: Arc<dyn AdminRepository>,
        auth_service: Arc<AuthService>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        payment_flow: Option<Arc<PaymentFlow>>,
        qr_exporter: Arc<QrExporter>,
        address_book: Arc<AddressBook>,
    ) -> Self {
        let member_service = Arc::new(MemberService::new(member_repo, gateway.clone()));
        let registration_service = Arc::new(RegistrationService::new(
            member_service.clone(),
            payment_flow.clone(),
        ));

        Self {
            admin_repo,
            auth_service,
            member_service,
            registration_service,
            gateway,
            payment_flow,
            qr_exporter,
            address_book,
        }
    }
}
