use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    api::state::AppState,
    domain::{MembershipType, NATIONALITIES, RELIGIONS, TITLES},
};

#[derive(Debug, Serialize)]
pub struct MembershipOption {
    pub value: MembershipType,
    pub label: &'static str,
    pub price_baht: i64,
}

#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub titles: &'static [&'static str],
    pub religions: &'static [&'static str],
    pub nationalities: &'static [&'static str],
    pub membership_types: Vec<MembershipOption>,
    pub payment_methods: Vec<&'static str>,
    /// Omise public key for the client, when configured.
    pub public_key: Option<String>,
}

/// Choices the registration form renders.
pub async fn form_options(State(state): State<AppState>) -> Json<FormOptions> {
    let membership_types = [MembershipType::Yearly, MembershipType::Lifetime]
        .into_iter()
        .map(|t| MembershipOption {
            value: t,
            label: t.label_th(),
            price_baht: t.price_baht(),
        })
        .collect();

    let mut payment_methods = vec!["cash"];
    if state.service_context.payment_flow.is_some() {
        payment_methods.push("promptpay");
    }

    Json(FormOptions {
        titles: TITLES,
        religions: RELIGIONS,
        nationalities: NATIONALITIES,
        membership_types,
        payment_methods,
        public_key: state.settings.gateway.public_key.clone(),
    })
}
