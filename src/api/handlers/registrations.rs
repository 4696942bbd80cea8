use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    api::state::AppState,
    domain::{Member, MembershipApplication},
    error::Result,
    payments::PaymentSessionView,
    service::RegistrationOutcome,
};

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationResponse {
    Recorded { member: Member },
    AwaitingPayment { payment: PaymentSessionView },
}

pub async fn submit(
    State(state): State<AppState>,
    Json(application): Json<MembershipApplication>,
) -> Result<(StatusCode, Json<RegistrationResponse>)> {
    let today = chrono::Local::now().date_naive();
    let outcome = state.service_context.registration_service
        .submit(application, today)
        .await?;

    let response = match outcome {
        RegistrationOutcome::Recorded(member) => (
            StatusCode::CREATED,
            Json(RegistrationResponse::Recorded { member }),
        ),
        RegistrationOutcome::AwaitingPayment(payment) => (
            StatusCode::ACCEPTED,
            Json(RegistrationResponse::AwaitingPayment { payment }),
        ),
    };

    Ok(response)
}
