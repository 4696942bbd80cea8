//! Thin pass-throughs to the gateway for clients that drive the payment
//! themselves.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::state::AppState,
    domain::{Charge, CreateChargeRequest, MembershipType},
    error::{AppError, Result},
    payments::ChargeInitiator,
};

#[derive(Debug, Deserialize)]
pub struct DownloadQrParams {
    pub url: Option<String>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreateChargeRequest>,
) -> Result<Json<Charge>> {
    let gateway = state.service_context.gateway
        .clone()
        .ok_or_else(|| AppError::Payment("Failed to create payment".to_string()))?;

    let charge = ChargeInitiator::new(gateway).create(&request).await?;
    Ok(Json(charge))
}

pub async fn check_payment(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<Json<Charge>> {
    tracing::info!("Checking payment status for charge {}", charge_id);

    let result = match state.service_context.gateway.as_ref() {
        Some(gateway) => gateway.retrieve_charge(&charge_id).await,
        None => Err(AppError::External("Payment gateway is not configured".to_string())),
    };

    match result {
        Ok(charge) => {
            tracing::info!("Charge {} status: {}", charge_id, charge.status.as_str());
            Ok(Json(charge))
        }
        Err(e) if state.settings.payment.mask_check_errors => {
            tracing::warn!("Charge lookup failed, answering pending: {}", e);
            Ok(Json(Charge::synthetic_pending(
                &charge_id,
                MembershipType::Yearly.amount_satang(),
                &state.settings.payment.currency,
            )))
        }
        Err(e) => Err(e),
    }
}

pub async fn download_qr(
    State(state): State<AppState>,
    Query(params): Query<DownloadQrParams>,
) -> Response {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "URL parameter is required" })),
        )
            .into_response();
    };

    let image = match state.service_context.qr_exporter.fetch(&url).await {
        Ok(image) => image.into_png().await,
        Err(e) => Err(e),
    };

    match image {
        Ok(image) => (
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"qr-code.png\"".to_string()),
            ],
            image.bytes,
        )
            .into_response(),
        Err(AppError::BadRequest(message)) => {
            tracing::warn!("Refused QR download from {}: {}", url, message);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        Err(e) => {
            tracing::error!("Error downloading QR code: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to download QR code" })),
            )
                .into_response()
        }
    }
}
