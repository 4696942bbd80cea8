use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    payments::{PaymentFlow, PaymentSessionView, QrExport},
};

fn flow(state: &AppState) -> Result<&Arc<PaymentFlow>> {
    state.service_context.payment_flow
        .as_ref()
        .ok_or_else(|| AppError::NotFound("PromptPay is not available".to_string()))
}

pub async fn status(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<Json<PaymentSessionView>> {
    Ok(Json(flow(&state)?.status(&charge_id).await?))
}

pub async fn retry(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<(StatusCode, Json<PaymentSessionView>)> {
    let view = flow(&state)?.retry(&charge_id).await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<StatusCode> {
    flow(&state)?.cancel(&charge_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// QR image as a download, or a redirect to the gateway's URL when it
/// cannot be fetched.
pub async fn qr(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<Response> {
    let view = flow(&state)?.status(&charge_id).await?;
    let url = view
        .qr_image_url
        .ok_or_else(|| AppError::NotFound("Payment has no QR code".to_string()))?;

    let response = match state.service_context.qr_exporter.export(&url, &charge_id).await {
        QrExport::Download { image, filename } => (
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
            ],
            image.bytes,
        )
            .into_response(),
        QrExport::OpenInBrowser(url) => Redirect::to(&url).into_response(),
    };

    Ok(response)
}
