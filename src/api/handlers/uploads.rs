use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    web::uploads::{save_data_uri, save_uploaded_file},
};

/// Body limit for the upload route. A 5 MB image grows by a third as base64.
pub const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct DataUriUpload {
    pub data_uri: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Accepts a multipart `file` field or a JSON `{data_uri}` body.
pub async fn upload(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let uploads_dir = state.settings.uploads.dir.clone();
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let url = if is_multipart {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        save_multipart(&uploads_dir, &mut multipart).await?
    } else {
        let Json(body) = Json::<DataUriUpload>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        save_data_uri(&uploads_dir, &body.data_uri).await?
    };

    tracing::info!("Stored document image {}", url);
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

async fn save_multipart(uploads_dir: &str, multipart: &mut Multipart) -> Result<String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return save_uploaded_file(uploads_dir, &filename, &data).await;
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}
