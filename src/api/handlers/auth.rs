use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    auth::{self, SESSION_COOKIE},
    domain::AdminUser,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub admin: AdminUser,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let email = req.email.trim().to_lowercase();
    let admin_repo = &state.service_context.admin_repo;

    let password_hash = admin_repo
        .password_hash(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !auth::AuthService::verify_password(&req.password, &password_hash).await? {
        tracing::warn!("Failed admin login for {}", email);
        return Err(AppError::Unauthorized);
    }

    let admin = admin_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let token = state.service_context.auth_service
        .create_session(&admin)
        .await?;

    let secure = state.settings.server.base_url.starts_with("https://");
    let cookie = state.service_context.auth_service
        .create_session_cookie(&token, secure);

    tracing::info!("Admin {} logged in", admin.email);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            admin,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let _ = state.service_context.auth_service
            .invalidate_session(session_cookie.value())
            .await;
    }

    let jar = jar.add(auth::AuthService::create_logout_cookie());

    Ok((jar, StatusCode::NO_CONTENT))
}
