use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::AdminUser,
    error::AppError,
};

#[derive(Clone)]
pub struct CurrentAdmin {
    pub admin: AdminUser,
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_cookie = jar
        .get(SESSION_COOKIE)
        .ok_or(AppError::Unauthorized)?;

    let admin = state.service_context.auth_service
        .current_admin(session_cookie.value())
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentAdmin { admin });

    Ok(next.run(request).await)
}
