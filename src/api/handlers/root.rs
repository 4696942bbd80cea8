use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "KT Member API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Party membership registration with PromptPay payments",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "options": "/api/options",
            "address": "/api/address/provinces",
            "register": "/api/registrations",
            "auth": "/auth/login",
            "admin": "/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
