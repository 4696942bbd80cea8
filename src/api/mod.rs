pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let uploads_dir = settings.uploads.dir.clone();
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Auth routes
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))

        // Public API used by the registration form
        .nest("/api", api_routes())

        // Admin panel
        .nest("/admin", admin_routes(app_state.clone()))

        // Stored document images
        .nest_service("/uploads", ServeDir::new(uploads_dir))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/options", get(handlers::options::form_options))
        .nest("/address", address_routes())
        .route(
            "/uploads",
            post(handlers::uploads::upload)
                .layer(DefaultBodyLimit::max(handlers::uploads::UPLOAD_BODY_LIMIT)),
        )
        .route("/registrations", post(handlers::registrations::submit))
        .nest("/payments", payment_routes())
        // Gateway pass-throughs
        .route("/create-payment", post(handlers::proxy::create_payment))
        .route("/check-payment/:charge_id", get(handlers::proxy::check_payment))
        .route("/download-qr", get(handlers::proxy::download_qr))
}

fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(handlers::address::provinces))
        .route("/provinces/:id/districts", get(handlers::address::districts))
        .route("/districts/:id/sub-districts", get(handlers::address::sub_districts))
        .route("/sub-districts/:id/postal-code", get(handlers::address::postal_code))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:charge_id",
            get(handlers::payments::status).delete(handlers::payments::cancel),
        )
        .route("/:charge_id/retry", post(handlers::payments::retry))
        .route("/:charge_id/qr", get(handlers::payments::qr))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route("/members", get(handlers::admin::list_members))
        .route("/members/export", get(handlers::admin::export_members))
        .route(
            "/members/:id",
            get(handlers::admin::get_member)
                .put(handlers::admin::update_member)
                .delete(handlers::admin::delete_member),
        )
        .route("/members/:id/approve", post(handlers::admin::approve_member))
        .route("/members/:id/reject", post(handlers::admin::reject_member))
        .route("/members/:id/payment", get(handlers::admin::check_payment))
        .route("/members/:id/receipt", get(handlers::admin::receipt))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
