use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ktmember::{
    address::AddressBook,
    api,
    auth::AuthService,
    config::Settings,
    payments::{
        ChargeInitiator, OmiseClient, PaymentFlow, PaymentGateway, PollPolicy, QrExporter,
        RecordCommitter, StatusPoller,
    },
    repository::{AdminRepository, MemberRepository, SqliteAdminRepository, SqliteMemberRepository},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ktmember=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting KT Member server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        settings.auth.session_duration_hours,
    ));
    let removed = auth_service.cleanup_expired_sessions().await?;
    if removed > 0 {
        tracing::info!("Removed {} expired admin sessions", removed);
    }

    // Initialize repositories
    let member_repo: Arc<dyn MemberRepository> =
        Arc::new(SqliteMemberRepository::new(db_pool.clone()));
    let admin_repo: Arc<dyn AdminRepository> =
        Arc::new(SqliteAdminRepository::new(db_pool.clone()));

    bootstrap_admin(&settings, admin_repo.as_ref()).await?;

    // Payment gateway, only when keys are configured
    let gateway: Option<Arc<dyn PaymentGateway>> = match settings.gateway.secret_key.as_deref() {
        Some(secret_key) if !secret_key.is_empty() => {
            tracing::info!("PromptPay payments enabled via {}", settings.gateway.base_url);
            Some(Arc::new(OmiseClient::new(settings.gateway.base_url.clone(), secret_key)?))
        }
        _ => {
            tracing::warn!("No gateway secret key configured; PromptPay payments disabled");
            None
        }
    };

    let payment_flow = gateway.clone().map(|gateway| {
        Arc::new(PaymentFlow::new(
            ChargeInitiator::new(gateway.clone()),
            StatusPoller::new(gateway, PollPolicy::from_config(&settings.payment)),
            RecordCommitter::new(member_repo.clone()),
            settings.payment.currency.clone(),
            settings.payment.party_name.clone(),
        ))
    });

    let address_book = Arc::new(AddressBook::load_or_empty(&settings.address).await);

    let service_context = Arc::new(ServiceContext::new(
        member_repo,
        admin_repo,
        auth_service,
        gateway,
        payment_flow,
        Arc::new(QrExporter::new(settings.gateway.qr_hosts.clone())?),
        address_book,
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Creates the configured admin account on first start.
async fn bootstrap_admin(settings: &Settings, admin_repo: &dyn AdminRepository) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        settings.admin.email.as_deref(),
        settings.admin.password.as_deref(),
    ) else {
        return Ok(());
    };

    let email = email.trim().to_lowercase();
    if admin_repo.find_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let hash = AuthService::hash_password(password).await?;
    admin_repo.create(&email, &hash).await?;
    tracing::info!("Created admin account {}", email);

    Ok(())
}
