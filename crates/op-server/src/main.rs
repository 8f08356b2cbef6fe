//! OpenProject RS Server
//!
//! Serves the work package actions over HTTP. Uses Postgres when the
//! configured database is reachable and a seeded in-memory store otherwise.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use op_api::{ApiConfig, AppState};
use op_attachments::{AttachmentConfig, AttachmentService, AttachmentStore, LocalStorage, MemoryAttachmentStore};
use op_auth::{CurrentUser, JwtService};
use op_core::config::{AppConfig, ServerConfig};
use op_db::{
    Database, DatabaseConfig, MemoryWorkPackageStore, PgAttachmentStore, PgNotificationStore, PgWorkPackageStore,
    WorkPackageStore,
};
use op_notifications::{MemoryNotificationStore, NotificationService, NotificationStore};
use op_services::work_packages::WorkPackageHandler;

mod health;
mod metrics;
mod seed;

use health::{HealthChecker, HealthConfig};
use metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting OpenProject RS"
    );

    let db = match Database::connect(&DatabaseConfig::from(&config.database)).await {
        Ok(db) => {
            info!("Connected to database");
            Some(db)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to database: {}. Running on the in-memory store.", e);
            None
        }
    };

    let jwt = JwtService::new(config.auth.jwt_secret.as_bytes());

    let stores = match db {
        Some(ref db) => Stores::postgres(db),
        None => {
            let store = MemoryWorkPackageStore::new();
            seed::seed_demo(&store).await?;
            log_demo_token(&jwt, &config)?;
            Stores::memory(store)
        }
    };

    let max_file_size = i64::try_from(config.storage.max_attachment_size).unwrap_or(i64::MAX);
    let attachments = AttachmentService::new(
        stores.attachments,
        Arc::new(LocalStorage::new(&config.storage.local_path)),
        AttachmentConfig::default().with_max_file_size(max_file_size),
    );

    let handler = WorkPackageHandler::new(
        stores.work_packages,
        attachments,
        NotificationService::new(stores.notifications),
        config.work_packages.clone(),
    );

    let mut health = HealthChecker::new(HealthConfig::default()).with_attachments_path(&config.storage.local_path);
    if let Some(db) = db {
        health = health.with_database(db);
    }

    let state = AppState::new(handler, jwt, ApiConfig::default());
    let app = build_router(state, Arc::new(health), Arc::new(Metrics::new()), &config.server);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Record stores backing one server run
struct Stores {
    work_packages: Arc<dyn WorkPackageStore>,
    attachments: Arc<dyn AttachmentStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    fn postgres(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            work_packages: Arc::new(PgWorkPackageStore::new(pool.clone())),
            attachments: Arc::new(PgAttachmentStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool)),
        }
    }

    fn memory(store: MemoryWorkPackageStore) -> Self {
        Self {
            work_packages: Arc::new(store),
            attachments: Arc::new(MemoryAttachmentStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,op_server=debug,op_api=debug,op_services=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Token for the seeded admin, so the demo can be used right away
fn log_demo_token(jwt: &JwtService, config: &AppConfig) -> anyhow::Result<()> {
    let expires_in = i64::try_from(config.auth.token_expiration_seconds).unwrap_or(i64::MAX);
    let token = jwt.create_token(&CurrentUser::admin(seed::ADMIN_ID, "admin"), expires_in)?;
    info!(%token, "Demo admin bearer token");
    Ok(())
}

fn build_router(
    state: AppState,
    health: Arc<HealthChecker>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(metrics.clone());

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(op_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(metrics, metrics::metrics_middleware))
                .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_seconds)))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(DefaultBodyLimit::max(server.max_body_size_bytes))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
