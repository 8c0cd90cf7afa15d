use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidfeed_api::config::ServerConfig;
use vidfeed_api::router::build_app_router;
use vidfeed_api::state::AppState;
use vidfeed_ingest::{AuraHubClient, ImageHost, ImgbbClient, IngestionBackend};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vidfeed_api=debug,vidfeed_ingest=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vidfeed_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vidfeed_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    vidfeed_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let http = reqwest::Client::new();
    let ingestion: Arc<dyn IngestionBackend> = Arc::new(AuraHubClient::with_client(
        http,
        config.ingest.api_url.clone(),
    ));
    tracing::info!(api_url = %config.ingest.api_url, "Ingestion client ready");

    let image_host: Option<Arc<dyn ImageHost>> = match &config.ingest.image_host_api_key {
        Some(key) => Some(Arc::new(ImgbbClient::new(
            config.ingest.image_host_url.clone(),
            key.clone(),
        ))),
        None => {
            tracing::warn!("IMAGE_HOST_API_KEY not set, thumbnails will be dropped");
            None
        }
    };

    // --- App state ---
    let state = AppState::new(pool, config.clone(), ingestion, image_host);
    let remote_jobs = Arc::clone(&state.remote_jobs);

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    let active = remote_jobs.active_count().await;
    tracing::info!(active, "Server stopped accepting connections, cancelling remote jobs");
    remote_jobs.shutdown();

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
