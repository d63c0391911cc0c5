//! Librarium Server binary
//!
//! Wires configuration, the S3 bucket client, the OCR client, and the HTTP
//! router together, then serves until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use librarium_server::config::Config;
use librarium_server::ocr::OcrSpaceClient;
use librarium_server::routes;
use librarium_server::state::AppState;
use librarium_server::storage::BucketClient;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "librarium_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    // Missing credentials is a fatal precondition: refuse to start rather
    // than letting every remote call fail later.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Librarium Server v{}", env!("CARGO_PKG_VERSION"));
    if let Some(endpoint) = &config.storage.endpoint {
        tracing::info!("S3 endpoint: {endpoint}");
    }
    tracing::info!("S3 bucket: {}", config.storage.bucket);

    let store = Arc::new(BucketClient::new(&config.storage));
    let extractor = Arc::new(OcrSpaceClient::new(&config.ocr));

    let state = AppState::new(config.clone(), store, extractor);

    // Initial cache population; a failure here is reported and retried on
    // the next refresh event rather than aborting startup.
    match state.cache().refresh(state.store()).await {
        Ok(report) => {
            state.reconcile_selection().await;
            tracing::info!(
                loaded = report.loaded.len(),
                skipped = report.skipped.len(),
                "Library initialized"
            );
        }
        Err(e) => {
            tracing::warn!("Initial library refresh failed: {e}. Will retry on /api/v1/files/refresh");
        }
    }

    let app = routes::app(state);

    let host = config
        .server
        .host
        .parse()
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("Librarium Server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
    }

    tracing::info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
