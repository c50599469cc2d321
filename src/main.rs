//! WorldVault Engine - Build world life cycle and map import service
//!
//! The Engine is the backend server that:
//! - Creates, loads, unloads and deletes build worlds under one worlds root
//! - Imports maps from a GitHub or GitLab repository, or from a zip URL
//! - Exports worlds as zip archives behind a one-time download link
//! - Serves name suggestions for the command front end

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldvault_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WorldVault Engine");

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Worlds: {}", config.storage.worlds_root.display());
    tracing::info!("  Staging: {}", config.storage.staging_root.display());
    tracing::info!(
        "  Remote: {:?} {}/{} ({})",
        config.remote.provider,
        config.remote.organization,
        config.remote.repository,
        config.remote.effective_api_url()
    );
    if !config.remote.is_remote_configured() {
        tracing::warn!("Remote token not set, remote imports are disabled");
    }

    // Initialize application state and start the world registry
    let port = config.server.port;
    let (state, registry_task) = AppState::new(config).await?;
    let state = Arc::new(state);
    tracing::info!("Application state initialized");

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, unloading worlds...");
        }
    }

    state.registry.shutdown().await;
    if let Err(e) = registry_task.await {
        tracing::error!("World registry stopped abnormally: {}", e);
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
