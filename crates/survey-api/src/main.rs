//! # Survey API Server
//!
//! HTTP front end for the survey planning engine: accepts an area of interest,
//! camera and flight parameters, keeps the shared home position and returns
//! coverage routes, battery segments, metrics and QGroundControl mission files.

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use crate::config::ApiConfig;
use crate::routes::create_router;
use crate::state::AppState;

use std::net::SocketAddr;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Starting Survey Planner API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::load()?;
    info!("Configuration loaded");
    info!("   API Port: {}", config.api_port);
    info!("   Default camera: {}", config.default_camera);
    info!("   Leg limit: {}", config.max_legs);
    if let Some(home) = config.default_home {
        info!("   Home: {:.6}, {:.6}", home.latitude, home.longitude);
    }

    let state = AppState::new(config.clone())?;
    let app = create_router(state);
    info!("Routes configured");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("API server listening on http://{}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,survey_api=debug,survey_core=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        }
    }
}
