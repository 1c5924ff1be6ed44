//! # llmdash-server
//!
//! HTTP API for the usage dashboard. Every endpoint is a side-effect-free
//! `GET` returning JSON with a `success` flag.

pub mod handlers;
mod router;
pub mod types;

use llmdash_config::DashboardConfig;
use llmdash_core::{DashError, Result};
use tracing::{info, warn};

pub use router::{AppState, create_router};

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &DashboardConfig) -> Result<()> {
    let app = create_router(AppState::from_config(config), config.server.cors);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| DashError::ServerBind {
            addr: addr.clone(),
            source,
        })?;

    if !config.store.path.exists() {
        warn!(path = %config.store.path.display(), "Log database not found, API will report it unavailable");
    }
    info!(
        %addr,
        store = %config.store.path.display(),
        cors = config.server.cors,
        "Dashboard listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DashError::Server {
            message: e.to_string(),
        })?;

    info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
