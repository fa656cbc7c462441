//! Axum HTTP server for the REST API

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::ServingCache;
use crate::{Error, Result};

use super::handlers;

/// State shared by the HTTP handlers
#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<dyn ServingCache>,
    /// Set once the controller is running
    pub ready: Arc<AtomicBool>,
}

pub(super) fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/api/v1/cache/{node_id}", get(handlers::get_cache_snapshot))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the REST API server
pub async fn run_server(state: ApiState, port: u16) -> Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("REST API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::ConfigError(format!("Server error: {}", e)))?;

    Ok(())
}
