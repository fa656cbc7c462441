//! HTTP handlers for the REST API

use std::sync::atomic::Ordering;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, instrument};

use super::dto::{CacheSnapshotResponse, ErrorResponse, HealthResponse};
use super::server::ApiState;

/// Liveness probe
#[instrument]
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe, failing until the controller has started
#[instrument(skip(state))]
pub async fn readyz(
    State(state): State<ApiState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !state.ready.load(Ordering::SeqCst) {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(
                "not_ready",
                "controller has not started yet",
            )),
        ));
    }

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Get what the serving cache holds for a node
#[instrument(skip(state), fields(node_id = %node_id))]
pub async fn get_cache_snapshot(
    State(state): State<ApiState>,
    Path(node_id): Path<String>,
) -> Result<Json<CacheSnapshotResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.cache.snapshot(&node_id).await {
        Some(snapshot) => Ok(Json(CacheSnapshotResponse::from_snapshot(
            &node_id, &snapshot,
        ))),
        None => {
            debug!("No resources cached for node {}", node_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    "not_found",
                    &format!("No resources cached for node {}", node_id),
                )),
            ))
        }
    }
}
