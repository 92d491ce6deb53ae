//! Health and readiness endpoints for monitoring probes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::routes::ApiState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status (always "ok" when responding)
    pub status: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe.
///
/// Returns 200 OK whenever the process is serving requests, regardless of
/// database state.
pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok".to_string() }))
}

/// Readiness probe.
///
/// Runs `SELECT 1` against the current pool; 503 when the pool is empty or
/// the database is unreachable.
pub async fn ready_handler(State(state): State<ApiState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.manager.pool().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                database: "connected".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not ready".to_string(),
                    database: "disconnected".to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
