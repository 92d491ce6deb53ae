//! Secret introspection, refresh and metrics endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{error, info};

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::services::SecretInfo;

/// Response for a manual secret refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub refresh_count: u64,
}

/// `GET /api/v1/secret-info`
///
/// Non-sensitive view of the active secret source and connection identity.
pub async fn secret_info_handler(State(state): State<ApiState>) -> Json<SecretInfo> {
    Json(state.manager.secret_info().await)
}

/// `POST /api/v1/refresh-secrets`
///
/// Re-fetches credentials and rebuilds the pool on demand.
pub async fn refresh_secrets_handler(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<RefreshResponse>), ApiError> {
    match state.manager.refresh().await {
        Ok(refresh_count) => {
            info!(refresh_count, "Manual secret refresh completed");
            Ok((StatusCode::OK, Json(RefreshResponse { refreshed: true, refresh_count })))
        }
        Err(e) => {
            error!(error = %e, "Manual secret refresh failed");
            Err(e.into())
        }
    }
}

/// `GET /metrics`
///
/// Prometheus exposition text.
pub async fn metrics_handler(State(state): State<ApiState>) -> String {
    state.metrics.render()
}
