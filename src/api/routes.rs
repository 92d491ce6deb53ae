use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::observability::track_http_metrics;
use crate::services::SecretManager;

use super::handlers::{
    create_account_handler, health_handler, list_accounts_handler, metrics_handler,
    ready_handler, refresh_secrets_handler, secret_info_handler,
};

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<SecretManager>,
    pub metrics: PrometheusHandle,
}

/// Build the application router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/v1/accounts", get(list_accounts_handler).post(create_account_handler))
        .route("/api/v1/secret-info", get(secret_info_handler))
        .route("/api/v1/refresh-secrets", post(refresh_secrets_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
