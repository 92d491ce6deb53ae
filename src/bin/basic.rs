//! Minimal variant of the demo service.
//!
//! Resolves database credentials from environment variables and mounted
//! secret files only, opens a pool once at startup and serves the probe
//! endpoints plus a small index page. No secret manager, no refresh.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use credpool::{
    config::{DatabaseConfig, ObservabilityConfig, ServerConfig},
    errors::Error,
    observability::init_logging,
    secrets::{FileSecretSource, SecretSource},
    storage::{create_pool, PoolHandle},
    Result, APP_NAME, VERSION,
};

#[derive(Clone)]
struct BasicState {
    pool: PoolHandle,
    db_host: String,
    db_name: String,
}

#[derive(Serialize)]
struct IndexResponse {
    app: &'static str,
    db_host: String,
    db_name: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

async fn index_handler(State(state): State<Arc<BasicState>>) -> Json<IndexResponse> {
    Json(IndexResponse { app: APP_NAME, db_host: state.db_host.clone(), db_name: state.db_name.clone() })
}

async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

async fn ready_handler(State(state): State<Arc<BasicState>>) -> (StatusCode, Json<StatusResponse>) {
    match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse { status: "ready" })),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(StatusResponse { status: "not ready" }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    init_logging(&ObservabilityConfig::from_env());
    info!(app_name = APP_NAME, version = VERSION, "Starting credpool basic demo service");

    let source = FileSecretSource::new(credpool::secrets::file::default_mount_dirs());
    let credentials = source.fetch_credentials().await.map_err(Error::from)?;

    let pool = PoolHandle::new();
    match create_pool(&DatabaseConfig::from_env(), &credentials).await {
        Ok(created) => pool.replace(created).await,
        Err(e) => error!(error = %e, "Database connection failed, serving in degraded mode"),
    }

    let state = Arc::new(BasicState {
        pool,
        db_host: credentials.host.clone(),
        db_name: credentials.database.clone(),
    });

    let router = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state);

    let server_config = ServerConfig::from_env()?;
    let addr = server_config
        .bind_address()
        .parse::<std::net::SocketAddr>()
        .map_err(|e| Error::config(format!("Invalid bind address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::internal(format!("Failed to bind server: {}", e)))?;

    info!(address = %addr, "Starting HTTP server");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

    Ok(())
}
