use std::sync::Arc;

use credpool::{
    api::{start_api_server, ApiState},
    observability::init_observability,
    secrets,
    services::SecretManager,
    AppConfig, Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env()?;
    config.validate()?;

    let metrics_handle = init_observability(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting credpool managed demo service");

    let source = secrets::from_config(&config.secrets).await?;
    info!(source = %source.kind(), "Secret source configured");

    let manager = Arc::new(SecretManager::new(source, config.database.clone()));

    // Startup continues on a failed first fetch; /health stays green and
    // /ready reports the broken database until a refresh succeeds.
    if let Err(e) = manager.initialize().await {
        error!(error = %e, "Initial credential fetch or pool creation failed");
    }

    let _refresh_task = manager.spawn_refresh_task(config.secrets.refresh_interval_seconds);

    let state = ApiState { manager, metrics: metrics_handle };
    start_api_server(&config.server, state).await?;

    info!("Service shutdown completed");
    Ok(())
}
