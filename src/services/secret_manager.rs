//! Secret manager: resolves credentials and owns the pool lifecycle.
//!
//! A refresh re-fetches credentials from the configured source, opens a
//! fresh pool, swaps it into the shared handle and closes the old one.
//! Refreshes run on demand (`POST /api/v1/refresh-secrets`) and optionally
//! on a fixed ticker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::domain::DbCredentials;
use crate::errors::Result;
use crate::observability::MetricsRecorder;
use crate::secrets::{SecretSource, SecretSourceKind};
use crate::storage::{create_pool, PoolHandle};

/// Non-sensitive snapshot of the current secret state.
///
/// Returned by `GET /api/v1/secret-info`; never includes the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretInfo {
    /// Active secret source
    pub source: String,
    /// Database host from the last successful fetch
    pub db_host: Option<String>,
    /// Database name from the last successful fetch
    pub db_name: Option<String>,
    /// Database username from the last successful fetch
    pub db_username: Option<String>,
    /// When the pool was last (re)built
    pub last_refresh: Option<DateTime<Utc>>,
    /// Number of successful pool builds since startup
    pub refresh_count: u64,
    /// Lease TTL reported by a dynamic-secrets engine, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_ttl_seconds: Option<u64>,
}

#[derive(Debug, Default)]
struct RefreshState {
    credentials: Option<DbCredentials>,
    last_refresh: Option<DateTime<Utc>>,
    refresh_count: u64,
}

/// Coordinates the secret source and the database pool.
#[derive(Debug)]
pub struct SecretManager {
    source: Arc<dyn SecretSource>,
    db_config: DatabaseConfig,
    pool: PoolHandle,
    metrics: MetricsRecorder,
    state: RwLock<RefreshState>,
}

impl SecretManager {
    /// Create a manager with an empty pool handle
    pub fn new(source: Arc<dyn SecretSource>, db_config: DatabaseConfig) -> Self {
        Self {
            source,
            db_config,
            pool: PoolHandle::new(),
            metrics: MetricsRecorder::new(),
            state: RwLock::new(RefreshState::default()),
        }
    }

    /// Shared handle to the current pool
    pub fn pool(&self) -> PoolHandle {
        self.pool.clone()
    }

    /// The configured secret source kind
    pub fn source_kind(&self) -> SecretSourceKind {
        self.source.kind()
    }

    /// Resolve credentials and build the initial pool.
    ///
    /// Failure is returned to the caller but is not fatal to the service:
    /// main logs it and continues with an empty pool handle, matching the
    /// original demo behavior.
    pub async fn initialize(&self) -> Result<()> {
        self.rebuild_pool().await?;
        info!(source = %self.source.kind(), "Database pool initialized");
        Ok(())
    }

    /// Re-fetch credentials and swap in a fresh pool.
    ///
    /// Returns the new refresh count.
    pub async fn refresh(&self) -> Result<u64> {
        let count = self.rebuild_pool().await?;
        self.metrics.record_secret_refresh(self.source.kind().as_str());
        info!(source = %self.source.kind(), refresh_count = count, "Secrets refreshed");
        Ok(count)
    }

    async fn rebuild_pool(&self) -> Result<u64> {
        let start = Instant::now();
        let fetched = self.source.fetch_credentials().await;
        self.metrics.record_secret_fetch(
            self.source.kind().as_str(),
            fetched.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        let credentials = fetched?;

        // Record the identity even if the pool build fails below, so
        // secret-info reflects what the source returned.
        {
            let mut state = self.state.write().await;
            state.credentials = Some(credentials.clone());
        }

        let pool = create_pool(&self.db_config, &credentials).await?;
        self.pool.replace(pool).await;

        if let Some(stats) = self.pool.stats().await {
            self.metrics.update_pool_connections(stats.size, stats.idle);
        }

        let mut state = self.state.write().await;
        state.last_refresh = Some(Utc::now());
        state.refresh_count += 1;
        Ok(state.refresh_count)
    }

    /// Snapshot of the current secret state for the introspection endpoint
    pub async fn secret_info(&self) -> SecretInfo {
        let state = self.state.read().await;
        SecretInfo {
            source: self.source.kind().to_string(),
            db_host: state.credentials.as_ref().map(|c| c.host.clone()),
            db_name: state.credentials.as_ref().map(|c| c.database.clone()),
            db_username: state.credentials.as_ref().map(|c| c.username.clone()),
            last_refresh: state.last_refresh,
            refresh_count: state.refresh_count,
            lease_ttl_seconds: state
                .credentials
                .as_ref()
                .and_then(|c| c.lease.as_ref())
                .map(|lease| lease.lease_duration_seconds),
        }
    }

    /// Spawn the background refresh ticker.
    ///
    /// Returns `None` when `interval_seconds` is 0 (disabled). Refresh
    /// failures are logged and the ticker keeps going; the existing pool
    /// stays in place.
    pub fn spawn_refresh_task(self: &Arc<Self>, interval_seconds: u64) -> Option<JoinHandle<()>> {
        if interval_seconds == 0 {
            return None;
        }

        let manager = Arc::clone(self);
        info!(interval_seconds, "Starting background secret refresh task");

        Some(tokio::spawn(async move {
            let period = tokio::time::Duration::from_secs(interval_seconds);
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it, initialize() already ran.
            interval.tick().await;
            loop {
                interval.tick().await;
                match manager.refresh().await {
                    Ok(count) => {
                        info!(refresh_count = count, "Background secret refresh completed")
                    }
                    Err(e) => {
                        error!(error = %e, "Background secret refresh failed");
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::EnvSecretSource;

    fn manager() -> Arc<SecretManager> {
        Arc::new(SecretManager::new(
            Arc::new(EnvSecretSource::new()),
            DatabaseConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_secret_info_before_initialization() {
        let manager = manager();
        let info = manager.secret_info().await;
        assert_eq!(info.source, "env");
        assert_eq!(info.refresh_count, 0);
        assert!(info.last_refresh.is_none());
        assert!(info.db_host.is_none());
        assert!(info.lease_ttl_seconds.is_none());
    }

    #[tokio::test]
    async fn test_refresh_task_disabled_for_zero_interval() {
        let manager = manager();
        assert!(manager.spawn_refresh_task(0).is_none());
    }

    #[tokio::test]
    async fn test_secret_info_never_serializes_password() {
        let manager = manager();
        let info = manager.secret_info().await;
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("password"));
    }

    #[cfg(feature = "postgres_tests")]
    #[tokio::test]
    async fn test_initialize_and_refresh() {
        let manager = manager();
        manager.initialize().await.unwrap();

        let info = manager.secret_info().await;
        assert_eq!(info.refresh_count, 1);
        assert!(info.last_refresh.is_some());
        assert!(info.db_host.is_some());

        let count = manager.refresh().await.unwrap();
        assert_eq!(count, 2);
        manager.pool().ping().await.unwrap();
    }
}
