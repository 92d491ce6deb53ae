//! # Database Connection Pool Management
//!
//! Creates sqlx PostgreSQL pools from resolved credentials and holds the
//! current pool behind a swappable handle so a secret refresh can replace
//! it without restarting the service.

use crate::config::DatabaseConfig;
use crate::domain::DbCredentials;
use crate::errors::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Type alias for the database connection pool
pub type DbPool = Pool<Postgres>;

/// Create a database connection pool from the given credentials.
///
/// Connection parameters are passed as structured options rather than a URL
/// so the password never appears in a loggable string.
pub async fn create_pool(config: &DatabaseConfig, credentials: &DbCredentials) -> Result<DbPool> {
    validate_config(config)?;

    let connect_options = PgConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .database(&credentials.database)
        .username(&credentials.username)
        .password(&credentials.password);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                host = %credentials.host,
                port = credentials.port,
                database = %credentials.database,
                username = %credentials.username,
                "Failed to create database pool"
            );
            Error::Database {
                source: e,
                context: format!(
                    "Failed to connect to database {}@{}:{}/{}",
                    credentials.username, credentials.host, credentials.port, credentials.database
                ),
            }
        })?;

    tracing::info!(
        host = %credentials.host,
        port = credentials.port,
        database = %credentials.database,
        username = %credentials.username,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Validate database pool configuration
fn validate_config(config: &DatabaseConfig) -> Result<()> {
    if config.max_connections == 0 {
        return Err(Error::validation("max_connections must be greater than 0"));
    }

    if config.min_connections > config.max_connections {
        return Err(Error::validation("min_connections cannot be greater than max_connections"));
    }

    Ok(())
}

/// Shared, swappable handle to the current database pool.
///
/// The handle starts empty; a service that fails to connect at startup
/// still serves `/health` and reports not-ready until a refresh succeeds.
#[derive(Debug, Clone, Default)]
pub struct PoolHandle {
    inner: Arc<RwLock<Option<DbPool>>>,
}

impl PoolHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current pool, if one has been installed
    pub async fn get(&self) -> Option<DbPool> {
        self.inner.read().await.clone()
    }

    /// Install a new pool and close the previous one.
    ///
    /// In-flight queries on the old pool complete before it shuts down;
    /// new acquisitions go to the replacement.
    pub async fn replace(&self, pool: DbPool) {
        let previous = {
            let mut guard = self.inner.write().await;
            guard.replace(pool)
        };

        if let Some(old) = previous {
            tracing::info!("Closing previous database pool after credential refresh");
            old.close().await;
        }
    }

    /// Readiness probe: acquire a connection and run `SELECT 1`.
    pub async fn ping(&self) -> Result<()> {
        let pool = self
            .get()
            .await
            .ok_or_else(|| Error::unavailable("database pool not initialized"))?;

        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| Error::Database { source: e, context: "Database ping failed".to_string() })?;

        Ok(())
    }

    /// Get pool statistics for monitoring
    pub async fn stats(&self) -> Option<PoolStats> {
        self.get().await.map(|pool| PoolStats { size: pool.size(), idle: pool.num_idle() })
    }
}

/// Pool statistics for monitoring
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total connections in the pool
    pub size: u32,
    /// Number of idle connections
    pub idle: usize,
}

impl PoolStats {
    /// Get the number of active connections
    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_valid() {
        let config = DatabaseConfig { max_connections: 10, min_connections: 2, ..Default::default() };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_config_zero_max() {
        let config = DatabaseConfig { max_connections: 0, ..Default::default() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_min_above_max() {
        let config = DatabaseConfig { max_connections: 5, min_connections: 10, ..Default::default() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_pool_stats_active() {
        let stats = PoolStats { size: 10, idle: 3 };
        assert_eq!(stats.active(), 7);

        let empty = PoolStats { size: 0, idle: 0 };
        assert_eq!(empty.active(), 0);
    }

    #[tokio::test]
    async fn test_empty_handle() {
        let handle = PoolHandle::new();
        assert!(handle.get().await.is_none());
        assert!(handle.stats().await.is_none());

        let err = handle.ping().await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
        assert_eq!(err.status_code(), 503);
    }

    #[cfg(feature = "postgres_tests")]
    #[tokio::test]
    async fn test_create_pool_and_replace() {
        use crate::secrets::{EnvSecretSource, SecretSource};

        let creds = EnvSecretSource::new().fetch_credentials().await.unwrap();
        let config = DatabaseConfig::default();

        let handle = PoolHandle::new();
        handle.replace(create_pool(&config, &creds).await.unwrap()).await;
        handle.ping().await.unwrap();

        // Swapping in a fresh pool keeps the handle usable
        handle.replace(create_pool(&config, &creds).await.unwrap()).await;
        handle.ping().await.unwrap();
    }
}
