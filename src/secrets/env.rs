//! Environment variable secret source.
//!
//! Reads the `DB_*` variables directly from the process environment.
//! Intended for development and testing; environment variables are visible
//! in process listings and offer no rotation or audit trail.

use async_trait::async_trait;
use std::env;

use super::{Result, SecretSource, SecretSourceKind, SecretsError};
use crate::domain::DbCredentials;

/// Environment variable secret source (development default).
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource {
    // No internal state needed - reads directly from env
}

impl EnvSecretSource {
    /// Creates a new environment variable secret source.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve the credential fields from the environment, falling back to the
/// demo defaults for anything unset. `DB_USER` is accepted as a legacy
/// alias for `DB_USERNAME`.
pub(crate) fn credentials_from_env() -> Result<DbCredentials> {
    let defaults = DbCredentials::default();

    let port = match env::var("DB_PORT") {
        Ok(raw) => raw.parse::<u16>().map_err(|_| {
            SecretsError::invalid_value(format!("DB_PORT '{}' is not a valid port number", raw))
        })?,
        Err(_) => defaults.port,
    };

    Ok(DbCredentials {
        host: env::var("DB_HOST").unwrap_or(defaults.host),
        port,
        database: env::var("DB_NAME").unwrap_or(defaults.database),
        username: env::var("DB_USERNAME")
            .or_else(|_| env::var("DB_USER"))
            .unwrap_or(defaults.username),
        password: env::var("DB_PASSWORD").unwrap_or(defaults.password),
        lease: None,
    })
}

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch_credentials(&self) -> Result<DbCredentials> {
        credentials_from_env()
    }

    fn kind(&self) -> SecretSourceKind {
        SecretSourceKind::Env
    }

    async fn health_check(&self) -> Result<()> {
        // The process environment is always available
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global, so the set/fetch/unset cycle
    // lives in a single test to avoid interference between parallel tests.
    #[tokio::test]
    async fn test_fetch_credentials_from_env() {
        let _guard = crate::secrets::test_support::env_guard();
        env::set_var("DB_HOST", "db.test");
        env::set_var("DB_PORT", "5544");
        env::set_var("DB_NAME", "testdb");
        env::set_var("DB_USERNAME", "tester");
        env::set_var("DB_PASSWORD", "secret");

        let source = EnvSecretSource::new();
        let creds = source.fetch_credentials().await.unwrap();
        assert_eq!(creds.host, "db.test");
        assert_eq!(creds.port, 5544);
        assert_eq!(creds.database, "testdb");
        assert_eq!(creds.username, "tester");
        assert_eq!(creds.password, "secret");

        env::set_var("DB_PORT", "not-a-port");
        let err = source.fetch_credentials().await.unwrap_err();
        assert!(matches!(err, SecretsError::InvalidValue { .. }));

        for var in ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USERNAME", "DB_PASSWORD"] {
            env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_health_check_always_ok() {
        let source = EnvSecretSource::new();
        assert!(source.health_check().await.is_ok());
    }

    #[test]
    fn test_kind() {
        assert_eq!(EnvSecretSource::new().kind(), SecretSourceKind::Env);
    }
}
