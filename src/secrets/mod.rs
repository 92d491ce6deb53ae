//! Secret source abstraction.
//!
//! Each backend resolves the same thing: a [`DbCredentials`] record used to
//! open the database pool. The backend is selected at startup by the
//! `SECRET_SOURCE` environment variable (a plain string switch) and each
//! implementation is a single call into a third-party client with no retry
//! of its own.

pub mod aws;
pub mod dynamic;
pub mod env;
pub mod error;
pub mod file;
pub mod vault;

pub use aws::AwsSecretsManagerSource;
pub use dynamic::VaultDynamicSource;
pub use env::EnvSecretSource;
pub use error::{Result, SecretsError};
pub use file::FileSecretSource;
pub use vault::VaultKvSource;

use crate::config::SecretsConfig;
use crate::domain::DbCredentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Type of secret source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretSourceKind {
    /// Plain environment variables (development default)
    Env,
    /// Files mounted into the container (Kubernetes secrets, Vault agent)
    File,
    /// HashiCorp Vault KV v2
    Vault,
    /// HashiCorp Vault database secrets engine (dynamic credentials)
    VaultDynamic,
    /// AWS Secrets Manager
    Aws,
}

impl SecretSourceKind {
    /// Get the string representation used by `SECRET_SOURCE`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::File => "file",
            Self::Vault => "vault",
            Self::VaultDynamic => "vault-dynamic",
            Self::Aws => "aws",
        }
    }
}

impl FromStr for SecretSourceKind {
    type Err = SecretsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "file" => Ok(Self::File),
            "vault" => Ok(Self::Vault),
            "vault-dynamic" | "vault_dynamic" => Ok(Self::VaultDynamic),
            "aws" => Ok(Self::Aws),
            _ => Err(SecretsError::config_error(format!(
                "Unknown secret source: {}. Supported: env, file, vault, vault-dynamic, aws",
                s
            ))),
        }
    }
}

impl fmt::Display for SecretSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for secret sources.
///
/// Implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait SecretSource: Send + Sync + fmt::Debug {
    /// Resolve the database credentials from this source.
    async fn fetch_credentials(&self) -> Result<DbCredentials>;

    /// Get the source kind identifier.
    fn kind(&self) -> SecretSourceKind;

    /// Perform a health check on the backend.
    ///
    /// Returns Ok(()) if the backend is reachable, Err otherwise.
    async fn health_check(&self) -> Result<()>;
}

/// Build the secret source selected by the configuration.
///
/// Cloud-backed sources validate their required settings here so a
/// misconfigured deployment fails at startup rather than on first fetch.
pub async fn from_config(config: &SecretsConfig) -> Result<Arc<dyn SecretSource>> {
    let source: Arc<dyn SecretSource> = match config.source {
        SecretSourceKind::Env => Arc::new(EnvSecretSource::new()),
        SecretSourceKind::File => Arc::new(FileSecretSource::new(config.mount_paths.clone())),
        SecretSourceKind::Vault => Arc::new(VaultKvSource::from_config(config)?),
        SecretSourceKind::VaultDynamic => Arc::new(VaultDynamicSource::from_config(config)?),
        SecretSourceKind::Aws => Arc::new(AwsSecretsManagerSource::from_config(config).await?),
    };

    tracing::info!(source = %source.kind(), "Initialized secret source");
    Ok(source)
}

/// Map a key/value secret payload onto [`DbCredentials`].
///
/// Shared by the Vault KV and AWS backends, both of which store the
/// credential record as a JSON object. Accepts the common field aliases
/// seen in the wild (`user`/`username`, `dbname`/`database`) and ports
/// stored as either numbers or strings.
pub(crate) fn credentials_from_map(
    data: &HashMap<String, serde_json::Value>,
    defaults: DbCredentials,
) -> Result<DbCredentials> {
    fn string_field(data: &HashMap<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            data.get(*key).and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        })
    }

    let port = match string_field(data, &["port", "db_port"]) {
        Some(raw) => raw.parse::<u16>().map_err(|_| {
            SecretsError::invalid_value(format!("port '{}' is not a valid port number", raw))
        })?,
        None => defaults.port,
    };

    Ok(DbCredentials {
        host: string_field(data, &["host", "db_host"]).unwrap_or(defaults.host),
        port,
        database: string_field(data, &["database", "dbname", "db_name"])
            .unwrap_or(defaults.database),
        username: string_field(data, &["username", "user", "db_username"])
            .unwrap_or(defaults.username),
        password: string_field(data, &["password", "db_password"]).unwrap_or(defaults.password),
        lease: None,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    // The DB_* variables are process-global; tests that set or depend on
    // them must hold this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
