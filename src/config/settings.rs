//! # Configuration Settings
//!
//! Defines the configuration structure for the credpool demo services.
//! Every section loads from environment variables with sensible demo
//! defaults; a `.env` file is honored when present (loaded in main).

use crate::errors::{Error, Result};
use crate::secrets::{file::default_mount_dirs, SecretSourceKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database pool configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Secret source configuration
    pub secrets: SecretsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load the entire configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            secrets: SecretsConfig::from_env()?,
            observability: ObservabilityConfig::from_env(),
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(Error::validation(
                "min_connections cannot be greater than max_connections",
            ));
        }

        // Fail fast on source settings that would only surface on first fetch
        match self.secrets.source {
            SecretSourceKind::Vault if self.secrets.vault_addr.is_none() => {
                Err(Error::validation("SECRET_SOURCE=vault requires VAULT_ADDR"))
            }
            SecretSourceKind::VaultDynamic
                if self.secrets.vault_addr.is_none() || self.secrets.vault_token.is_none() =>
            {
                Err(Error::validation(
                    "SECRET_SOURCE=vault-dynamic requires VAULT_ADDR and VAULT_TOKEN",
                ))
            }
            SecretSourceKind::Aws if self.secrets.aws_secret_name.is_none() => {
                Err(Error::validation("SECRET_SOURCE=aws requires AWS_SECRET_NAME"))
            }
            _ => Ok(()),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Create ServerConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("HTTP_HOST").unwrap_or(defaults.host);
        let port = match std::env::var("HTTP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::config(format!("Invalid HTTP_PORT: {}", raw)))?,
            Err(_) => defaults.port,
        };

        Ok(Self { host, port })
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database pool configuration.
///
/// Connection credentials are not configured here; they come from the
/// selected secret source.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[validate(range(min = 1, max = 60, message = "Connect timeout must be between 1 and 60 seconds"))]
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { max_connections: 10, min_connections: 1, connect_timeout_seconds: 10 }
    }
}

impl DatabaseConfig {
    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_connections);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.min_connections);

        let connect_timeout_seconds = std::env::var("DB_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.connect_timeout_seconds);

        Self { max_connections, min_connections, connect_timeout_seconds }
    }

    /// Get connection acquire timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Secret source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Which backend resolves the database credentials
    pub source: SecretSourceKind,

    /// Background refresh interval in seconds (0 disables the ticker)
    pub refresh_interval_seconds: u64,

    /// Directories scanned by the file source, in order
    pub mount_paths: Vec<PathBuf>,

    /// AWS Secrets Manager secret name
    pub aws_secret_name: Option<String>,

    /// AWS region override
    pub aws_region: Option<String>,

    /// Vault server address
    pub vault_addr: Option<String>,

    /// Vault authentication token
    pub vault_token: Option<String>,

    /// Vault namespace (Enterprise)
    pub vault_namespace: Option<String>,

    /// KV v2 mount path
    pub vault_kv_mount: String,

    /// Path of the credential secret within the KV mount
    pub vault_secret_path: String,

    /// Database secrets engine mount path
    pub vault_db_mount: String,

    /// Database secrets engine role name
    pub vault_db_role: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            source: SecretSourceKind::Env,
            refresh_interval_seconds: 0,
            mount_paths: default_mount_dirs(),
            aws_secret_name: None,
            aws_region: None,
            vault_addr: None,
            vault_token: None,
            vault_namespace: None,
            vault_kv_mount: "secret".to_string(),
            vault_secret_path: "database/appdb".to_string(),
            vault_db_mount: "database".to_string(),
            vault_db_role: "app".to_string(),
        }
    }
}

impl SecretsConfig {
    /// Create SecretsConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let source = match std::env::var("SECRET_SOURCE") {
            Ok(raw) => raw.parse::<SecretSourceKind>()?,
            Err(_) => defaults.source,
        };

        let refresh_interval_seconds = std::env::var("SECRET_REFRESH_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.refresh_interval_seconds);

        // An explicit mount path is searched before the built-in locations
        let mut mount_paths = defaults.mount_paths;
        if let Ok(extra) = std::env::var("SECRETS_MOUNT_PATH") {
            if !extra.is_empty() {
                mount_paths.insert(0, PathBuf::from(extra));
            }
        }

        Ok(Self {
            source,
            refresh_interval_seconds,
            mount_paths,
            aws_secret_name: std::env::var("AWS_SECRET_NAME").ok(),
            aws_region: std::env::var("AWS_REGION").ok(),
            vault_addr: std::env::var("VAULT_ADDR").ok(),
            vault_token: std::env::var("VAULT_TOKEN").ok(),
            vault_namespace: std::env::var("VAULT_NAMESPACE").ok(),
            vault_kv_mount: std::env::var("VAULT_KV_MOUNT").unwrap_or(defaults.vault_kv_mount),
            vault_secret_path: std::env::var("VAULT_SECRET_PATH")
                .unwrap_or(defaults.vault_secret_path),
            vault_db_mount: std::env::var("VAULT_DB_MOUNT").unwrap_or(defaults.vault_db_mount),
            vault_db_role: std::env::var("VAULT_DB_ROLE").unwrap_or(defaults.vault_db_role),
        })
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter (tracing EnvFilter syntax)
    pub log_level: String,

    /// Service name reported in logs
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), service_name: "credpool".to_string() }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.secrets.source, SecretSourceKind::Env);
    }

    #[test]
    fn test_validate_min_max_connections() {
        let config = AppConfig {
            database: DatabaseConfig {
                max_connections: 5,
                min_connections: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_source_requirements() {
        let config = AppConfig {
            secrets: SecretsConfig { source: SecretSourceKind::Vault, ..Default::default() },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("VAULT_ADDR"));

        let config = AppConfig {
            secrets: SecretsConfig { source: SecretSourceKind::Aws, ..Default::default() },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("AWS_SECRET_NAME"));

        let config = AppConfig {
            secrets: SecretsConfig {
                source: SecretSourceKind::Vault,
                vault_addr: Some("http://127.0.0.1:8200".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let config = AppConfig {
            server: ServerConfig { host: String::new(), port: 8080 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vault_defaults() {
        let secrets = SecretsConfig::default();
        assert_eq!(secrets.vault_kv_mount, "secret");
        assert_eq!(secrets.vault_secret_path, "database/appdb");
        assert_eq!(secrets.vault_db_mount, "database");
        assert_eq!(secrets.vault_db_role, "app");
        assert_eq!(secrets.refresh_interval_seconds, 0);
    }
}
