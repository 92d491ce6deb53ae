//! HashiCorp Vault KV v2 secret source.
//!
//! Reads a single KV v2 entry holding the database credential fields, e.g.
//!
//! ```json
//! {
//!   "host": "db.internal",
//!   "port": 5432,
//!   "database": "appdb",
//!   "username": "app",
//!   "password": "..."
//! }
//! ```
//!
//! Fields missing from the Vault entry fall back to the `DB_*` environment
//! variables, so a deployment can keep only the password in Vault.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, error, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

use super::env::credentials_from_env;
use super::{credentials_from_map, Result, SecretSource, SecretSourceKind, SecretsError};
use crate::config::SecretsConfig;
use crate::domain::DbCredentials;

/// Vault KV v2 secret source.
pub struct VaultKvSource {
    client: VaultClient,
    mount: String,
    path: String,
}

impl std::fmt::Debug for VaultKvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKvSource")
            .field("mount", &self.mount)
            .field("path", &self.path)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultKvSource {
    /// Build the source from the secrets configuration.
    ///
    /// Requires `VAULT_ADDR`; the token and namespace are optional (agent
    /// auth may inject the token out of band).
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        let address = config.vault_addr.as_deref().ok_or_else(|| {
            SecretsError::config_error("VAULT_ADDR is required for the vault secret source")
        })?;

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(address);

        if let Some(ref token) = config.vault_token {
            settings_builder.token(token);
        }

        if let Some(ref namespace) = config.vault_namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder
            .build()
            .map_err(|e| SecretsError::config_error(format!("Invalid Vault settings: {}", e)))?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::config_error(format!("Failed to create Vault client: {}", e))
        })?;

        info!(
            address = %address,
            kv_mount = %config.vault_kv_mount,
            secret_path = %config.vault_secret_path,
            "Initialized Vault KV secret source"
        );

        Ok(Self {
            client,
            mount: config.vault_kv_mount.clone(),
            path: config.vault_secret_path.clone(),
        })
    }
}

#[async_trait]
impl SecretSource for VaultKvSource {
    async fn fetch_credentials(&self) -> Result<DbCredentials> {
        debug!(kv_mount = %self.mount, path = %self.path, "Fetching credentials from Vault KV");

        let data: HashMap<String, serde_json::Value> =
            kv2::read(&self.client, &self.mount, &self.path).await.map_err(|e| {
                error!(path = %self.path, error = %e, "Failed to read secret from Vault");
                SecretsError::not_found(format!(
                    "Secret '{}' not found in Vault: {}",
                    self.path, e
                ))
            })?;

        credentials_from_map(&data, credentials_from_env()?)
    }

    fn kind(&self) -> SecretSourceKind {
        SecretSourceKind::Vault
    }

    async fn health_check(&self) -> Result<()> {
        vaultrs::sys::health(&self.client)
            .await
            .map_err(|e| SecretsError::backend_error(format!("Vault health check failed: {}", e)))?;
        Ok(())
    }
}
