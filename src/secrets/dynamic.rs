//! Vault database secrets engine source (dynamic credentials).
//!
//! Each fetch asks Vault to mint a short-lived database user via
//! `GET /v1/{mount}/creds/{role}`. The response carries a lease id and TTL,
//! which are recorded on the credentials for reporting; the demo does not
//! renew or revoke leases.
//!
//! vaultrs does not cover the database engine's `creds` endpoint, so this
//! source talks to the Vault HTTP API directly.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::env::credentials_from_env;
use super::{Result, SecretSource, SecretSourceKind, SecretsError};
use crate::config::SecretsConfig;
use crate::domain::{CredentialLease, DbCredentials};

/// Dynamic credentials source backed by Vault's database secrets engine.
pub struct VaultDynamicSource {
    http: reqwest::Client,
    address: String,
    token: String,
    namespace: Option<String>,
    mount: String,
    role: String,
}

impl std::fmt::Debug for VaultDynamicSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultDynamicSource")
            .field("address", &self.address)
            .field("mount", &self.mount)
            .field("role", &self.role)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredsResponse {
    lease_id: String,
    lease_duration: u64,
    data: CredsData,
}

#[derive(Debug, Deserialize)]
struct CredsData {
    username: String,
    password: String,
}

impl VaultDynamicSource {
    /// Build the source from the secrets configuration.
    ///
    /// Requires `VAULT_ADDR` and `VAULT_TOKEN`.
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        let address = config.vault_addr.clone().ok_or_else(|| {
            SecretsError::config_error("VAULT_ADDR is required for the vault-dynamic secret source")
        })?;
        let token = config.vault_token.clone().ok_or_else(|| {
            SecretsError::config_error(
                "VAULT_TOKEN is required for the vault-dynamic secret source",
            )
        })?;

        let http = reqwest::Client::builder().build().map_err(|e| {
            SecretsError::config_error(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            address = %address,
            db_mount = %config.vault_db_mount,
            role = %config.vault_db_role,
            "Initialized Vault dynamic secret source"
        );

        Ok(Self {
            http,
            address: address.trim_end_matches('/').to_string(),
            token,
            namespace: config.vault_namespace.clone(),
            mount: config.vault_db_mount.clone(),
            role: config.vault_db_role.clone(),
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url).header("X-Vault-Token", &self.token);
        if let Some(ref namespace) = self.namespace {
            req = req.header("X-Vault-Namespace", namespace);
        }
        req
    }
}

#[async_trait]
impl SecretSource for VaultDynamicSource {
    async fn fetch_credentials(&self) -> Result<DbCredentials> {
        let url = format!("{}/v1/{}/creds/{}", self.address, self.mount, self.role);
        debug!(db_mount = %self.mount, role = %self.role, "Requesting dynamic credentials from Vault");

        let response = self.request(&url).send().await.map_err(|e| {
            SecretsError::backend_error(format!("Vault request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, role = %self.role, "Vault refused to issue credentials");
            return Err(SecretsError::backend_error(format!(
                "Vault creds request failed with status {}: {}",
                status, body
            )));
        }

        let creds: CredsResponse = response.json().await.map_err(|e| {
            SecretsError::invalid_value(format!("Failed to parse Vault creds response: {}", e))
        })?;

        debug!(
            lease_id = %creds.lease_id,
            lease_duration = creds.lease_duration,
            "Received dynamic database credentials"
        );

        // Host, port and database name still come from the environment; only
        // the user is minted per lease.
        let base = credentials_from_env()?;
        Ok(DbCredentials {
            username: creds.data.username,
            password: creds.data.password,
            lease: Some(CredentialLease {
                lease_id: creds.lease_id,
                lease_duration_seconds: creds.lease_duration,
            }),
            ..base
        })
    }

    fn kind(&self) -> SecretSourceKind {
        SecretSourceKind::VaultDynamic
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/v1/sys/health", self.address);
        // Vault reports sealed/standby states via non-2xx codes; any answer
        // means the server is reachable.
        self.request(&url).send().await.map_err(|e| {
            SecretsError::backend_error(format!("Vault health check failed: {}", e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_address_and_token() {
        let config = SecretsConfig { vault_addr: None, ..SecretsConfig::default() };
        assert!(VaultDynamicSource::from_config(&config).is_err());

        let config = SecretsConfig {
            vault_addr: Some("http://127.0.0.1:8200".to_string()),
            vault_token: None,
            ..SecretsConfig::default()
        };
        let err = VaultDynamicSource::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("VAULT_TOKEN"));
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let config = SecretsConfig {
            vault_addr: Some("http://127.0.0.1:8200/".to_string()),
            vault_token: Some("root".to_string()),
            ..SecretsConfig::default()
        };
        let source = VaultDynamicSource::from_config(&config).unwrap();
        assert_eq!(source.address, "http://127.0.0.1:8200");
        assert_eq!(source.kind(), SecretSourceKind::VaultDynamic);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SecretsConfig {
            vault_addr: Some("http://127.0.0.1:8200".to_string()),
            vault_token: Some("s.supersecret".to_string()),
            ..SecretsConfig::default()
        };
        let source = VaultDynamicSource::from_config(&config).unwrap();
        let output = format!("{:?}", source);
        assert!(!output.contains("supersecret"));
    }

    #[test]
    fn test_creds_response_parsing() {
        let body = r#"{
            "request_id": "abc",
            "lease_id": "database/creds/app/xyz",
            "lease_duration": 3600,
            "renewable": true,
            "data": {"username": "v-app-1234", "password": "pw"}
        }"#;
        let creds: CredsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(creds.lease_id, "database/creds/app/xyz");
        assert_eq!(creds.lease_duration, 3600);
        assert_eq!(creds.data.username, "v-app-1234");
    }
}
