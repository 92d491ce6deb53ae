//! AWS Secrets Manager secret source.
//!
//! Fetches the secret named by `AWS_SECRET_NAME` and parses its string value
//! as a JSON object holding the credential fields.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::env::credentials_from_env;
use super::{credentials_from_map, Result, SecretSource, SecretSourceKind, SecretsError};
use crate::config::SecretsConfig;
use crate::domain::DbCredentials;

/// AWS Secrets Manager secret source.
#[derive(Debug)]
pub struct AwsSecretsManagerSource {
    client: SecretsManagerClient,
    secret_name: String,
}

impl AwsSecretsManagerSource {
    /// Build the source from the secrets configuration.
    ///
    /// Requires `AWS_SECRET_NAME`; the region falls back to `AWS_REGION`
    /// and then to `us-east-1`. Credentials come from the standard AWS
    /// provider chain.
    pub async fn from_config(config: &SecretsConfig) -> Result<Self> {
        let secret_name = config.aws_secret_name.clone().ok_or_else(|| {
            SecretsError::config_error("AWS_SECRET_NAME is required for the aws secret source")
        })?;

        let region = config
            .aws_region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .unwrap_or_else(|| "us-east-1".to_string());

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        let client = SecretsManagerClient::new(&sdk_config);

        info!(secret_name = %secret_name, region = %region, "Initialized AWS Secrets Manager source");

        Ok(Self { client, secret_name })
    }
}

#[async_trait]
impl SecretSource for AwsSecretsManagerSource {
    async fn fetch_credentials(&self) -> Result<DbCredentials> {
        debug!(secret_name = %self.secret_name, "Fetching secret from AWS Secrets Manager");

        let response = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_name)
            .send()
            .await
            .map_err(|e| {
                error!(secret_name = %self.secret_name, error = %e, "GetSecretValue failed");
                SecretsError::backend_error(format!(
                    "Failed to read secret '{}' from AWS Secrets Manager: {}",
                    self.secret_name, e
                ))
            })?;

        let secret_string = response.secret_string().ok_or_else(|| {
            SecretsError::invalid_value(format!(
                "Secret '{}' has no string value",
                self.secret_name
            ))
        })?;

        let data: HashMap<String, serde_json::Value> = serde_json::from_str(secret_string)?;

        credentials_from_map(&data, credentials_from_env()?)
    }

    fn kind(&self) -> SecretSourceKind {
        SecretSourceKind::Aws
    }

    async fn health_check(&self) -> Result<()> {
        self.client.describe_secret().secret_id(&self.secret_name).send().await.map_err(|e| {
            SecretsError::backend_error(format!(
                "AWS Secrets Manager health check failed: {}",
                e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_requires_secret_name() {
        let config = SecretsConfig { aws_secret_name: None, ..SecretsConfig::default() };
        let err = AwsSecretsManagerSource::from_config(&config).await.unwrap_err();
        assert!(matches!(err, SecretsError::ConfigError { .. }));
        assert!(err.to_string().contains("AWS_SECRET_NAME"));
    }

    #[tokio::test]
    async fn test_from_config_builds_client() {
        let config = SecretsConfig {
            aws_secret_name: Some("prod/appdb/credentials".to_string()),
            aws_region: Some("eu-west-1".to_string()),
            ..SecretsConfig::default()
        };
        let source = AwsSecretsManagerSource::from_config(&config).await.unwrap();
        assert_eq!(source.kind(), SecretSourceKind::Aws);
        assert_eq!(source.secret_name, "prod/appdb/credentials");
    }
}
