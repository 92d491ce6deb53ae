//! File-mounted secret source.
//!
//! Reads per-field credential files mounted into the container, e.g. by a
//! Kubernetes secret volume or a Vault agent sidecar. Each field lives in a
//! file named after the lowercased variable (`/mnt/secrets/db_password`).
//!
//! Lookup order per field matches the original demo script: process
//! environment first, then each mount directory in order, then the built-in
//! default.

use async_trait::async_trait;
use std::env;
use std::path::PathBuf;

use super::{Result, SecretSource, SecretSourceKind, SecretsError};
use crate::domain::DbCredentials;

/// Default directories scanned for mounted secret files.
pub fn default_mount_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/mnt/secrets"), PathBuf::from("/vault/secrets")]
}

/// Secret source backed by files mounted into the container.
#[derive(Debug, Clone)]
pub struct FileSecretSource {
    mount_dirs: Vec<PathBuf>,
}

impl FileSecretSource {
    /// Create a source scanning the given directories in order.
    pub fn new(mount_dirs: Vec<PathBuf>) -> Self {
        Self { mount_dirs }
    }

    /// Resolve one field: env var, then mounted files, then `None`.
    async fn lookup(&self, name: &str) -> Option<String> {
        if let Ok(value) = env::var(name) {
            if !value.is_empty() {
                return Some(value);
            }
        }

        for dir in &self.mount_dirs {
            let path = dir.join(name.to_lowercase());
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => return Some(contents.trim().to_string()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read secret file");
                    continue;
                }
            }
        }

        None
    }
}

#[async_trait]
impl SecretSource for FileSecretSource {
    async fn fetch_credentials(&self) -> Result<DbCredentials> {
        let defaults = DbCredentials::default();

        let port = match self.lookup("DB_PORT").await {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                SecretsError::invalid_value(format!(
                    "DB_PORT '{}' is not a valid port number",
                    raw
                ))
            })?,
            None => defaults.port,
        };

        let username = match self.lookup("DB_USERNAME").await {
            Some(value) => value,
            None => self.lookup("DB_USER").await.unwrap_or(defaults.username),
        };

        Ok(DbCredentials {
            host: self.lookup("DB_HOST").await.unwrap_or(defaults.host),
            port,
            database: self.lookup("DB_NAME").await.unwrap_or(defaults.database),
            username,
            password: self.lookup("DB_PASSWORD").await.unwrap_or(defaults.password),
            lease: None,
        })
    }

    fn kind(&self) -> SecretSourceKind {
        SecretSourceKind::File
    }

    async fn health_check(&self) -> Result<()> {
        // The source is usable as long as at least one mount dir exists;
        // missing files per field fall back to defaults.
        for dir in &self.mount_dirs {
            if tokio::fs::metadata(dir).await.is_ok() {
                return Ok(());
            }
        }
        Err(SecretsError::backend_error(format!(
            "No secret mount directory exists (checked {})",
            self.mount_dirs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_credentials_from_files() {
        let _guard = crate::secrets::test_support::env_guard();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("db_host"), "files.db.test\n").unwrap();
        fs::write(dir.path().join("db_port"), "5599").unwrap();
        fs::write(dir.path().join("db_password"), "  trimmed  \n").unwrap();

        let source = FileSecretSource::new(vec![dir.path().to_path_buf()]);
        let creds = source.fetch_credentials().await.unwrap();

        assert_eq!(creds.host, "files.db.test");
        assert_eq!(creds.port, 5599);
        assert_eq!(creds.password, "trimmed");
        // Fields without a file fall back to defaults
        assert_eq!(creds.database, "appdb");
        assert_eq!(creds.username, "postgres");
    }

    #[tokio::test]
    async fn test_first_mount_dir_wins() {
        let _guard = crate::secrets::test_support::env_guard();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("db_name"), "primary").unwrap();
        fs::write(second.path().join("db_name"), "fallback").unwrap();

        let source =
            FileSecretSource::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        let creds = source.fetch_credentials().await.unwrap();
        assert_eq!(creds.database, "primary");
    }

    #[tokio::test]
    async fn test_invalid_port_file() {
        let _guard = crate::secrets::test_support::env_guard();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("db_port"), "eleventy").unwrap();

        let source = FileSecretSource::new(vec![dir.path().to_path_buf()]);
        let err = source.fetch_credentials().await.unwrap_err();
        assert!(matches!(err, SecretsError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let source = FileSecretSource::new(vec![dir.path().to_path_buf()]);
        assert!(source.health_check().await.is_ok());

        let missing = FileSecretSource::new(vec![PathBuf::from("/definitely/not/here")]);
        assert!(missing.health_check().await.is_err());
    }

    #[test]
    fn test_default_mount_dirs() {
        let dirs = default_mount_dirs();
        assert_eq!(dirs[0], PathBuf::from("/mnt/secrets"));
        assert_eq!(dirs[1], PathBuf::from("/vault/secrets"));
    }
}
