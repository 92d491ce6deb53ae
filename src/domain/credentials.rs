//! Database credential record produced by the secret sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lease metadata attached to credentials minted by a dynamic-secrets engine.
///
/// The TTL is recorded for reporting only; nothing in the demo schedules
/// renewal off it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialLease {
    /// Vault lease identifier
    pub lease_id: String,
    /// Lease time-to-live in seconds
    pub lease_duration_seconds: u64,
}

/// Connection parameters for the demo database.
///
/// Every secret source resolves to this record. The password is redacted
/// from `Debug` output so credentials never leak into logs.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct DbCredentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<CredentialLease>,
}

impl Default for DbCredentials {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "appdb".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            lease: None,
        }
    }
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("lease", &self.lease)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let creds = DbCredentials::default();
        assert_eq!(creds.host, "localhost");
        assert_eq!(creds.port, 5432);
        assert_eq!(creds.database, "appdb");
        assert_eq!(creds.username, "postgres");
        assert!(creds.password.is_empty());
        assert!(creds.lease.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = DbCredentials { password: "super-secret".to_string(), ..Default::default() };
        let output = format!("{:?}", creds);
        assert!(!output.contains("super-secret"));
        assert!(output.contains("***"));
    }

    #[test]
    fn test_serialization_skips_missing_lease() {
        let creds = DbCredentials::default();
        let json = serde_json::to_value(&creds).unwrap();
        assert!(json.get("lease").is_none());

        let with_lease = DbCredentials {
            lease: Some(CredentialLease {
                lease_id: "database/creds/app/abc".to_string(),
                lease_duration_seconds: 3600,
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&with_lease).unwrap();
        assert_eq!(json["lease"]["lease_duration_seconds"], 3600);
    }
}
