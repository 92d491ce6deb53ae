//! # Credpool
//!
//! Demo web services that obtain database credentials from pluggable
//! secret backends (environment variables, mounted files, Vault KV,
//! Vault dynamic database credentials, AWS Secrets Manager) and serve a
//! small accounts API over a pooled PostgreSQL connection.
//!
//! ## Architecture
//!
//! - `secrets`: pluggable credential sources behind the [`secrets::SecretSource`] trait
//! - `storage`: sqlx pool lifecycle and the demo account repository
//! - `services`: the secret manager tying fetches to pool swaps
//! - `api`: axum handlers, router and server startup
//! - `config`: environment-driven configuration
//! - `observability`: tracing setup and Prometheus metrics

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "credpool");
    }
}
