//! # Configuration Management
//!
//! Environment-driven configuration for the demo services.

mod settings;

pub use settings::{AppConfig, DatabaseConfig, ObservabilityConfig, SecretsConfig, ServerConfig};
