//! HTTP request handlers

pub mod accounts;
pub mod health;
pub mod secrets;

pub use accounts::{create_account_handler, list_accounts_handler};
pub use health::{health_handler, ready_handler};
pub use secrets::{metrics_handler, refresh_secrets_handler, secret_info_handler};
