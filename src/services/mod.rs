//! Application services wiring secret sources to the storage layer.

pub mod secret_manager;

pub use secret_manager::{SecretInfo, SecretManager};
