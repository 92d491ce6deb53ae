//! Domain types shared across the demo services.

pub mod account;
pub mod credentials;

pub use account::Account;
pub use credentials::{CredentialLease, DbCredentials};
