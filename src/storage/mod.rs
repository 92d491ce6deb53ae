//! # Storage Layer
//!
//! Database pool lifecycle and the demo account repository.

pub mod pool;
pub mod repository;

pub use pool::{create_pool, DbPool, PoolHandle, PoolStats};
pub use repository::AccountRepository;
