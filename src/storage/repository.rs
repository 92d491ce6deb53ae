//! Demo account repository.
//!
//! A single ad-hoc table created on first write; insert and select only.

use crate::domain::Account;
use crate::errors::{Error, Result};
use crate::storage::pool::{DbPool, PoolHandle};
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL error code for "relation does not exist"
const UNDEFINED_TABLE: &str = "42P01";

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    balance DOUBLE PRECISION NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Repository for the demo `accounts` table
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PoolHandle,
}

impl AccountRepository {
    /// Create a new repository over the shared pool handle
    pub fn new(pool: PoolHandle) -> Self {
        Self { pool }
    }

    async fn pool(&self) -> Result<DbPool> {
        self.pool
            .get()
            .await
            .ok_or_else(|| Error::unavailable("database pool not initialized"))
    }

    /// Create the accounts table if it does not exist yet
    async fn ensure_schema(&self, pool: &DbPool) -> Result<()> {
        sqlx::query(CREATE_ACCOUNTS_TABLE).execute(pool).await.map_err(|e| Error::Database {
            source: e,
            context: "Failed to create accounts table".to_string(),
        })?;
        Ok(())
    }

    /// Insert a new account, creating the table on first write
    pub async fn create(&self, name: &str, balance: f64) -> Result<Account> {
        let pool = self.pool().await?;
        self.ensure_schema(&pool).await?;

        let id = Uuid::new_v4();
        debug!(account_id = %id, name = %name, "Inserting account");

        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, name, balance) VALUES ($1, $2, $3) \
             RETURNING id, name, balance, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(balance)
        .fetch_one(&pool)
        .await
        .map_err(|e| Error::Database {
            source: e,
            context: "Failed to insert account".to_string(),
        })?;

        Ok(account)
    }

    /// List all accounts, newest first.
    ///
    /// Before the first write the table does not exist; that reads as an
    /// empty list rather than an error.
    pub async fn list(&self) -> Result<Vec<Account>> {
        let pool = self.pool().await?;

        let result = sqlx::query_as::<_, Account>(
            "SELECT id, name, balance, created_at FROM accounts ORDER BY created_at DESC",
        )
        .fetch_all(&pool)
        .await;

        match result {
            Ok(accounts) => Ok(accounts),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.code().map(|code| code.as_ref() == UNDEFINED_TABLE).unwrap_or(false) {
                        return Ok(Vec::new());
                    }
                }
                Err(Error::Database { source: e, context: "Failed to list accounts".to_string() })
            }
        }
    }
}
