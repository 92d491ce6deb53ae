//! Demo account endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::domain::Account;
use crate::storage::AccountRepository;

/// Request body for creating an account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Display name, must be non-blank
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: String,
    /// Starting balance, defaults to 0
    pub balance: Option<f64>,
}

/// List response wrapper
#[derive(Debug, Serialize)]
pub struct ListAccountsResponse {
    pub accounts: Vec<Account>,
    pub count: usize,
}

/// `GET /api/v1/accounts`
pub async fn list_accounts_handler(
    State(state): State<ApiState>,
) -> Result<Json<ListAccountsResponse>, ApiError> {
    let repository = AccountRepository::new(state.manager.pool());
    let accounts = repository.list().await?;
    let count = accounts.len();
    Ok(Json(ListAccountsResponse { accounts, count }))
}

/// `POST /api/v1/accounts`
pub async fn create_account_handler(
    State(state): State<ApiState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name must not be empty"));
    }
    payload.validate().map_err(crate::errors::Error::from)?;

    let repository = AccountRepository::new(state.manager.pool());
    let account = repository.create(payload.name.trim(), payload.balance.unwrap_or(0.0)).await?;

    info!(account_id = %account.id, "Account created");
    Ok((StatusCode::CREATED, Json(account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let valid = CreateAccountRequest { name: "alice".to_string(), balance: Some(10.0) };
        assert!(valid.validate().is_ok());

        let empty = CreateAccountRequest { name: String::new(), balance: None };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_create_request_deserializes_without_balance() {
        let request: CreateAccountRequest = serde_json::from_str(r#"{"name":"bob"}"#).unwrap();
        assert_eq!(request.name, "bob");
        assert!(request.balance.is_none());
    }
}
