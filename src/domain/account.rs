//! Demo account record stored in the ad-hoc `accounts` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A demo account row.
///
/// The table is created on first write; there is no further domain logic
/// beyond insert and select.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_serialization() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
            balance: 42.5,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["name"], "alice");
        assert_eq!(json["balance"], 42.5);
        assert!(json["id"].is_string());
        assert!(json["created_at"].is_string());
    }
}
