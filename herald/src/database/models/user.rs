//! Recipient store models.
//!
//! The `users` table belongs to the platform's user module. Herald only reads
//! it to resolve audiences and to check notification owners.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::database::time::now_ms;

/// User database model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserDbModel {
    pub id: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// JSON array of roles (e.g., ["client"])
    pub roles: String,
    /// Unix epoch milliseconds (UTC) when the user was created.
    pub created_at: i64,
}

impl UserDbModel {
    pub fn new(
        email: Option<&str>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        roles: &[&str],
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.map(str::to_string),
            first_name: first_name.into(),
            last_name: last_name.into(),
            roles: serde_json::to_string(roles).unwrap_or_else(|_| "[]".to_string()),
            created_at: now_ms(),
        }
    }

    /// Get the roles as a Vec<String>.
    pub fn get_roles(&self) -> Vec<String> {
        serde_json::from_str(&self.roles).unwrap_or_else(|e| {
            warn!(user_id = %self.id, error = %e, "Invalid user roles JSON; treating as empty");
            Vec::new()
        })
    }
}

/// Client profile row, present for users that are clients.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClientProfileDbModel {
    pub id: String,
    pub user_id: String,
    pub company_name: Option<String>,
    pub created_at: i64,
}

impl ClientProfileDbModel {
    pub fn new(user_id: impl Into<String>, company_name: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            company_name: company_name.map(str::to_string),
            created_at: now_ms(),
        }
    }
}

/// Employee profile row, present for users that are employees.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmployeeProfileDbModel {
    pub id: String,
    pub user_id: String,
    pub position: Option<String>,
    pub created_at: i64,
}

impl EmployeeProfileDbModel {
    pub fn new(user_id: impl Into<String>, position: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            position: position.map(str::to_string),
            created_at: now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_round_trip() {
        let user = UserDbModel::new(Some("a@example.com"), "Ada", "L", &["client", "admin"]);
        assert_eq!(user.get_roles(), vec!["client", "admin"]);
    }

    #[test]
    fn test_invalid_roles_json() {
        let mut user = UserDbModel::new(None, "Bob", "B", &[]);
        user.roles = "not json".to_string();
        assert!(user.get_roles().is_empty());
    }
}
