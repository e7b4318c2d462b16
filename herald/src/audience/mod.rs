//! Audience resolution.
//!
//! Expands an [`AudienceType`] selector into the concrete recipients of a
//! campaign by querying the recipient store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::database::models::{AudienceType, UserDbModel};
use crate::database::repositories::UserRepository;

/// A concrete recipient of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

impl Recipient {
    /// The email address, if present and non-blank.
    pub fn email_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<UserDbModel> for Recipient {
    fn from(user: UserDbModel) -> Self {
        let roles = user.get_roles();
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
        }
    }
}

/// Resolves audience selectors against the recipient store.
pub struct AudienceResolver {
    users: Arc<dyn UserRepository>,
}

impl AudienceResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Resolve the recipients for an audience selector.
    ///
    /// An empty result is valid and is returned as an empty list.
    pub async fn resolve(&self, audience: AudienceType) -> Result<Vec<Recipient>> {
        let users = match audience {
            AudienceType::All => self.users.find_all().await?,
            AudienceType::Clients => self.users.find_with_client_profile().await?,
            AudienceType::Employees => self.users.find_with_employee_profile().await?,
        };

        debug!(audience = %audience, count = users.len(), "Resolved audience");
        Ok(users.into_iter().map(Recipient::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(email: Option<&str>) -> Recipient {
        Recipient {
            id: "u".to_string(),
            email: email.map(str::to_string),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            roles: vec![],
        }
    }

    #[test]
    fn test_email_address_filters_blank() {
        assert_eq!(recipient(Some("a@b.c")).email_address(), Some("a@b.c"));
        assert_eq!(recipient(Some("  ")).email_address(), None);
        assert_eq!(recipient(None).email_address(), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(recipient(None).display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_from_user_model() {
        let user = UserDbModel::new(Some("c@d.e"), "Grace", "Hopper", &["employee"]);
        let id = user.id.clone();
        let recipient = Recipient::from(user);
        assert_eq!(recipient.id, id);
        assert_eq!(recipient.roles, vec!["employee"]);
    }
}
