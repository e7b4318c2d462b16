//! Notification database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tracing::warn;

use crate::database::time::{ms_to_datetime, now_ms};

/// Notification database model.
/// A single persisted message owned by exactly one recipient.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct NotificationDbModel {
    pub id: String,
    pub recipient_id: String,
    /// Free-form event category (e.g. "ticket_creation").
    pub notification_type: Option<String>,
    pub title: String,
    pub message: String,
    /// JSON blob echoed verbatim to live listeners
    pub data: Option<String>,
    pub is_read: bool,
    pub created_at: i64,
}

impl NotificationDbModel {
    pub fn new(
        recipient_id: impl Into<String>,
        notification_type: Option<&str>,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<&Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_id: recipient_id.into(),
            notification_type: notification_type.map(str::to_string),
            title: title.into(),
            message: message.into(),
            data: data.map(Value::to_string),
            is_read: false,
            created_at: now_ms(),
        }
    }

    /// Parse the stored data payload.
    pub fn get_data(&self) -> Option<Value> {
        let raw = self.data.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(notification_id = %self.id, error = %e, "Invalid notification data JSON");
                None
            }
        }
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        ms_to_datetime(self.created_at)
    }
}

/// Notification as delivered to live listeners and API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationDbModel> for Notification {
    fn from(model: NotificationDbModel) -> Self {
        let data = model.get_data();
        let created_at = model.get_created_at();
        Self {
            id: model.id,
            recipient_id: model.recipient_id,
            notification_type: model.notification_type,
            title: model.title,
            message: model.message,
            data,
            is_read: model.is_read,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_notification_is_unread() {
        let n = NotificationDbModel::new("u1", Some("ticket_creation"), "T", "M", None);
        assert!(!n.is_read);
        assert!(n.data.is_none());
        assert_eq!(n.notification_type.as_deref(), Some("ticket_creation"));
    }

    #[test]
    fn test_payload_serialization_uses_camel_case() {
        let data = json!({"ticketId": "t-1"});
        let model = NotificationDbModel::new("u1", Some("ticket_creation"), "T", "M", Some(&data));
        let payload = Notification::from(model);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["type"], "ticket_creation");
        assert_eq!(value["isRead"], false);
        assert_eq!(value["recipientId"], "u1");
        assert_eq!(value["data"]["ticketId"], "t-1");
    }
}
