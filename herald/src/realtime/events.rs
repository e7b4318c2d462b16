//! Live event frames exchanged over the real-time stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event names emitted by the engine.
pub mod event_names {
    /// A notification was persisted for the recipient.
    pub const NOTIFICATION_NEW: &str = "notification:new";
    /// All of the recipient's notifications were marked read.
    pub const NOTIFICATIONS_ALL_READ: &str = "notifications:allRead";
    /// Acknowledges a `register` message.
    pub const REGISTERED: &str = "registered";
    /// The server rejected a client frame.
    pub const ERROR: &str = "error";
}

/// A named event with an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub event: String,
    pub data: Value,
}

impl LiveEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Messages a client may send on the real-time stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attribute this connection to a recipient.
    Register {
        #[serde(alias = "recipientId", alias = "userId")]
        recipient_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_message_decode() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"register","recipient_id":"u-1"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Register {
                recipient_id: "u-1".to_string()
            }
        );

        let camel: ClientMessage =
            serde_json::from_str(r#"{"type":"register","recipientId":"u-2"}"#).unwrap();
        assert_eq!(
            camel,
            ClientMessage::Register {
                recipient_id: "u-2".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_message_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn test_live_event_encoding() {
        let event = LiveEvent::new(event_names::NOTIFICATIONS_ALL_READ, json!({"count": 5}));
        let text = serde_json::to_string(&event).unwrap();
        assert_eq!(text, r#"{"event":"notifications:allRead","data":{"count":5}}"#);
    }
}
