//! Notification dispatch.
//!
//! Persists per-recipient notifications and pushes them to live connections
//! through the fan-out registry.
//!
//! # Example
//!
//! ```ignore
//! use herald::notification::{DomainNotification, NotificationService};
//!
//! let service = NotificationService::new(users, notifications, registry);
//! service
//!     .notify(
//!         &user_id,
//!         &DomainNotification::TicketCreated {
//!             ticket_id: "T-1042".to_string(),
//!             subject: "Printer on fire".to_string(),
//!         },
//!     )
//!     .await?;
//! ```

pub mod events;
pub mod service;

pub use events::DomainNotification;
pub use service::NotificationService;
