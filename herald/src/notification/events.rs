//! Domain events that produce user-facing notifications.
//!
//! Each variant fixes the notification type tag, the title and message
//! templates, and the shape of the data payload.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Events raised by other platform modules (tickets, projects, loyalty,
/// invoicing) that notify a single recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainNotification {
    TicketCreated {
        ticket_id: String,
        subject: String,
    },
    TicketStatusChanged {
        ticket_id: String,
        subject: String,
        status: String,
    },
    ProjectAssigned {
        project_id: String,
        project_name: String,
    },
    ProjectRefused {
        project_id: String,
        project_name: String,
        reason: Option<String>,
    },
    LoyaltyTierUpgrade {
        previous_tier: String,
        new_tier: String,
    },
    InvoiceReady {
        invoice_id: String,
        invoice_number: String,
        amount: String,
    },
}

impl DomainNotification {
    /// Notification type tag stored on the record.
    pub fn notification_type(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket_creation",
            Self::TicketStatusChanged { .. } => "ticket_status_change",
            Self::ProjectAssigned { .. } => "project_assignment",
            Self::ProjectRefused { .. } => "project_refused",
            Self::LoyaltyTierUpgrade { .. } => "loyalty_tier_upgrade",
            Self::InvoiceReady { .. } => "invoice_ready",
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::TicketCreated { ticket_id, .. } => format!("Ticket {} created", ticket_id),
            Self::TicketStatusChanged { ticket_id, .. } => format!("Ticket {} updated", ticket_id),
            Self::ProjectAssigned { .. } => "New project assignment".to_string(),
            Self::ProjectRefused { .. } => "Project refused".to_string(),
            Self::LoyaltyTierUpgrade { .. } => "Loyalty tier upgraded".to_string(),
            Self::InvoiceReady { invoice_number, .. } => {
                format!("Invoice {} is ready", invoice_number)
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::TicketCreated { subject, .. } => {
                format!("Your ticket \"{}\" has been created.", subject)
            }
            Self::TicketStatusChanged {
                subject, status, ..
            } => format!("Your ticket \"{}\" is now {}.", subject, status),
            Self::ProjectAssigned { project_name, .. } => {
                format!("You have been assigned to project \"{}\".", project_name)
            }
            Self::ProjectRefused {
                project_name,
                reason,
                ..
            } => match reason {
                Some(reason) => format!("Project \"{}\" was refused: {}", project_name, reason),
                None => format!("Project \"{}\" was refused.", project_name),
            },
            Self::LoyaltyTierUpgrade {
                previous_tier,
                new_tier,
            } => format!(
                "Congratulations! You moved from {} to {}.",
                previous_tier, new_tier
            ),
            Self::InvoiceReady {
                invoice_number,
                amount,
                ..
            } => format!(
                "Invoice {} for {} is available in your account.",
                invoice_number, amount
            ),
        }
    }

    /// Data payload echoed to live listeners.
    pub fn data(&self) -> Value {
        match self {
            Self::TicketCreated { ticket_id, subject } => {
                json!({ "ticketId": ticket_id, "subject": subject })
            }
            Self::TicketStatusChanged {
                ticket_id,
                subject,
                status,
            } => json!({ "ticketId": ticket_id, "subject": subject, "status": status }),
            Self::ProjectAssigned {
                project_id,
                project_name,
            } => json!({ "projectId": project_id, "projectName": project_name }),
            Self::ProjectRefused {
                project_id,
                project_name,
                reason,
            } => json!({ "projectId": project_id, "projectName": project_name, "reason": reason }),
            Self::LoyaltyTierUpgrade {
                previous_tier,
                new_tier,
            } => json!({ "previousTier": previous_tier, "newTier": new_tier }),
            Self::InvoiceReady {
                invoice_id,
                invoice_number,
                amount,
            } => json!({ "invoiceId": invoice_id, "invoiceNumber": invoice_number, "amount": amount }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_created_templates() {
        let event = DomainNotification::TicketCreated {
            ticket_id: "T-1".to_string(),
            subject: "Broken login".to_string(),
        };
        assert_eq!(event.notification_type(), "ticket_creation");
        assert_eq!(event.title(), "Ticket T-1 created");
        assert!(event.message().contains("Broken login"));
        assert_eq!(event.data()["ticketId"], "T-1");
    }

    #[test]
    fn test_project_refused_without_reason() {
        let event = DomainNotification::ProjectRefused {
            project_id: "p".to_string(),
            project_name: "Apollo".to_string(),
            reason: None,
        };
        assert_eq!(event.message(), "Project \"Apollo\" was refused.");
        assert!(event.data()["reason"].is_null());
    }

    #[test]
    fn test_tier_upgrade_type_tag() {
        let event = DomainNotification::LoyaltyTierUpgrade {
            previous_tier: "Silver".to_string(),
            new_tier: "Gold".to_string(),
        };
        assert_eq!(event.notification_type(), "loyalty_tier_upgrade");
        assert_eq!(event.data()["newTier"], "Gold");
    }

    #[test]
    fn test_deserialize_tagged() {
        let event: DomainNotification = serde_json::from_str(
            r#"{"type":"invoice_ready","invoice_id":"i","invoice_number":"2026-001","amount":"120.00 EUR"}"#,
        )
        .unwrap();
        assert_eq!(event.title(), "Invoice 2026-001 is ready");
    }
}
