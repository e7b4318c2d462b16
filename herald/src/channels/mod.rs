//! Store-and-forward message transports.
//!
//! This module provides different transports for campaign messages:
//! - SMTP email
//! - Generic webhook (HTTP POST to a mail relay)
//! - Log-only (default when nothing is configured)

mod email;
mod log;
mod webhook;

pub use email::{SmtpConfig, SmtpTransport};
pub use log::LogTransport;
pub use webhook::{WebhookConfig, WebhookTransport};

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// Install the process-wide rustls crypto provider used by HTTP clients.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Content handed to a transport for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMessage {
    pub campaign_id: String,
    pub subject: String,
    pub body: String,
    pub recipient_name: Option<String>,
}

/// Trait for store-and-forward message transports.
///
/// A send either succeeds or fails as a whole.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Get the transport type name.
    fn transport_type(&self) -> &'static str;

    /// Deliver one campaign message to one address.
    async fn send_campaign_message(&self, address: &str, message: &CampaignMessage) -> Result<()>;
}

/// Transport configuration wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Smtp(SmtpConfig),
    Webhook(WebhookConfig),
    #[default]
    Log,
}

impl TransportConfig {
    /// Get the transport type name.
    pub fn transport_type(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Webhook(_) => "webhook",
            Self::Log => "log",
        }
    }

    /// Load the transport config from environment variables, falling back to the log transport.
    ///
    /// Supported env vars:
    /// - `MESSAGE_TRANSPORT` ("smtp", "webhook" or "log")
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`, `SMTP_STARTTLS`
    /// - `MAIL_WEBHOOK_URL`, `MAIL_WEBHOOK_TOKEN`, `MAIL_WEBHOOK_TIMEOUT_SECS`
    pub fn from_env_or_default() -> Self {
        match std::env::var("MESSAGE_TRANSPORT")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Ok("smtp") => Self::Smtp(SmtpConfig::from_env_or_default()),
            Ok("webhook") => Self::Webhook(WebhookConfig::from_env_or_default()),
            _ => Self::Log,
        }
    }

    /// Build the configured transport.
    pub fn build(&self) -> Result<Arc<dyn MessageTransport>> {
        Ok(match self {
            Self::Smtp(c) => Arc::new(SmtpTransport::new(c.clone())?),
            Self::Webhook(c) => Arc::new(WebhookTransport::new(c.clone())?),
            Self::Log => Arc::new(LogTransport),
        })
    }
}
