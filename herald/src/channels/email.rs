//! Email transport using SMTP.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CampaignMessage, MessageTransport};
use crate::{Error, Result};

/// SMTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address, optionally with a display name ("Acme <news@acme.io>").
    pub from_address: String,
    /// Upgrade the connection with STARTTLS.
    #[serde(default = "default_starttls")]
    pub starttls: bool,
    /// Per-send timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_port(),
            username: None,
            password: None,
            from_address: String::new(),
            starttls: default_starttls(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SmtpConfig {
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SMTP_HOST")
            && !host.trim().is_empty()
        {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            config.port = parsed;
        }
        config.username = std::env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty());
        config.password = std::env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty());
        if let Ok(from) = std::env::var("SMTP_FROM") {
            config.from_address = from;
        }
        if let Ok(starttls) = std::env::var("SMTP_STARTTLS") {
            config.starttls = !matches!(starttls.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }

        config
    }
}

/// Email transport.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    /// Create a new SMTP transport.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| Error::config(format!("invalid SMTP from address: {}", e)))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| Error::config(format!("invalid SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    fn build_body_text(message: &CampaignMessage) -> String {
        match &message.recipient_name {
            Some(name) => format!("Hello {},\n\n{}", name, message.body),
            None => message.body.clone(),
        }
    }

    fn build_body_html(message: &CampaignMessage) -> String {
        let greeting = message
            .recipient_name
            .as_deref()
            .map(|name| format!("<p>Hello {},</p>", escape_html(name)))
            .unwrap_or_default();
        let paragraphs: String = message
            .body
            .split("\n\n")
            .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; margin: 20px;">
    <h2>{}</h2>
    {}{}
</body>
</html>"#,
            escape_html(&message.subject),
            greeting,
            paragraphs
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl MessageTransport for SmtpTransport {
    fn transport_type(&self) -> &'static str {
        "smtp"
    }

    async fn send_campaign_message(&self, address: &str, message: &CampaignMessage) -> Result<()> {
        let to: Mailbox = address
            .parse()
            .map_err(|e| Error::channel(format!("invalid recipient address '{}': {}", address, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                Self::build_body_text(message),
                Self::build_body_html(message),
            ))
            .map_err(|e| Error::channel(format!("failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| Error::channel(format!("SMTP send failed: {}", e)))?;

        debug!(campaign_id = %message.campaign_id, to = %address, "Campaign email sent");
        Ok(())
    }
}
