//! Webhook mail-relay transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{CampaignMessage, MessageTransport};
use crate::{Error, Result};

/// Webhook transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Relay URL.
    pub url: String,
    /// Custom headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Authentication type.
    pub auth: Option<WebhookAuth>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

/// Webhook authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookAuth {
    /// Bearer token authentication.
    Bearer { token: String },
    /// Basic authentication.
    Basic { username: String, password: String },
    /// Custom header authentication.
    Header { name: String, value: String },
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: Vec::new(),
            auth: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("MAIL_WEBHOOK_URL") {
            config.url = url;
        }
        if let Ok(token) = std::env::var("MAIL_WEBHOOK_TOKEN")
            && !token.is_empty()
        {
            config.auth = Some(WebhookAuth::Bearer { token });
        }
        if let Ok(timeout) = std::env::var("MAIL_WEBHOOK_TIMEOUT_SECS")
            && let Ok(parsed) = timeout.parse::<u64>()
        {
            config.timeout_secs = parsed;
        }

        config
    }
}

/// Transport that POSTs each message as JSON to a mail relay.
pub struct WebhookTransport {
    config: WebhookConfig,
    client: Client,
}

impl WebhookTransport {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::config("MAIL_WEBHOOK_URL is required for the webhook transport"));
        }

        super::install_rustls_provider();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, value);
            }
        }

        match &self.config.auth {
            Some(WebhookAuth::Bearer { token }) => {
                if let Ok(value) = format!("Bearer {}", token).parse() {
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
            }
            Some(WebhookAuth::Header { name, value }) => {
                if let (Ok(name), Ok(value)) = (
                    name.parse::<reqwest::header::HeaderName>(),
                    value.parse::<reqwest::header::HeaderValue>(),
                ) {
                    headers.insert(name, value);
                }
            }
            // Basic auth goes through the request builder.
            Some(WebhookAuth::Basic { .. }) | None => {}
        }

        headers
    }

    fn build_payload(address: &str, message: &CampaignMessage) -> serde_json::Value {
        json!({
            "to": address,
            "subject": message.subject,
            "text": message.body,
            "recipientName": message.recipient_name,
            "campaignId": message.campaign_id,
        })
    }
}

#[async_trait]
impl MessageTransport for WebhookTransport {
    fn transport_type(&self) -> &'static str {
        "webhook"
    }

    async fn send_campaign_message(&self, address: &str, message: &CampaignMessage) -> Result<()> {
        let mut request = self
            .client
            .post(&self.config.url)
            .headers(self.build_headers())
            .json(&Self::build_payload(address, message));

        if let Some(WebhookAuth::Basic { username, password }) = &self.config.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::channel(format!("Mail webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Mail webhook failed: {} - {}", status, body);
            return Err(Error::channel(format!(
                "Mail webhook failed: {} - {}",
                status, body
            )));
        }

        debug!(campaign_id = %message.campaign_id, to = %address, "Campaign message relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(auth: Option<WebhookAuth>) -> WebhookTransport {
        WebhookTransport::new(WebhookConfig {
            url: "https://relay.example.com/send".to_string(),
            auth,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_webhook_requires_url() {
        assert!(matches!(
            WebhookTransport::new(WebhookConfig::default()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_build_payload() {
        let message = CampaignMessage {
            campaign_id: "c-1".to_string(),
            subject: "Spring sale".to_string(),
            body: "20% off".to_string(),
            recipient_name: None,
        };
        let payload = WebhookTransport::build_payload("a@example.com", &message);
        assert_eq!(payload["to"], "a@example.com");
        assert_eq!(payload["subject"], "Spring sale");
        assert_eq!(payload["campaignId"], "c-1");
        assert!(payload["recipientName"].is_null());
    }

    #[test]
    fn test_build_headers_with_bearer() {
        let transport = transport(Some(WebhookAuth::Bearer {
            token: "secret".to_string(),
        }));
        let headers = transport.build_headers();
        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn test_build_headers_with_custom_header() {
        let transport = transport(Some(WebhookAuth::Header {
            name: "X-Api-Key".to_string(),
            value: "k".to_string(),
        }));
        assert_eq!(transport.build_headers().get("x-api-key").unwrap(), "k");
    }
}
