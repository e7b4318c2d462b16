//! Log-only transport.

use async_trait::async_trait;
use tracing::info;

use super::{CampaignMessage, MessageTransport};
use crate::Result;

/// Transport that only records the message in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    fn transport_type(&self) -> &'static str {
        "log"
    }

    async fn send_campaign_message(&self, address: &str, message: &CampaignMessage) -> Result<()> {
        info!(
            campaign_id = %message.campaign_id,
            to = %address,
            subject = %message.subject,
            "Campaign message (log transport)"
        );
        Ok(())
    }
}
