//! Channel dispatch table.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::database::models::CampaignType;

/// A delivery channel a campaign can use for a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Store-and-forward message (email).
    Message,
    /// Persisted notification pushed to live connections.
    Live,
}

/// Channels attempted for each recipient of a campaign of the given type, in order.
pub fn channels_for(campaign_type: CampaignType) -> &'static [Channel] {
    match campaign_type {
        CampaignType::Email => &[Channel::Message],
        CampaignType::Push => &[Channel::Live],
        CampaignType::Mixed => &[Channel::Message, Channel::Live],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table() {
        assert_eq!(channels_for(CampaignType::Email), &[Channel::Message]);
        assert_eq!(channels_for(CampaignType::Push), &[Channel::Live]);
        assert_eq!(
            channels_for(CampaignType::Mixed),
            &[Channel::Message, Channel::Live]
        );
        assert_eq!(Channel::Live.to_string(), "live");
    }
}
