//! Campaign execution engine.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::dispatch::{Channel, channels_for};
use crate::audience::{AudienceResolver, Recipient};
use crate::channels::{CampaignMessage, MessageTransport};
use crate::database::models::CampaignDbModel;
use crate::database::repositories::CampaignRepository;
use crate::database::time::now_ms;
use crate::notification::NotificationService;
use crate::{Error, Result};

/// Notification type used for campaign pushes.
pub const CAMPAIGN_NOTIFICATION_TYPE: &str = "campaign";

/// Executor tuning.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum recipients dispatched at the same time.
    pub dispatch_concurrency: usize,
    /// Upper bound for a single channel attempt.
    pub channel_attempt_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dispatch_concurrency: 8,
            channel_attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl ExecutorConfig {
    /// Supported env vars: `DISPATCH_CONCURRENCY`, `CHANNEL_ATTEMPT_TIMEOUT_SECS`.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("DISPATCH_CONCURRENCY")
            && let Ok(parsed) = value.parse::<usize>()
            && parsed > 0
        {
            config.dispatch_concurrency = parsed;
        }
        if let Ok(value) = std::env::var("CHANNEL_ATTEMPT_TIMEOUT_SECS")
            && let Ok(parsed) = value.parse::<u64>()
            && parsed > 0
        {
            config.channel_attempt_timeout = Duration::from_secs(parsed);
        }

        config
    }
}

/// Result of one campaign execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Recipients reached on at least one channel.
    pub sent: u64,
    /// Failed channel attempts.
    pub errors: u64,
}

#[derive(Debug, Default)]
struct RecipientOutcome {
    delivered: bool,
    errors: u64,
}

enum Attempt {
    Delivered,
    Skipped,
}

/// Executes stored campaigns against their resolved audience.
pub struct CampaignExecutor {
    campaigns: Arc<dyn CampaignRepository>,
    audience: AudienceResolver,
    notifications: Arc<NotificationService>,
    transport: Arc<dyn MessageTransport>,
    config: ExecutorConfig,
}

impl CampaignExecutor {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        audience: AudienceResolver,
        notifications: Arc<NotificationService>,
        transport: Arc<dyn MessageTransport>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            campaigns,
            audience,
            notifications,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a campaign once.
    ///
    /// Fails with `NotFound` for an unknown campaign and with `AlreadyExecuted`
    /// if the campaign was executed before or another caller claimed it first.
    /// Per-recipient channel failures are counted in the summary, not returned.
    pub async fn execute(&self, campaign_id: &str) -> Result<ExecutionSummary> {
        let campaign = self.campaigns.get_campaign(campaign_id).await?;
        if campaign.is_executed() {
            return Err(Error::already_executed(campaign_id));
        }

        let campaign_type = campaign.get_campaign_type()?;
        let recipients = self.audience.resolve(campaign.get_audience_type()?).await?;

        if !self.campaigns.claim_execution(&campaign.id, now_ms()).await? {
            return Err(Error::already_executed(campaign_id));
        }

        info!(
            campaign_id = %campaign.id,
            campaign_type = %campaign_type,
            recipients = recipients.len(),
            "Executing campaign"
        );

        let channels = channels_for(campaign_type);
        let campaign_ref = &campaign;
        // Owned recipients keep the combined future `Send` for spawned callers.
        let outcomes: Vec<RecipientOutcome> = stream::iter(recipients.iter().cloned())
            .map(move |recipient| async move {
                self.dispatch_recipient(campaign_ref, channels, &recipient)
                    .await
            })
            .buffer_unordered(self.config.dispatch_concurrency.max(1))
            .collect()
            .await;

        let summary = outcomes
            .iter()
            .fold(ExecutionSummary::default(), |mut acc, outcome| {
                if outcome.delivered {
                    acc.sent += 1;
                }
                acc.errors += outcome.errors;
                acc
            });

        self.campaigns
            .complete_execution(
                &campaign.id,
                summary.sent as i64,
                recipients.len() as i64,
                now_ms(),
            )
            .await?;

        info!(
            campaign_id = %campaign.id,
            sent = summary.sent,
            errors = summary.errors,
            "Campaign executed"
        );
        Ok(summary)
    }

    async fn dispatch_recipient(
        &self,
        campaign: &CampaignDbModel,
        channels: &[Channel],
        recipient: &Recipient,
    ) -> RecipientOutcome {
        let mut outcome = RecipientOutcome::default();

        for &channel in channels {
            let attempt = tokio::time::timeout(
                self.config.channel_attempt_timeout,
                self.attempt(channel, campaign, recipient),
            )
            .await
            .unwrap_or_else(|_| {
                Err(Error::channel(format!(
                    "{} attempt timed out after {:?}",
                    channel, self.config.channel_attempt_timeout
                )))
            });

            match attempt {
                Ok(Attempt::Delivered) => outcome.delivered = true,
                Ok(Attempt::Skipped) => {}
                Err(e) => {
                    warn!(
                        campaign_id = %campaign.id,
                        recipient_id = %recipient.id,
                        channel = %channel,
                        error = %e,
                        "Channel dispatch failed"
                    );
                    outcome.errors += 1;
                }
            }
        }

        outcome
    }

    async fn attempt(
        &self,
        channel: Channel,
        campaign: &CampaignDbModel,
        recipient: &Recipient,
    ) -> Result<Attempt> {
        match channel {
            Channel::Message => {
                let Some(address) = recipient.email_address() else {
                    warn!(
                        campaign_id = %campaign.id,
                        recipient_id = %recipient.id,
                        "Recipient has no email address, skipping message channel"
                    );
                    return Ok(Attempt::Skipped);
                };

                let message = CampaignMessage {
                    campaign_id: campaign.id.clone(),
                    subject: campaign.name.clone(),
                    body: campaign.content.clone(),
                    recipient_name: Some(recipient.display_name()).filter(|n| !n.is_empty()),
                };
                self.transport.send_campaign_message(address, &message).await?;
            }
            Channel::Live => {
                self.notifications
                    .dispatch(
                        &recipient.id,
                        Some(CAMPAIGN_NOTIFICATION_TYPE),
                        &campaign.name,
                        &campaign.content,
                        Some(json!({
                            "campaignId": campaign.id,
                            "campaignName": campaign.name,
                        })),
                    )
                    .await?;
            }
        }

        debug!(campaign_id = %campaign.id, recipient_id = %recipient.id, channel = %channel, "Delivered");
        Ok(Attempt::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::database::models::{AudienceType, CampaignStatus, CampaignType, UserDbModel};
    use crate::database::repositories::{
        SqlxCampaignRepository, SqlxNotificationRepository, SqlxUserRepository, UserRepository,
    };
    use crate::database::{init_pool_with_size, run_migrations};
    use crate::realtime::{ConnectionHandle, FanOutRegistry, event_names};

    #[derive(Default)]
    struct RecordingTransport {
        failing: HashSet<String>,
        sent: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        fn transport_type(&self) -> &'static str {
            "recording"
        }

        async fn send_campaign_message(&self, address: &str, _message: &CampaignMessage) -> Result<()> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.contains(address) {
                return Err(Error::channel("relay rejected"));
            }
            self.sent.lock().push(address.to_string());
            Ok(())
        }
    }

    struct Harness {
        executor: CampaignExecutor,
        users: Arc<SqlxUserRepository>,
        campaigns: Arc<SqlxCampaignRepository>,
        registry: Arc<FanOutRegistry>,
        transport: Arc<RecordingTransport>,
    }

    async fn harness(transport: RecordingTransport, config: ExecutorConfig) -> Harness {
        let pool = init_pool_with_size("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let users = Arc::new(SqlxUserRepository::new(pool.clone()));
        let campaigns = Arc::new(SqlxCampaignRepository::new(pool.clone()));
        let registry = Arc::new(FanOutRegistry::new());
        let notifications = Arc::new(NotificationService::new(
            users.clone(),
            Arc::new(SqlxNotificationRepository::new(pool)),
            registry.clone(),
        ));
        let transport = Arc::new(transport);
        let executor = CampaignExecutor::new(
            campaigns.clone(),
            AudienceResolver::new(users.clone()),
            notifications,
            transport.clone(),
            config,
        );
        Harness {
            executor,
            users,
            campaigns,
            registry,
            transport,
        }
    }

    async fn add_user(users: &SqlxUserRepository, email: Option<&str>) -> UserDbModel {
        let user = UserDbModel::new(email, "Test", "User", &["client"]);
        users.create(&user).await.unwrap();
        user
    }

    async fn add_campaign(
        campaigns: &SqlxCampaignRepository,
        campaign_type: CampaignType,
    ) -> CampaignDbModel {
        let campaign =
            CampaignDbModel::new("Launch", campaign_type, AudienceType::All, "We are live")
                .with_status(CampaignStatus::Active);
        campaigns.create_campaign(&campaign).await.unwrap();
        campaign
    }

    #[tokio::test]
    async fn test_email_campaign_counts_failures_per_recipient() {
        let transport = RecordingTransport {
            failing: HashSet::from(["bad@example.com".to_string()]),
            ..Default::default()
        };
        let h = harness(transport, ExecutorConfig::default()).await;
        add_user(&h.users, Some("a@example.com")).await;
        add_user(&h.users, Some("bad@example.com")).await;
        add_user(&h.users, Some("c@example.com")).await;
        let campaign = add_campaign(&h.campaigns, CampaignType::Email).await;

        let summary = h.executor.execute(&campaign.id).await.unwrap();
        assert_eq!(summary, ExecutionSummary { sent: 2, errors: 1 });
        assert_eq!(h.transport.sent.lock().len(), 2);

        let stored = h.campaigns.get_campaign(&campaign.id).await.unwrap();
        assert_eq!(stored.sent, 2);
        assert_eq!(stored.target_audience, 3);
        assert!(stored.executed_at.is_some());
    }

    #[tokio::test]
    async fn test_push_campaign_emits_campaign_notification() {
        let h = harness(RecordingTransport::default(), ExecutorConfig::default()).await;
        let user = add_user(&h.users, None).await;
        let (handle, mut rx) = ConnectionHandle::new(8);
        h.registry.register(handle, &user.id);
        let campaign = add_campaign(&h.campaigns, CampaignType::Push).await;

        let summary = h.executor.execute(&campaign.id).await.unwrap();
        assert_eq!(summary, ExecutionSummary { sent: 1, errors: 0 });
        assert!(h.transport.sent.lock().is_empty());

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, event_names::NOTIFICATION_NEW);
        assert_eq!(event.data["type"], CAMPAIGN_NOTIFICATION_TYPE);
        assert_eq!(event.data["title"], "Launch");
        assert_eq!(event.data["message"], "We are live");
        assert_eq!(event.data["data"]["campaignId"], campaign.id.as_str());
        assert_eq!(event.data["data"]["campaignName"], "Launch");
    }

    #[tokio::test]
    async fn test_execute_twice_is_rejected() {
        let h = harness(RecordingTransport::default(), ExecutorConfig::default()).await;
        add_user(&h.users, Some("a@example.com")).await;
        let campaign = add_campaign(&h.campaigns, CampaignType::Email).await;

        h.executor.execute(&campaign.id).await.unwrap();
        let err = h.executor.execute(&campaign.id).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExecuted { .. }));
        assert_eq!(h.transport.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_not_found() {
        let h = harness(RecordingTransport::default(), ExecutorConfig::default()).await;
        assert!(h.executor.execute("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_empty_audience_completes() {
        let h = harness(RecordingTransport::default(), ExecutorConfig::default()).await;
        let campaign = add_campaign(&h.campaigns, CampaignType::Mixed).await;

        let summary = h.executor.execute(&campaign.id).await.unwrap();
        assert_eq!(summary, ExecutionSummary::default());
        let stored = h.campaigns.get_campaign(&campaign.id).await.unwrap();
        assert_eq!(stored.target_audience, 0);
        assert!(stored.is_executed());
    }

    #[tokio::test]
    async fn test_hung_attempt_times_out_as_error() {
        let transport = RecordingTransport {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let config = ExecutorConfig {
            channel_attempt_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let h = harness(transport, config).await;
        add_user(&h.users, Some("slow@example.com")).await;
        let campaign = add_campaign(&h.campaigns, CampaignType::Mixed).await;

        let summary = h.executor.execute(&campaign.id).await.unwrap();
        assert_eq!(summary, ExecutionSummary { sent: 1, errors: 1 });
        assert!(h.transport.sent.lock().is_empty());
    }
}
