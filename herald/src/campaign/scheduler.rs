//! Periodic sweep for due campaigns.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::executor::CampaignExecutor;
use crate::database::repositories::CampaignRepository;
use crate::database::time::now_ms;
use crate::{Error, Result};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether the periodic sweep runs at all.
    pub enabled: bool,
    /// Time between sweeps.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Supported env vars: `SCHEDULER_INTERVAL_SECS`, `SCHEDULER_ENABLED`.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("SCHEDULER_INTERVAL_SECS")
            && let Ok(parsed) = value.parse::<u64>()
            && parsed > 0
        {
            config.interval = Duration::from_secs(parsed);
        }
        if let Ok(value) = std::env::var("SCHEDULER_ENABLED") {
            config.enabled = !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }

        config
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Campaigns that were due when the sweep started.
    pub due: usize,
    pub executed: usize,
    /// Campaigns another caller executed first.
    pub skipped: usize,
    pub failed: usize,
}

/// Drives due campaigns through the executor on a fixed interval.
pub struct CampaignScheduler {
    campaigns: Arc<dyn CampaignRepository>,
    executor: Arc<CampaignExecutor>,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
}

impl CampaignScheduler {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        executor: Arc<CampaignExecutor>,
        config: SchedulerConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            campaigns,
            executor,
            config,
            cancellation_token,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Execute every due campaign, one after another.
    ///
    /// Only the due-campaign lookup can fail the sweep; per-campaign failures
    /// are logged and counted.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let due = self.campaigns.find_due(now_ms()).await?;
        let mut report = SweepReport {
            due: due.len(),
            ..Default::default()
        };

        if due.is_empty() {
            debug!("No campaigns due");
            return Ok(report);
        }

        for campaign in due {
            match self.executor.execute(&campaign.id).await {
                Ok(summary) => {
                    report.executed += 1;
                    debug!(
                        campaign_id = %campaign.id,
                        sent = summary.sent,
                        errors = summary.errors,
                        "Scheduled campaign executed"
                    );
                }
                Err(Error::AlreadyExecuted { .. }) => {
                    report.skipped += 1;
                    debug!(campaign_id = %campaign.id, "Campaign already executed, skipping");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(campaign_id = %campaign.id, error = %e, "Scheduled campaign failed");
                }
            }
        }

        info!(
            due = report.due,
            executed = report.executed,
            skipped = report.skipped,
            failed = report.failed,
            "Campaign sweep finished"
        );
        Ok(report)
    }

    /// Start the periodic sweep. Returns `None` when the scheduler is disabled.
    pub fn start(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            info!("Campaign scheduler disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            self.run_loop().await;
        }))
    }

    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.config.interval.as_secs(), "Campaign scheduler started");

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Campaign scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "Campaign sweep failed");
                    }
                }
            }
        }
    }
}
