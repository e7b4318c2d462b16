//! Campaign execution and scheduling.
//!
//! The [`CampaignExecutor`] turns one stored campaign into per-recipient
//! deliveries over the channels its type selects. The [`CampaignScheduler`]
//! periodically sweeps for due campaigns and feeds them to the executor.

mod dispatch;
mod executor;
mod scheduler;

pub use dispatch::{Channel, channels_for};
pub use executor::{
    CAMPAIGN_NOTIFICATION_TYPE, CampaignExecutor, ExecutionSummary, ExecutorConfig,
};
pub use scheduler::{CampaignScheduler, SchedulerConfig, SweepReport};
