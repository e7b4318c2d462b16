//! Service container for dependency injection.
//!
//! The ServiceContainer builds repositories and services over one database
//! pool and owns the lifecycle of the background scheduler.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::audience::AudienceResolver;
use crate::campaign::{CampaignExecutor, CampaignScheduler};
use crate::channels::MessageTransport;
use crate::config::AppConfig;
use crate::database::repositories::{
    CampaignRepository, NotificationRepository, SqlxCampaignRepository,
    SqlxNotificationRepository, SqlxUserRepository, UserRepository,
};
use crate::notification::NotificationService;
use crate::realtime::FanOutRegistry;

/// Default shutdown timeout.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Service container holding all application services.
pub struct ServiceContainer {
    /// Database connection pool.
    pub pool: SqlitePool,
    pub users: Arc<dyn UserRepository>,
    pub campaigns: Arc<dyn CampaignRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    /// Live connection registry shared with the WebSocket route.
    pub registry: Arc<FanOutRegistry>,
    pub notification_service: Arc<NotificationService>,
    pub executor: Arc<CampaignExecutor>,
    pub scheduler: Arc<CampaignScheduler>,
    scheduler_handle: Mutex<Option<JoinHandle<()>>>,
    /// Cancellation token for graceful shutdown.
    cancellation_token: CancellationToken,
}

impl ServiceContainer {
    /// Build all services, using the transport selected by the config.
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Result<Self> {
        let transport = config.transport.build()?;
        info!(transport = transport.transport_type(), "Message transport configured");
        Ok(Self::with_transport(pool, config, transport))
    }

    /// Build all services around an explicit message transport.
    pub fn with_transport(
        pool: SqlitePool,
        config: &AppConfig,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        info!("Initializing service container");

        let users: Arc<dyn UserRepository> = Arc::new(SqlxUserRepository::new(pool.clone()));
        let campaigns: Arc<dyn CampaignRepository> =
            Arc::new(SqlxCampaignRepository::new(pool.clone()));
        let notifications: Arc<dyn NotificationRepository> =
            Arc::new(SqlxNotificationRepository::new(pool.clone()));

        let registry = Arc::new(FanOutRegistry::new());
        let notification_service = Arc::new(NotificationService::new(
            users.clone(),
            notifications.clone(),
            registry.clone(),
        ));

        let executor = Arc::new(CampaignExecutor::new(
            campaigns.clone(),
            AudienceResolver::new(users.clone()),
            notification_service.clone(),
            transport,
            config.executor.clone(),
        ));

        let cancellation_token = CancellationToken::new();
        let scheduler = Arc::new(CampaignScheduler::new(
            campaigns.clone(),
            executor.clone(),
            config.scheduler.clone(),
            cancellation_token.child_token(),
        ));

        info!("Service container initialized");

        Self {
            pool,
            users,
            campaigns,
            notifications,
            registry,
            notification_service,
            executor,
            scheduler,
            scheduler_handle: Mutex::new(None),
            cancellation_token,
        }
    }

    /// Start background tasks.
    pub fn start(&self) {
        let mut handle = self.scheduler_handle.lock();
        if handle.is_none() {
            *handle = self.scheduler.clone().start();
        }
    }

    /// Get the cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Check if shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Shutdown all services gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown all services gracefully with a custom timeout.
    ///
    /// A sweep in progress is allowed to finish within the timeout.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);
        self.cancellation_token.cancel();

        let handle = self.scheduler_handle.lock().take();
        if let Some(handle) = handle
            && tokio::time::timeout(timeout, handle).await.is_err()
        {
            warn!("Shutdown timeout reached, abandoning scheduler task");
        }

        info!("Closing database pool...");
        self.pool.close().await;
        info!("All services shut down");
        Ok(())
    }
}
