//! Notification service implementation.
//!
//! The NotificationService is responsible for:
//! - Persisting notifications for an existing recipient
//! - Pushing each new notification to the recipient's live connections
//! - Bulk read-state changes with a paired live event

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use super::events::DomainNotification;
use crate::database::models::{Notification, NotificationDbModel};
use crate::database::repositories::{NotificationRepository, UserRepository};
use crate::realtime::{FanOutRegistry, event_names};
use crate::{Error, Result};

/// Default page size for notification listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// The notification service.
pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
    registry: Arc<FanOutRegistry>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
        registry: Arc<FanOutRegistry>,
    ) -> Self {
        Self {
            users,
            notifications,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<FanOutRegistry> {
        &self.registry
    }

    /// Persist a notification and push it to the recipient's live connections.
    ///
    /// Fails with `NotFound` if the recipient does not exist. The live push is
    /// best effort: an offline recipient is not an error.
    pub async fn dispatch(
        &self,
        recipient_id: &str,
        notification_type: Option<&str>,
        title: &str,
        message: &str,
        data: Option<Value>,
    ) -> Result<Notification> {
        if self.users.find_by_id(recipient_id).await?.is_none() {
            return Err(Error::not_found("User", recipient_id));
        }

        let model = NotificationDbModel::new(
            recipient_id,
            notification_type,
            title,
            message,
            data.as_ref(),
        );
        self.notifications.create_notification(&model).await?;

        let notification = Notification::from(model);
        let payload = serde_json::to_value(&notification)?;
        let delivered =
            self.registry
                .emit_to_recipient(recipient_id, event_names::NOTIFICATION_NEW, payload);

        debug!(
            notification_id = %notification.id,
            recipient_id = %recipient_id,
            notification_type = ?notification_type,
            delivered,
            "Notification dispatched"
        );
        Ok(notification)
    }

    /// Dispatch a templated domain notification.
    pub async fn notify(
        &self,
        recipient_id: &str,
        event: &DomainNotification,
    ) -> Result<Notification> {
        self.dispatch(
            recipient_id,
            Some(event.notification_type()),
            &event.title(),
            &event.message(),
            Some(event.data()),
        )
        .await
    }

    /// Mark every unread notification of a recipient as read.
    ///
    /// Emits `notifications:allRead` with the affected count and returns it,
    /// whether or not any live connection received the event.
    pub async fn mark_all_read(&self, recipient_id: &str) -> Result<u64> {
        let count = self.notifications.mark_all_read(recipient_id).await?;
        self.registry.emit_to_recipient(
            recipient_id,
            event_names::NOTIFICATIONS_ALL_READ,
            json!({ "count": count }),
        );
        if count > 0 {
            info!(recipient_id = %recipient_id, count, "Marked notifications as read");
        }
        Ok(count)
    }

    /// Mark one notification as read. Returns `false` if it was already read.
    pub async fn mark_read(&self, notification_id: &str) -> Result<bool> {
        // Surface NotFound for unknown ids instead of a silent `false`.
        self.notifications.get_notification(notification_id).await?;
        self.notifications.mark_read(notification_id).await
    }

    pub async fn list_for_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 500);
        let rows = self
            .notifications
            .list_for_recipient(recipient_id, unread_only, limit)
            .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    pub async fn unread_count(&self, recipient_id: &str) -> Result<i64> {
        self.notifications.count_unread(recipient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserDbModel;
    use crate::database::repositories::{SqlxNotificationRepository, SqlxUserRepository};
    use crate::database::{init_pool_with_size, run_migrations};
    use crate::realtime::ConnectionHandle;

    async fn setup() -> (NotificationService, Arc<SqlxUserRepository>) {
        let pool = init_pool_with_size("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let users = Arc::new(SqlxUserRepository::new(pool.clone()));
        let notifications = Arc::new(SqlxNotificationRepository::new(pool));
        let service = NotificationService::new(
            users.clone(),
            notifications,
            Arc::new(FanOutRegistry::new()),
        );
        (service, users)
    }

    #[tokio::test]
    async fn test_dispatch_persists_and_pushes() {
        let (service, users) = setup().await;
        let user = UserDbModel::new(Some("a@example.com"), "Ada", "L", &["client"]);
        users.create(&user).await.unwrap();

        let (handle, mut rx) = ConnectionHandle::new(8);
        service.registry().register(handle, &user.id);

        let notification = service
            .dispatch(&user.id, Some("custom"), "Hello", "World", Some(json!({"k": "v"})))
            .await
            .unwrap();
        assert!(!notification.is_read);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, event_names::NOTIFICATION_NEW);
        assert_eq!(event.data["id"], notification.id.as_str());
        assert_eq!(event.data["data"]["k"], "v");
        assert_eq!(service.unread_count(&user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_recipient_is_not_found() {
        let (service, _users) = setup().await;
        let err = service
            .dispatch("missing", None, "t", "m", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_dispatch_offline_recipient_succeeds() {
        let (service, users) = setup().await;
        let user = UserDbModel::new(None, "Bob", "B", &[]);
        users.create(&user).await.unwrap();

        let event = DomainNotification::LoyaltyTierUpgrade {
            previous_tier: "Silver".to_string(),
            new_tier: "Gold".to_string(),
        };
        let notification = service.notify(&user.id, &event).await.unwrap();
        assert_eq!(
            notification.notification_type.as_deref(),
            Some("loyalty_tier_upgrade")
        );
    }

    #[tokio::test]
    async fn test_mark_read_only_flips_once() {
        let (service, users) = setup().await;
        let user = UserDbModel::new(None, "Bob", "B", &[]);
        users.create(&user).await.unwrap();
        let n = service.dispatch(&user.id, None, "t", "m", None).await.unwrap();

        assert!(service.mark_read(&n.id).await.unwrap());
        assert!(!service.mark_read(&n.id).await.unwrap());
        assert!(service.mark_read("missing").await.unwrap_err().is_not_found());
    }
}
