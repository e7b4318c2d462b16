//! Notification repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::NotificationDbModel;
use crate::{Error, Result};

/// Notification repository trait.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(&self, notification: &NotificationDbModel) -> Result<()>;
    async fn get_notification(&self, id: &str) -> Result<NotificationDbModel>;
    async fn list_for_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationDbModel>>;
    async fn count_unread(&self, recipient_id: &str) -> Result<i64>;

    /// Flip a single notification to read. Returns `false` if it was already read.
    async fn mark_read(&self, id: &str) -> Result<bool>;

    /// Flip every unread notification of a recipient to read in one statement.
    async fn mark_all_read(&self, recipient_id: &str) -> Result<u64>;
}

/// SQLx implementation of NotificationRepository.
pub struct SqlxNotificationRepository {
    pool: SqlitePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create_notification(&self, notification: &NotificationDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, notification_type, title, message, data, is_read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.recipient_id)
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_notification(&self, id: &str) -> Result<NotificationDbModel> {
        sqlx::query_as::<_, NotificationDbModel>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Notification", id))
    }

    async fn list_for_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationDbModel>> {
        let notifications = if unread_only {
            sqlx::query_as::<_, NotificationDbModel>(
                r#"
                SELECT * FROM notifications
                WHERE recipient_id = ? AND is_read = FALSE
                ORDER BY created_at DESC LIMIT ?
                "#,
            )
            .bind(recipient_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, NotificationDbModel>(
                "SELECT * FROM notifications WHERE recipient_id = ? ORDER BY created_at DESC LIMIT ?",
            )
            .bind(recipient_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(notifications)
    }

    async fn count_unread(&self, recipient_id: &str) -> Result<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(result.0)
    }

    async fn mark_read(&self, id: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND is_read = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_all_read(&self, recipient_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = ? AND is_read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
