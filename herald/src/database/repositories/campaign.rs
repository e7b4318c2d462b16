//! Campaign repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{CampaignDbModel, CampaignStatus};
use crate::database::time::now_ms;
use crate::{Error, Result};

/// Campaign repository trait.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn get_campaign(&self, id: &str) -> Result<CampaignDbModel>;
    async fn list_campaigns(&self) -> Result<Vec<CampaignDbModel>>;
    async fn create_campaign(&self, campaign: &CampaignDbModel) -> Result<()>;
    async fn update_campaign(&self, campaign: &CampaignDbModel) -> Result<()>;
    async fn delete_campaign(&self, id: &str) -> Result<()>;
    async fn count_campaigns(&self) -> Result<i64>;

    /// Active, started and not yet executed campaigns, oldest start first.
    async fn find_due(&self, now_ms: i64) -> Result<Vec<CampaignDbModel>>;

    /// Atomically set `executed_at` if it is still unset.
    ///
    /// Returns `false` when another caller already claimed the campaign.
    async fn claim_execution(&self, id: &str, now_ms: i64) -> Result<bool>;

    /// Record the outcome of an execution run.
    async fn complete_execution(
        &self,
        id: &str,
        sent: i64,
        target_audience: i64,
        executed_at_ms: i64,
    ) -> Result<()>;
}

/// SQLx implementation of CampaignRepository.
pub struct SqlxCampaignRepository {
    pool: SqlitePool,
}

impl SqlxCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for SqlxCampaignRepository {
    async fn get_campaign(&self, id: &str) -> Result<CampaignDbModel> {
        sqlx::query_as::<_, CampaignDbModel>("SELECT * FROM campaigns WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Campaign", id))
    }

    async fn list_campaigns(&self) -> Result<Vec<CampaignDbModel>> {
        let campaigns = sqlx::query_as::<_, CampaignDbModel>(
            "SELECT * FROM campaigns ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    async fn create_campaign(&self, campaign: &CampaignDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, name, description, campaign_type, status, audience_type,
                start_date, end_date, executed_at, target_audience, sent, opened, clicked,
                content, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&campaign.id)
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(&campaign.campaign_type)
        .bind(&campaign.status)
        .bind(&campaign.audience_type)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.executed_at)
        .bind(campaign.target_audience)
        .bind(campaign.sent)
        .bind(campaign.opened)
        .bind(campaign.clicked)
        .bind(&campaign.content)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_campaign(&self, campaign: &CampaignDbModel) -> Result<()> {
        // executed_at and the tracking counters are not touched here.
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET
                name = ?,
                description = ?,
                campaign_type = ?,
                status = ?,
                audience_type = ?,
                start_date = ?,
                end_date = ?,
                content = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(&campaign.campaign_type)
        .bind(&campaign.status)
        .bind(&campaign.audience_type)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(&campaign.content)
        .bind(now_ms())
        .bind(&campaign.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Campaign", &campaign.id));
        }
        Ok(())
    }

    async fn delete_campaign(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_campaigns(&self) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM campaigns")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0)
    }

    async fn find_due(&self, now_ms: i64) -> Result<Vec<CampaignDbModel>> {
        let campaigns = sqlx::query_as::<_, CampaignDbModel>(
            r#"
            SELECT * FROM campaigns
            WHERE status = ?
              AND start_date IS NOT NULL
              AND start_date <= ?
              AND executed_at IS NULL
            ORDER BY start_date, created_at
            "#,
        )
        .bind(CampaignStatus::Active.as_str())
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    async fn claim_execution(&self, id: &str, now_ms: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE campaigns SET executed_at = ?, updated_at = ? WHERE id = ? AND executed_at IS NULL",
        )
        .bind(now_ms)
        .bind(now_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn complete_execution(
        &self,
        id: &str,
        sent: i64,
        target_audience: i64,
        executed_at_ms: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent = ?,
                target_audience = ?,
                executed_at = ?,
                status = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(sent)
        .bind(target_audience)
        .bind(executed_at_ms)
        .bind(CampaignStatus::Active.as_str())
        .bind(executed_at_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
