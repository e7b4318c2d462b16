//! Campaign database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::database::time::{datetime_to_ms, ms_to_datetime, now_ms};
use crate::{Error, Result};

/// Which delivery channels a campaign uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignType {
    Email,
    Push,
    Mixed,
}

impl CampaignType {
    /// Column text, identical to the `Display` form.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Active,
    Inactive,
}

impl CampaignStatus {
    /// Column text, identical to the `Display` form.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Audience selector expanded by the audience resolver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AudienceType {
    All,
    Clients,
    Employees,
}

impl AudienceType {
    /// Column text, identical to the `Display` form.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

fn parse_column<T: FromStr>(campaign_id: &str, column: &str, value: &str) -> Result<T> {
    T::from_str(value).map_err(|_| {
        Error::validation(format!(
            "campaign {} has invalid {} value '{}'",
            campaign_id, column, value
        ))
    })
}

/// Campaign database model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignDbModel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// EMAIL, PUSH or MIXED
    pub campaign_type: String,
    /// ACTIVE or INACTIVE
    pub status: String,
    /// ALL, CLIENTS or EMPLOYEES
    pub audience_type: String,
    /// Unix epoch milliseconds; the scheduling trigger.
    pub start_date: Option<i64>,
    /// Unix epoch milliseconds; informational only.
    pub end_date: Option<i64>,
    /// Unix epoch milliseconds; set once when the campaign is claimed for execution.
    pub executed_at: Option<i64>,
    pub target_audience: i64,
    pub sent: i64,
    /// Maintained by external tracking collaborators.
    pub opened: i64,
    /// Maintained by external tracking collaborators.
    pub clicked: i64,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CampaignDbModel {
    /// Create a new inactive campaign with no schedule.
    pub fn new(
        name: impl Into<String>,
        campaign_type: CampaignType,
        audience_type: AudienceType,
        content: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            campaign_type: campaign_type.as_str().to_string(),
            status: CampaignStatus::Inactive.as_str().to_string(),
            audience_type: audience_type.as_str().to_string(),
            start_date: None,
            end_date: None,
            executed_at: None,
            target_audience: 0,
            sent: 0,
            opened: 0,
            clicked: 0,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(datetime_to_ms(start));
        self
    }

    pub fn with_end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(datetime_to_ms(end));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn get_campaign_type(&self) -> Result<CampaignType> {
        parse_column(&self.id, "campaign_type", &self.campaign_type)
    }

    pub fn get_status(&self) -> Result<CampaignStatus> {
        parse_column(&self.id, "status", &self.status)
    }

    pub fn get_audience_type(&self) -> Result<AudienceType> {
        parse_column(&self.id, "audience_type", &self.audience_type)
    }

    pub fn get_start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(ms_to_datetime)
    }

    pub fn get_executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at.map(ms_to_datetime)
    }

    pub fn is_executed(&self) -> bool {
        self.executed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_strings() {
        assert_eq!(CampaignType::Mixed.as_str(), "MIXED");
        assert_eq!(CampaignStatus::Inactive.as_str(), CampaignStatus::Inactive.to_string());
        assert_eq!(AudienceType::Clients.as_str(), "CLIENTS");
        assert_eq!(CampaignType::from_str("PUSH").unwrap(), CampaignType::Push);
        assert_eq!(AudienceType::Employees.to_string(), "EMPLOYEES");
        assert_eq!(
            CampaignStatus::from_str("ACTIVE").unwrap(),
            CampaignStatus::Active
        );
        assert!(AudienceType::from_str("everyone").is_err());
    }

    #[test]
    fn test_new_campaign_defaults() {
        let campaign = CampaignDbModel::new("Spring", CampaignType::Email, AudienceType::All, "hi");
        assert_eq!(campaign.get_status().unwrap(), CampaignStatus::Inactive);
        assert_eq!(campaign.get_campaign_type().unwrap(), CampaignType::Email);
        assert!(campaign.start_date.is_none());
        assert!(!campaign.is_executed());
        assert_eq!(campaign.sent, 0);
    }

    #[test]
    fn test_invalid_column_is_validation_error() {
        let mut campaign = CampaignDbModel::new("x", CampaignType::Push, AudienceType::All, "");
        campaign.audience_type = "SOMEONE".to_string();
        assert!(matches!(
            campaign.get_audience_type(),
            Err(Error::Validation(_))
        ));
    }
}
