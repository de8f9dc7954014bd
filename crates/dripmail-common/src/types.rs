//! Common types for Dripmail

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for tenants
pub type TenantId = Uuid;

/// Unique identifier for users
pub type UserId = Uuid;

/// Unique identifier for mail accounts
pub type MailAccountId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for campaign steps
pub type CampaignStepId = Uuid;

/// Unique identifier for campaign leads
pub type CampaignLeadId = Uuid;

/// Unique identifier for scheduled emails
pub type ScheduledEmailId = Uuid;

/// Email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    pub local: String,
    pub domain: String,
}

impl EmailAddress {
    /// Create a new email address
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Parse an email address from a string
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.splitn(2, '@').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Some(Self::new(parts[0], parts[1]))
        } else {
            None
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

impl std::str::FromStr for EmailAddress {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::Validation("Invalid email address".to_string()))
    }
}

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CampaignStatus::Draft),
            "active" => Some(CampaignStatus::Active),
            "paused" => Some(CampaignStatus::Paused),
            "completed" => Some(CampaignStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Campaign step kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Send,
    Wait,
}

impl StepKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "send" => Some(StepKind::Send),
            "wait" => Some(StepKind::Wait),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Send => write!(f, "send"),
            StepKind::Wait => write!(f, "wait"),
        }
    }
}

/// Campaign lead progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Active,
    Completed,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::Active => write!(f, "active"),
            LeadStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Scheduled email lifecycle status
///
/// `Processing` is the transient claim state taken by the dispatch worker
/// before the SMTP call; rows never rest in it across ticks on a healthy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledEmailStatus {
    Pending,
    Processing,
    Sent,
    Failed,
    Cancelled,
}

impl ScheduledEmailStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ScheduledEmailStatus::Pending),
            "processing" => Some(ScheduledEmailStatus::Processing),
            "sent" => Some(ScheduledEmailStatus::Sent),
            "failed" => Some(ScheduledEmailStatus::Failed),
            "cancelled" => Some(ScheduledEmailStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScheduledEmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduledEmailStatus::Pending => write!(f, "pending"),
            ScheduledEmailStatus::Processing => write!(f, "processing"),
            ScheduledEmailStatus::Sent => write!(f, "sent"),
            ScheduledEmailStatus::Failed => write!(f, "failed"),
            ScheduledEmailStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_address_parse() {
        let email = EmailAddress::parse("user@example.com").unwrap();
        assert_eq!(email.local, "user");
        assert_eq!(email.domain, "example.com");
        assert_eq!(email.to_string(), "user@example.com");
    }

    #[test]
    fn test_email_address_invalid() {
        assert!(EmailAddress::parse("invalid").is_none());
        assert!(EmailAddress::parse("@example.com").is_none());
        assert!(EmailAddress::parse("user@").is_none());
    }

    #[test]
    fn test_step_kind_roundtrip() {
        assert_eq!(StepKind::parse("send"), Some(StepKind::Send));
        assert_eq!(StepKind::parse("wait"), Some(StepKind::Wait));
        assert_eq!(StepKind::parse("email"), None);
        assert_eq!(StepKind::Send.to_string(), "send");
    }

    #[test]
    fn test_scheduled_email_status_roundtrip() {
        for s in ["pending", "processing", "sent", "failed", "cancelled"] {
            let parsed = ScheduledEmailStatus::parse(s).unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert_eq!(ScheduledEmailStatus::parse("bounced"), None);
    }
}
