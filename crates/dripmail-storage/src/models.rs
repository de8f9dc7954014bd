//! Database models

use chrono::{DateTime, Utc};
use dripmail_common::types::{
    CampaignId, CampaignLeadId, CampaignStepId, MailAccountId, ScheduledEmailId, TenantId, UserId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outbound mail account
///
/// Read-only to the schedulers; credentials stay encrypted until the moment
/// of dispatch.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MailAccount {
    pub id: MailAccountId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub name: String,
    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_secure: bool,
    pub imap_host: Option<String>,
    pub imap_port: Option<i32>,
    pub imap_secure: bool,
    pub username: String,
    pub encrypted_password: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Drip campaign
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub tenant_id: TenantId,
    pub name: String,
    pub status: String,
    pub account_id: Option<MailAccountId>,
    pub sent_count: i32,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One step of a drip campaign
///
/// `step_order` is unique and ascending within a campaign; steps are applied
/// strictly in order. Send steps carry subject/html, wait steps a delay.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignStep {
    pub id: CampaignStepId,
    pub campaign_id: CampaignId,
    pub step_order: i32,
    pub kind: String,
    pub subject: Option<String>,
    pub html_body: Option<String>,
    pub delay_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Per-recipient progress cursor within a campaign
///
/// `current_step` holds the order of the last completed step (0 = none);
/// `next_due` NULL means due now.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignLead {
    pub id: CampaignLeadId,
    pub campaign_id: CampaignId,
    pub lead_email: String,
    pub status: String,
    pub current_step: i32,
    pub next_due: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One-off email scheduled for a future instant
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduledEmail {
    pub id: ScheduledEmailId,
    pub tenant_id: TenantId,
    pub account_id: MailAccountId,
    pub to_address: String,
    pub cc_address: Option<String>,
    pub bcc_address: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create scheduled email input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledEmail {
    pub tenant_id: TenantId,
    pub account_id: MailAccountId,
    pub to_address: String,
    pub cc_address: Option<String>,
    pub bcc_address: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
}

/// Full field set written back by a pending-only edit
///
/// The manager merges the partial request into the current row before the
/// guarded update, so every column is present here.
#[derive(Debug, Clone)]
pub struct ScheduledEmailUpdate {
    pub to_address: String,
    pub cc_address: Option<String>,
    pub bcc_address: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
}

/// Activity log entry input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordActivity {
    pub tenant_id: TenantId,
    pub actor_id: Option<UserId>,
    pub kind: String,
    pub description: String,
    pub subject_type: String,
    pub subject_id: Option<uuid::Uuid>,
}
