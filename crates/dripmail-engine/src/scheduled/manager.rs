//! Scheduled email lifecycle: create, edit, cancel, read
//!
//! States: pending -> {sent, failed, cancelled}, with a transient
//! `processing` claim taken by the dispatch worker. Sent rows are immutable;
//! edits and cancellation only apply while pending.

use chrono::{DateTime, Utc};
use dripmail_common::types::{MailAccountId, ScheduledEmailId, TenantId};
use dripmail_common::{Error, Result};
use dripmail_storage::models::{CreateScheduledEmail, ScheduledEmail, ScheduledEmailUpdate};
use dripmail_storage::repository::{MailAccountRepository, ScheduledEmailRepository};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

/// Request body for scheduling a new email
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduledEmailRequest {
    pub account_id: MailAccountId,
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
}

/// Request body for editing a pending email
///
/// Only fields present in the request are merged; everything else keeps its
/// stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduledEmailRequest {
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Scheduled email manager
#[derive(Clone)]
pub struct ScheduledEmailManager {
    emails: ScheduledEmailRepository,
    accounts: MailAccountRepository,
}

impl ScheduledEmailManager {
    /// Create a new scheduled email manager
    pub fn new(pool: PgPool) -> Self {
        Self {
            emails: ScheduledEmailRepository::new(pool.clone()),
            accounts: MailAccountRepository::new(pool),
        }
    }

    /// Schedule a new email
    pub async fn create(
        &self,
        tenant_id: TenantId,
        request: CreateScheduledEmailRequest,
    ) -> Result<ScheduledEmail> {
        validate_create(&request, Utc::now())?;

        // the account must be visible within the caller's tenant
        self.accounts
            .get_by_tenant(tenant_id, request.account_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound("Mail account not found".to_string()))?;

        let email = self
            .emails
            .create(CreateScheduledEmail {
                tenant_id,
                account_id: request.account_id,
                to_address: request.to,
                cc_address: request.cc,
                bcc_address: request.bcc,
                subject: request.subject,
                text_body: request.text_body,
                html_body: request.html_body,
                attachments: request.attachments,
                scheduled_at: request.scheduled_at,
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        info!(id = %email.id, scheduled_at = %email.scheduled_at, "Email scheduled");

        Ok(email)
    }

    /// Get a scheduled email
    pub async fn get(&self, tenant_id: TenantId, id: ScheduledEmailId) -> Result<ScheduledEmail> {
        self.emails
            .get_by_tenant(tenant_id, id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound("Scheduled email not found".to_string()))
    }

    /// List scheduled emails, soonest first
    pub async fn list(
        &self,
        tenant_id: TenantId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ScheduledEmail>> {
        self.emails
            .list_by_tenant(tenant_id, status, limit, offset)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Edit a pending email, merging only the provided fields
    pub async fn edit(
        &self,
        tenant_id: TenantId,
        id: ScheduledEmailId,
        request: UpdateScheduledEmailRequest,
    ) -> Result<ScheduledEmail> {
        let existing = self.get(tenant_id, id).await?;

        if existing.status != "pending" {
            return Err(Error::InvalidState(format!(
                "Cannot edit a {} email",
                existing.status
            )));
        }

        if let Some(scheduled_at) = request.scheduled_at {
            validate_schedule_time(scheduled_at, Utc::now())?;
        }

        let update = merge_update(&existing, request);

        let updated = self
            .emails
            .update_pending(tenant_id, id, update)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            // the guarded update loses to a worker claim between our read and
            // the write; surface that as a state conflict
            .ok_or_else(|| {
                Error::InvalidState("Scheduled email is no longer pending".to_string())
            })?;

        info!(id = %updated.id, "Scheduled email updated");

        Ok(updated)
    }

    /// Cancel a pending email
    pub async fn cancel(&self, tenant_id: TenantId, id: ScheduledEmailId) -> Result<ScheduledEmail> {
        if let Some(cancelled) = self
            .emails
            .cancel(tenant_id, id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
        {
            info!(id = %cancelled.id, "Scheduled email cancelled");
            return Ok(cancelled);
        }

        // distinguish a missing row from one in the wrong state
        let existing = self.get(tenant_id, id).await?;
        Err(Error::InvalidState(format!(
            "Cannot cancel a {} email",
            existing.status
        )))
    }
}

/// Validate a creation request
fn validate_create(request: &CreateScheduledEmailRequest, now: DateTime<Utc>) -> Result<()> {
    if request.to.trim().is_empty() {
        return Err(Error::Validation("Recipient is required".to_string()));
    }

    if request.subject.trim().is_empty() {
        return Err(Error::Validation("Subject is required".to_string()));
    }

    validate_schedule_time(request.scheduled_at, now)
}

/// The scheduled instant must be strictly in the future
fn validate_schedule_time(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if scheduled_at <= now {
        return Err(Error::Validation(
            "Scheduled time must be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Merge a partial edit onto the stored row
fn merge_update(
    existing: &ScheduledEmail,
    request: UpdateScheduledEmailRequest,
) -> ScheduledEmailUpdate {
    ScheduledEmailUpdate {
        to_address: request.to.unwrap_or_else(|| existing.to_address.clone()),
        cc_address: request.cc.or_else(|| existing.cc_address.clone()),
        bcc_address: request.bcc.or_else(|| existing.bcc_address.clone()),
        subject: request.subject.unwrap_or_else(|| existing.subject.clone()),
        text_body: request.text_body.or_else(|| existing.text_body.clone()),
        html_body: request.html_body.or_else(|| existing.html_body.clone()),
        attachments: request.attachments.or_else(|| existing.attachments.clone()),
        scheduled_at: request.scheduled_at.unwrap_or(existing.scheduled_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn request(scheduled_at: DateTime<Utc>) -> CreateScheduledEmailRequest {
        CreateScheduledEmailRequest {
            account_id: Uuid::new_v4(),
            to: "a@example.com".to_string(),
            cc: None,
            bcc: None,
            subject: "Hi".to_string(),
            text_body: Some("hello".to_string()),
            html_body: None,
            attachments: None,
            scheduled_at,
        }
    }

    #[test]
    fn test_create_rejects_past_schedule() {
        let now = Utc::now();
        let err = validate_create(&request(now - Duration::seconds(1)), now).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_rejects_exactly_now() {
        let now = Utc::now();
        let err = validate_create(&request(now), now).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_accepts_future_schedule() {
        let now = Utc::now();
        assert!(validate_create(&request(now + Duration::seconds(60)), now).is_ok());
    }

    #[test]
    fn test_create_rejects_missing_recipient() {
        let now = Utc::now();
        let mut r = request(now + Duration::seconds(60));
        r.to = "  ".to_string();
        assert!(matches!(
            validate_create(&r, now).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn test_create_rejects_missing_subject() {
        let now = Utc::now();
        let mut r = request(now + Duration::seconds(60));
        r.subject = String::new();
        assert!(matches!(
            validate_create(&r, now).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let now = Utc::now();
        let existing = ScheduledEmail {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            to_address: "a@example.com".to_string(),
            cc_address: Some("c@example.com".to_string()),
            bcc_address: None,
            subject: "Hi".to_string(),
            text_body: Some("hello".to_string()),
            html_body: None,
            attachments: None,
            scheduled_at: now + Duration::minutes(10),
            status: "pending".to_string(),
            attempts: 0,
            last_error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };

        let merged = merge_update(
            &existing,
            UpdateScheduledEmailRequest {
                subject: Some("Updated".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(merged.subject, "Updated");
        assert_eq!(merged.to_address, "a@example.com");
        assert_eq!(merged.cc_address, Some("c@example.com".to_string()));
        assert_eq!(merged.scheduled_at, existing.scheduled_at);
    }
}
