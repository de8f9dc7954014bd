//! Scheduled email repository

use dripmail_common::types::{ScheduledEmailId, TenantId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateScheduledEmail, ScheduledEmail, ScheduledEmailUpdate};

/// Scheduled email repository
#[derive(Clone)]
pub struct ScheduledEmailRepository {
    pool: PgPool,
}

impl ScheduledEmailRepository {
    /// Create a new scheduled email repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new scheduled email
    pub async fn create(
        &self,
        input: CreateScheduledEmail,
    ) -> Result<ScheduledEmail, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, ScheduledEmail>(
            r#"
            INSERT INTO scheduled_emails (
                id, tenant_id, account_id, to_address, cc_address, bcc_address,
                subject, text_body, html_body, attachments, scheduled_at,
                status, attempts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', 0)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.tenant_id)
        .bind(input.account_id)
        .bind(&input.to_address)
        .bind(&input.cc_address)
        .bind(&input.bcc_address)
        .bind(&input.subject)
        .bind(&input.text_body)
        .bind(&input.html_body)
        .bind(&input.attachments)
        .bind(input.scheduled_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a scheduled email by ID and tenant
    pub async fn get_by_tenant(
        &self,
        tenant_id: TenantId,
        id: ScheduledEmailId,
    ) -> Result<Option<ScheduledEmail>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledEmail>(
            "SELECT * FROM scheduled_emails WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List scheduled emails for a tenant
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ScheduledEmail>, sqlx::Error> {
        if let Some(status) = status {
            sqlx::query_as::<_, ScheduledEmail>(
                r#"
                SELECT * FROM scheduled_emails
                WHERE tenant_id = $1 AND status = $2
                ORDER BY scheduled_at ASC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(tenant_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, ScheduledEmail>(
                r#"
                SELECT * FROM scheduled_emails
                WHERE tenant_id = $1
                ORDER BY scheduled_at ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(tenant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        }
    }

    /// Overwrite the editable fields of a still-pending email
    ///
    /// The status guard makes the edit lose cleanly to a concurrent dispatch:
    /// once the worker has claimed the row, this returns None.
    pub async fn update_pending(
        &self,
        tenant_id: TenantId,
        id: ScheduledEmailId,
        update: ScheduledEmailUpdate,
    ) -> Result<Option<ScheduledEmail>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledEmail>(
            r#"
            UPDATE scheduled_emails SET
                to_address = $3,
                cc_address = $4,
                bcc_address = $5,
                subject = $6,
                text_body = $7,
                html_body = $8,
                attachments = $9,
                scheduled_at = $10,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&update.to_address)
        .bind(&update.cc_address)
        .bind(&update.bcc_address)
        .bind(&update.subject)
        .bind(&update.text_body)
        .bind(&update.html_body)
        .bind(&update.attachments)
        .bind(update.scheduled_at)
        .fetch_optional(&self.pool)
        .await
    }

    /// Cancel a still-pending email
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        id: ScheduledEmailId,
    ) -> Result<Option<ScheduledEmail>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledEmail>(
            r#"
            UPDATE scheduled_emails SET
                status = 'cancelled',
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get pending emails whose scheduled time has passed
    pub async fn fetch_due(&self, limit: i64) -> Result<Vec<ScheduledEmail>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledEmail>(
            r#"
            SELECT * FROM scheduled_emails
            WHERE status = 'pending'
              AND scheduled_at <= NOW()
            ORDER BY scheduled_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Claim a due email for dispatch
    ///
    /// Conditional on the row still being pending, so a second overlapping
    /// tick skips rows the first one already took.
    pub async fn claim(&self, id: ScheduledEmailId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_emails SET
                status = 'processing',
                attempts = attempts + 1,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a claimed email as sent
    pub async fn mark_sent(&self, id: ScheduledEmailId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE scheduled_emails SET
                status = 'sent',
                sent_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a claimed email as failed, recording the error text
    pub async fn mark_failed(&self, id: ScheduledEmailId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE scheduled_emails SET
                status = 'failed',
                last_error = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
