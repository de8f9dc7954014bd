//! Campaign lead repository
//!
//! Leads carry no tenant column of their own; tenant scope always arrives
//! transitively through the owning campaign.

use chrono::{DateTime, Utc};
use dripmail_common::types::{CampaignId, CampaignLeadId, TenantId};
use sqlx::PgPool;

use crate::models::CampaignLead;

/// Campaign lead repository
#[derive(Clone)]
pub struct CampaignLeadRepository {
    pool: PgPool,
}

impl CampaignLeadRepository {
    /// Create a new campaign lead repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get due leads across all active campaigns
    ///
    /// A lead is due when it is active, its campaign is active and not soft
    /// deleted, and next_due is NULL or in the past.
    pub async fn fetch_due(&self, limit: i64) -> Result<Vec<CampaignLead>, sqlx::Error> {
        sqlx::query_as::<_, CampaignLead>(
            r#"
            SELECT l.* FROM campaign_leads l
            JOIN campaigns c ON c.id = l.campaign_id
            WHERE l.status = 'active'
              AND c.status = 'active'
              AND c.deleted_at IS NULL
              AND (l.next_due IS NULL OR l.next_due <= NOW())
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Get due leads for one campaign within a tenant
    pub async fn fetch_due_for_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        limit: i64,
    ) -> Result<Vec<CampaignLead>, sqlx::Error> {
        sqlx::query_as::<_, CampaignLead>(
            r#"
            SELECT l.* FROM campaign_leads l
            JOIN campaigns c ON c.id = l.campaign_id
            WHERE c.id = $1
              AND c.tenant_id = $2
              AND l.status = 'active'
              AND c.status = 'active'
              AND c.deleted_at IS NULL
              AND (l.next_due IS NULL OR l.next_due <= NOW())
            LIMIT $3
            "#,
        )
        .bind(campaign_id)
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Claim a due lead by deferring it one claim window
    ///
    /// The conditional update only succeeds while the lead is still due, so
    /// two overlapping ticks cannot both claim the same row. Returns false
    /// when another tick got there first.
    pub async fn claim(
        &self,
        id: CampaignLeadId,
        deferred_until: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_leads SET
                next_due = $2,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'active'
              AND (next_due IS NULL OR next_due <= NOW())
            "#,
        )
        .bind(id)
        .bind(deferred_until)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Advance the step cursor, compare-and-swap on the previous position
    ///
    /// Returns false if the cursor moved underneath us; the caller skips the
    /// lead rather than retrying.
    pub async fn advance(
        &self,
        id: CampaignLeadId,
        from_step: i32,
        to_step: i32,
        next_due: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_leads SET
                current_step = $3,
                next_due = $4,
                updated_at = NOW()
            WHERE id = $1 AND current_step = $2 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(from_step)
        .bind(to_step)
        .bind(next_due)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a lead as completed once no steps remain
    pub async fn complete(
        &self,
        id: CampaignLeadId,
        from_step: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_leads SET
                status = 'completed',
                next_due = NULL,
                updated_at = NOW()
            WHERE id = $1 AND current_step = $2 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(from_step)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
