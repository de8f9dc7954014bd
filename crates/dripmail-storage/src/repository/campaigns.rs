//! Campaign and campaign-step repository

use dripmail_common::types::{CampaignId, TenantId};
use sqlx::PgPool;

use crate::models::{Campaign, CampaignStep};

/// Campaign repository
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a campaign by ID
    ///
    /// Used by the drip scheduler after the due-lead join has already tied
    /// the lead to this campaign; caller-facing paths use `get_by_tenant`.
    pub async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a campaign by ID and tenant
    pub async fn get_by_tenant(
        &self,
        tenant_id: TenantId,
        id: CampaignId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List campaigns for a tenant
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        if let Some(status) = status {
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                WHERE tenant_id = $1 AND status = $2 AND deleted_at IS NULL
                ORDER BY created_at DESC
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
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                WHERE tenant_id = $1 AND deleted_at IS NULL
                ORDER BY created_at DESC
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

    /// List the steps of a campaign in processing order
    pub async fn list_steps(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignStep>, sqlx::Error> {
        sqlx::query_as::<_, CampaignStep>(
            r#"
            SELECT * FROM campaign_steps
            WHERE campaign_id = $1
            ORDER BY step_order ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Get the next step after the given order, if any
    ///
    /// A `None` here means the lead has walked off the end of the sequence.
    pub async fn next_step(
        &self,
        campaign_id: CampaignId,
        after_order: i32,
    ) -> Result<Option<CampaignStep>, sqlx::Error> {
        sqlx::query_as::<_, CampaignStep>(
            r#"
            SELECT * FROM campaign_steps
            WHERE campaign_id = $1 AND step_order > $2
            ORDER BY step_order ASC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .bind(after_order)
        .fetch_optional(&self.pool)
        .await
    }

    /// Increment the campaign's running sent counter
    ///
    /// Best-effort: lost updates under concurrent ticks are tolerated.
    pub async fn increment_sent_count(
        &self,
        id: CampaignId,
        by: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns SET sent_count = sent_count + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
