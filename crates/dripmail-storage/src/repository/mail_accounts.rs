//! Mail account repository
//!
//! Accounts are created by the account-setup flow elsewhere; the engine only
//! reads them, always scoped to the owning tenant.

use dripmail_common::types::{MailAccountId, TenantId};
use sqlx::PgPool;

use crate::models::MailAccount;

/// Mail account repository
#[derive(Clone)]
pub struct MailAccountRepository {
    pool: PgPool,
}

impl MailAccountRepository {
    /// Create a new mail account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a mail account by ID and tenant
    pub async fn get_by_tenant(
        &self,
        tenant_id: TenantId,
        id: MailAccountId,
    ) -> Result<Option<MailAccount>, sqlx::Error> {
        sqlx::query_as::<_, MailAccount>(
            "SELECT * FROM mail_accounts WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List mail accounts for a tenant
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MailAccount>, sqlx::Error> {
        sqlx::query_as::<_, MailAccount>(
            r#"
            SELECT * FROM mail_accounts
            WHERE tenant_id = $1
            ORDER BY created_at ASC
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
