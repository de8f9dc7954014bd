//! Activity log repository
//!
//! Fire-and-forget sink: a failed insert is logged and swallowed so the
//! calling operation never fails because of bookkeeping.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::RecordActivity;

/// Activity log repository
#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    /// Create a new activity log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an activity entry
    pub async fn record(&self, entry: RecordActivity) {
        let id = Uuid::new_v4();

        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (
                id, tenant_id, actor_id, kind, description, subject_type, subject_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(entry.tenant_id)
        .bind(entry.actor_id)
        .bind(&entry.kind)
        .bind(&entry.description)
        .bind(&entry.subject_type)
        .bind(entry.subject_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(kind = %entry.kind, "Failed to record activity entry: {}", e);
        }
    }
}
