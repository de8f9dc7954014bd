//! Campaign handlers
//!
//! Campaigns and their steps are authored in the admin UI (an external
//! collaborator); this surface only reads them and triggers a scoped run.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dripmail_common::types::CampaignStatus;
use dripmail_common::Error;
use dripmail_engine::DripSummary;
use dripmail_storage::models::{Campaign, CampaignStep};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Query parameters for listing campaigns
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Response for listing campaigns
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub campaigns: Vec<Campaign>,
    pub count: usize,
}

/// Campaign with its ordered steps
#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    pub campaign: Campaign,
    pub steps: Vec<CampaignStep>,
}

/// List campaigns for a tenant
///
/// GET /api/v1/tenants/:tenant_id/campaigns
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(ref status) = query.status {
        if CampaignStatus::parse(status).is_none() {
            return Err(error_response(Error::Validation(format!(
                "Unknown status: {}",
                status
            ))));
        }
    }

    let campaigns = state
        .campaigns
        .list_by_tenant(tenant_id, query.status.as_deref(), query.limit, query.offset)
        .await
        .map_err(|e| error_response(Error::Database(e.to_string())))?;

    let count = campaigns.len();
    Ok(Json(ListResponse { campaigns, count }))
}

/// Get one campaign with its steps
///
/// GET /api/v1/tenants/:tenant_id/campaigns/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignDetail>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .get_by_tenant(tenant_id, id)
        .await
        .map_err(|e| error_response(Error::Database(e.to_string())))?
        .ok_or_else(|| error_response(Error::NotFound("Campaign not found".to_string())))?;

    let steps = state
        .campaigns
        .list_steps(campaign.id)
        .await
        .map_err(|e| error_response(Error::Database(e.to_string())))?;

    Ok(Json(CampaignDetail { campaign, steps }))
}

/// Advance the due leads of one campaign now
///
/// POST /api/v1/tenants/:tenant_id/campaigns/:id/run
pub async fn run(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DripSummary>, (StatusCode, Json<ErrorResponse>)> {
    let summary = state
        .drip
        .run_campaign(tenant_id, id)
        .await
        .map_err(error_response)?;

    Ok(Json(summary))
}
