//! Scheduled email handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dripmail_common::types::ScheduledEmailStatus;
use dripmail_common::Error;
use dripmail_engine::{CreateScheduledEmailRequest, UpdateScheduledEmailRequest};
use dripmail_storage::models::ScheduledEmail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Query parameters for listing scheduled emails
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

/// Response for listing scheduled emails
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub scheduled_emails: Vec<ScheduledEmail>,
    pub count: usize,
}

/// Schedule a new email
///
/// POST /api/v1/tenants/:tenant_id/scheduled-emails
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<CreateScheduledEmailRequest>,
) -> Result<(StatusCode, Json<ScheduledEmail>), (StatusCode, Json<ErrorResponse>)> {
    let email = state
        .manager
        .create(tenant_id, request)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(email)))
}

/// List scheduled emails, soonest first
///
/// GET /api/v1/tenants/:tenant_id/scheduled-emails
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(ref status) = query.status {
        if ScheduledEmailStatus::parse(status).is_none() {
            return Err(error_response(Error::Validation(format!(
                "Unknown status: {}",
                status
            ))));
        }
    }

    let emails = state
        .manager
        .list(tenant_id, query.status.as_deref(), query.limit, query.offset)
        .await
        .map_err(error_response)?;

    let count = emails.len();
    Ok(Json(ListResponse {
        scheduled_emails: emails,
        count,
    }))
}

/// Get one scheduled email
///
/// GET /api/v1/tenants/:tenant_id/scheduled-emails/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ScheduledEmail>, (StatusCode, Json<ErrorResponse>)> {
    let email = state
        .manager
        .get(tenant_id, id)
        .await
        .map_err(error_response)?;

    Ok(Json(email))
}

/// Edit a pending scheduled email
///
/// PATCH /api/v1/tenants/:tenant_id/scheduled-emails/:id
pub async fn edit(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateScheduledEmailRequest>,
) -> Result<Json<ScheduledEmail>, (StatusCode, Json<ErrorResponse>)> {
    let email = state
        .manager
        .edit(tenant_id, id, request)
        .await
        .map_err(error_response)?;

    Ok(Json(email))
}

/// Cancel a pending scheduled email
///
/// POST /api/v1/tenants/:tenant_id/scheduled-emails/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ScheduledEmail>, (StatusCode, Json<ErrorResponse>)> {
    let email = state
        .manager
        .cancel(tenant_id, id)
        .await
        .map_err(error_response)?;

    Ok(Json(email))
}
