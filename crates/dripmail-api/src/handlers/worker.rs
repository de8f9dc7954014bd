//! Worker tick handlers
//!
//! Invoked periodically by an external scheduler (cron-style). Both ticks
//! always answer with a summary; only a failing due-item query turns into an
//! error response, and the next scheduled tick retries naturally.

use axum::{extract::State, http::StatusCode, Json};
use dripmail_engine::{DripSummary, TickSummary};
use std::sync::Arc;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Dispatch due scheduled emails
///
/// POST /api/v1/worker/scheduled-emails/tick
pub async fn scheduled_emails_tick(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TickSummary>, (StatusCode, Json<ErrorResponse>)> {
    let summary = state.worker.run_tick().await.map_err(error_response)?;
    Ok(Json(summary))
}

/// Advance due campaign leads
///
/// POST /api/v1/worker/campaigns/tick
pub async fn campaigns_tick(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DripSummary>, (StatusCode, Json<ErrorResponse>)> {
    let summary = state.drip.run_tick().await.map_err(error_response)?;
    Ok(Json(summary))
}
