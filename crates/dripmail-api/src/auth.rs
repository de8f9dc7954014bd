//! Worker tick authentication
//!
//! The tick endpoints are triggered by an external cron-style caller and
//! carry a shared secret bearer token, distinct from user auth (which is an
//! external collaborator and never reaches this service).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dripmail_engine::{DispatchWorker, DripScheduler, ScheduledEmailManager};
use dripmail_storage::repository::CampaignRepository;
use dripmail_storage::DatabasePool;
use std::sync::Arc;
use tracing::warn;

use crate::handlers::ErrorResponse;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabasePool,
    pub manager: ScheduledEmailManager,
    pub worker: DispatchWorker,
    pub drip: DripScheduler,
    pub campaigns: CampaignRepository,
    pub worker_token: String,
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Constant shared-secret comparison
pub fn token_matches(presented: Option<&str>, expected: &str) -> bool {
    matches!(presented, Some(token) if token == expected)
}

/// Reject tick requests without the shared worker secret
///
/// Runs before any batch work begins.
pub async fn worker_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if token_matches(extract_bearer(&req), &state.worker_token) {
        return next.run(req).await;
    }

    warn!("Worker tick rejected: missing or invalid token");

    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: "Missing or invalid worker token".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches(Some("secret"), "secret"));
        assert!(!token_matches(Some("wrong"), "secret"));
        assert!(!token_matches(Some(""), "secret"));
        assert!(!token_matches(None, "secret"));
    }

    #[test]
    fn test_extract_bearer() {
        let req = Request::builder()
            .header("authorization", "Bearer abc123")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_bearer(&req), Some("abc123"));

        let req = Request::builder()
            .header("authorization", "Basic abc123")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_bearer(&req), None);

        let req = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_bearer(&req), None);
    }
}
