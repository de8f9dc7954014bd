//! API request handlers

pub mod campaigns;
pub mod health;
pub mod scheduled_emails;
pub mod worker;

use axum::{http::StatusCode, Json};
use dripmail_common::Error;
use serde::Serialize;

/// JSON error body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Map an engine error onto its HTTP representation
pub fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_maps_status() {
        let (status, body) = error_response(Error::NotFound("Campaign not found".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "NOT_FOUND");

        let (status, _) = error_response(Error::Validation("bad".to_string()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = error_response(Error::InvalidState("sent".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
