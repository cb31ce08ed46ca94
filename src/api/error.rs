//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::listing::UnknownFacet;
use crate::submission::ScoringError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown filter or sort value in the query string
    #[error("{0}")]
    InvalidFilter(#[from] UnknownFacet),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Endpoint needs a signed-in user
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Endpoint needs an admin session
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Anonymous visitor has no free checks left
    #[error("Free trial exhausted, upgrade to keep checking essays")]
    TrialExhausted,

    /// An analysis is already running for this session
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Essay scoring failed
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "INVALID_FILTER"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::TrialExhausted => (StatusCode::PAYMENT_REQUIRED, "TRIAL_EXHAUSTED"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ANALYSIS_IN_PROGRESS"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Scoring(ScoringError::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, "SCORING_TIMEOUT")
            }
            ApiError::Scoring(ScoringError::Cancelled) => {
                (StatusCode::CONFLICT, "ANALYSIS_CANCELLED")
            }
            ApiError::Scoring(ScoringError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Scoring(_) => (StatusCode::BAD_GATEWAY, "SCORING_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::TrialExhausted.status_and_code(),
            (StatusCode::PAYMENT_REQUIRED, "TRIAL_EXHAUSTED")
        );
        assert_eq!(
            ApiError::Scoring(ScoringError::Timeout).status_and_code().0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Scoring(ScoringError::Cancelled).status_and_code(),
            (StatusCode::CONFLICT, "ANALYSIS_CANCELLED")
        );
        assert_eq!(
            ApiError::Forbidden("admin only".into()).status_and_code().0,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
