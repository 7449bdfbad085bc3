//! Error types for dermal-ai

use crate::services::PaymentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dermal_common::payment::ErrorBody;
use thiserror::Error;
use tracing::error;

/// API error type
///
/// The analyze endpoint never produces one; model failures are absorbed by
/// the fallback path.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No payment processor key configured (503)
    #[error("Payment is not configured")]
    PaymentNotConfigured,

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error (500); detail is logged, not returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidAmount => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::PaymentNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
