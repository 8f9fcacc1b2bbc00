// HTTP-facing error type for the URL filter API
use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::url_filter::UrlFilterError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal server error")]
    InternalError,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::InvalidUrl(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ServiceError::CacheError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<UrlFilterError> for ServiceError {
    fn from(error: UrlFilterError) -> Self {
        match error {
            UrlFilterError::InvalidUrl(kind) => ServiceError::InvalidUrl(kind.to_string()),
            UrlFilterError::CacheWrite(e) => {
                error!("Fatal cache write failure: {}", e);
                ServiceError::CacheError(format!("Failed to cache verdict: {}", e))
            },
            UrlFilterError::Internal(msg) => {
                error!("URL filter failed: {}", msg);
                ServiceError::InternalError
            },
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServiceError {
    fn from(rejection: MultipartRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ServiceError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::PayloadTooLarge(error.body_text())
        } else {
            ServiceError::BadRequest(error.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::utils::url_classifier::InvalidUrlKind;

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (
                ServiceError::from(UrlFilterError::InvalidUrl(InvalidUrlKind::Scheme(
                    "gemini".to_string(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::from(UrlFilterError::CacheWrite(CacheError::Timeout(3000))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::from(UrlFilterError::Internal("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::PayloadTooLarge("too big".to_string()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
        ];

        for (error, expected) in cases {
            let message = error.to_string();
            assert_eq!(error.into_response().status(), expected, "Error: {}", message);
        }
    }
}
