//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Every failure a files index operation can produce is one of these variants.
/// Each variant maps to exactly one HTTP status via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Index record with the given ID was not found
    #[error("File index not found: {0}")]
    NotFound(String),

    /// Indexed file could not be read from disk
    #[error("Failed to read file: {0}")]
    IoFailure(String),

    /// Create payload is missing required fields
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Malformed request parameters (e.g. negative page)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error (store failures and anything unexpected)
    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

/// Store errors carrying an `AppError` keep their variant; anything else is internal
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_error) => app_error,
            Err(err) => AppError::Internal(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::IoFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %error_message, "Request failed");
        } else {
            tracing::debug!(status = %status.as_u16(), error = %error_message, "Request rejected");
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::IoFailure("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Validation("kpi".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("page".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_anyhow_keeps_app_error_variant() {
        let wrapped = anyhow::Error::from(AppError::Validation("kpi".into()));
        assert!(matches!(AppError::from(wrapped), AppError::Validation(_)));

        let plain = anyhow::anyhow!("disk full");
        assert!(matches!(AppError::from(plain), AppError::Internal(_)));
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("42".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
