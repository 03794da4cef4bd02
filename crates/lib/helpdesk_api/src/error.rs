//! Application error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use helpdesk_core::chat::ChatError;
use helpdesk_core::store::StoreError;
use helpdesk_core::validation::{FieldViolation, ValidationError};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    Validation(Vec<FieldViolation>),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Misconfigured deployment. Completion failures never map here; the
    /// reply generator answers them with substitute text.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required backing service is down.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation error".into(),
                    message: None,
                    details: Some(details),
                },
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: what,
                    message: None,
                    details: None,
                },
            ),
            AppError::Configuration(detail) => {
                // Provider text may echo the credential; log only.
                error!(detail = %detail, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Configuration error".into(),
                        message: Some(
                            "The service is not properly configured. Please contact support."
                                .into(),
                        ),
                        details: None,
                    },
                )
            }
            AppError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: "Service temporarily unavailable".into(),
                    message: Some(message),
                    details: None,
                },
            ),
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".into(),
                        message: Some("Something went wrong. Please try again later.".into()),
                        details: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.violations)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(vec![FieldViolation::new("body", e.body_text())])
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Validation(v) => AppError::from(v),
            ChatError::ConversationNotFound => {
                AppError::NotFound("Conversation not found".into())
            }
            ChatError::Store(e) => AppError::from(e),
        }
    }
}
