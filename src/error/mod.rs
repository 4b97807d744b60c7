//! Centralized API error handling
//!
//! Unified error type for API responses with HTTP status code mapping and
//! JSON error bodies. Domain failures keep their kind visible to the
//! client: validation problems come back as 400, a disallowed transition
//! as 403, an attempt to edit a locked field as 422.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::i18n::Catalog;
use crate::loan::service::ServiceError;
use crate::loan::{LoanError, TransitionError, ValidationError};

/// API error type with HTTP status code mapping.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Transition not authorized: {0}")]
    TransitionNotAuthorized(TransitionError),

    #[error("Field not updatable: {0}")]
    FieldNotUpdatable(TransitionError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response.
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::TransitionNotAuthorized(_) => "TRANSITION_NOT_AUTHORIZED",
            ApiError::FieldNotUpdatable(_) => "FIELD_NOT_UPDATABLE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::TransitionNotAuthorized(_) => StatusCode::FORBIDDEN,
            ApiError::FieldNotUpdatable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Validation messages are rendered through the catalog; everything
        // else uses the Display form.
        let (message, field) = match &self {
            ApiError::Validation(err) => (
                err.message(&Catalog),
                err.field.map(str::to_string),
            ),
            ApiError::FieldNotUpdatable(err) | ApiError::TransitionNotAuthorized(err) => {
                let field = match err {
                    TransitionError::FieldNotUpdatable(field) => Some(field.clone()),
                    TransitionError::NotAuthorized { field, .. } => Some(field.to_string()),
                };
                (err.to_string(), field)
            }
            other => (other.to_string(), None),
        };

        match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from domain error types

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::FieldNotUpdatable(_) => ApiError::FieldNotUpdatable(err),
            TransitionError::NotAuthorized { .. } => ApiError::TransitionNotAuthorized(err),
        }
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Validation(err) => err.into(),
            LoanError::Transition(err) => err.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(id) => ApiError::NotFound(format!("loan {id}")),
            ServiceError::Loan(err) => err.into(),
            ServiceError::Database(err) => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
