//! Error types for Roomdesk server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error kinds exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Conflict,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalError => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A unique constraint rejected a write. Callers that can recover
    /// (idempotent creation) match on this before it reaches a client.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Request deadline elapsed before a response was produced
    #[error("Request timed out")]
    Timeout,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) | AppError::UniqueViolation(_) => ErrorKind::Conflict,
            AppError::Database(_) | AppError::Internal(_) | AppError::Timeout => {
                ErrorKind::InternalError
            }
        }
    }

    /// HTTP status; a timeout keeps the InternalError kind but answers 408
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            _ => self.kind().status(),
        }
    }

    /// Message safe to return to a client
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::UniqueViolation(_) => "Unique constraint violation".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong".to_string(),
            AppError::Timeout => "Request timed out".to_string(),
        }
    }
}

// Postgres SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::UniqueViolation(
                        db_err.constraint().unwrap_or("unknown").to_string(),
                    );
                }
                Some(EXCLUSION_VIOLATION) => {
                    return AppError::Conflict("Overlapping booking exists".to_string());
                }
                Some(CHECK_VIOLATION) => {
                    return AppError::Validation(format!(
                        "Value rejected by constraint {}",
                        db_err.constraint().unwrap_or("unknown")
                    ));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl AppError {
    /// First validation failure, taking fields in `field_order` first and
    /// any others alphabetically after them
    pub fn from_validation(errors: validator::ValidationErrors, field_order: &[&str]) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| {
            let name: &str = field.as_ref();
            let rank = field_order
                .iter()
                .position(|f| *f == name)
                .unwrap_or(field_order.len());
            (rank, name.to_string())
        });

        let message = fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .unwrap_or_else(|| "Invalid request".to_string());

        AppError::Validation(message)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::from_validation(errors, &[])
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// One of ValidationError, NotFound, Conflict, InternalError
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Timeout => tracing::warn!("Request deadline elapsed"),
            AppError::UniqueViolation(constraint) => {
                tracing::warn!(constraint = %constraint, "Unrecovered unique constraint violation")
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        let body = Json(ErrorResponse {
            error: kind.as_str().to_string(),
            message: self.public_message(),
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
