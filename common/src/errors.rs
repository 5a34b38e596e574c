//! Application error taxonomy.
//!
//! A closed set of tagged error variants, each mapped to an HTTP status at
//! the response boundary. The gateway does not retry and does not distinguish
//! client-caused from transient infrastructure failures; everything surfaces
//! as a 400 with a descriptive message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Convenience alias for results carrying an [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// All error conditions the gateway can report.
#[derive(Debug, Error)]
pub enum AppError {
    /// A filter or content key in an update payload does not name an
    /// existing column of the target table.
    #[error("unknown column in update payload: {0}")]
    UnknownColumn(String),

    /// The target database does not exist on the server.
    #[error("target database does not exist: {0}")]
    DatabaseMissing(String),

    /// A raw statement other than SELECT was submitted.
    #[error("only SELECT statements are accepted: {0}")]
    ReadOnlyViolation(String),

    /// The request body failed validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The database connection could not be established.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A database statement failed to execute.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),
}

impl AppError {
    /// HTTP status for this error. Matched exhaustively so that a new
    /// variant cannot ship without a mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnknownColumn(_)
            | AppError::DatabaseMissing(_)
            | AppError::ReadOnlyViolation(_)
            | AppError::Validation(_)
            | AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
