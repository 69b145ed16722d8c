//! Ingest Error Types
//!
//! This module provides ingest-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use relay::RelayError;
use thiserror::Error;

/// Ingest-specific result type alias
pub type IngestResult<T> = Result<T, IngestError>;

/// Ingest-specific error variants
#[derive(Debug, Error)]
pub enum IngestError {
    /// Webhook record could not be converted into a transaction record
    #[error("Malformed webhook record: {0}")]
    MalformedRecord(String),

    /// Webhook callback failed the shared-secret check
    #[error("Webhook authorization failed")]
    Unauthorized,

    /// Webhook-management API call failed
    #[error("Watch-list provider error: {0}")]
    Provider(String),

    /// Metadata pointer could not be fetched or parsed
    #[error("Metadata fetch failed: {0}")]
    Metadata(String),

    /// Chain read or nonce reconciliation failed
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::MalformedRecord(_) => StatusCode::BAD_REQUEST,
            IngestError::Unauthorized => StatusCode::UNAUTHORIZED,
            IngestError::Provider(_) | IngestError::Metadata(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            IngestError::Relay(e) => e.status_code(),
            IngestError::Database(_) | IngestError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::MalformedRecord(_) => ErrorKind::BadRequest,
            IngestError::Unauthorized => ErrorKind::Unauthorized,
            IngestError::Provider(_) | IngestError::Metadata(_) => ErrorKind::ServiceUnavailable,
            IngestError::Relay(e) => e.kind(),
            IngestError::Database(_) | IngestError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            IngestError::Database(e) => {
                tracing::error!(error = %e, "Ingest database error");
            }
            IngestError::Internal(msg) => {
                tracing::error!(message = %msg, "Ingest internal error");
            }
            IngestError::Unauthorized => {
                tracing::warn!("Webhook callback rejected: bad authorization");
            }
            _ => {
                tracing::debug!(error = %self, "Ingest error");
            }
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message)
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // Return empty body for security (don't leak details)
        (status, ()).into_response()
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Provider(err.to_string())
    }
}
