//! Relay Error Types
//!
//! This module provides relay-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Relay-specific result type alias
pub type RelayResult<T> = Result<T, RelayError>;

/// Relay-specific error variants
///
/// These map to appropriate HTTP status codes and can be converted to
/// `AppError` for unified error handling.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No nonce lease could be acquired within the retry ceiling
    #[error("Nonce pool exhausted")]
    PoolExhausted,

    /// RPC call failed in a way that is safe to retry
    #[error("Transient RPC error: {0}")]
    TransientRpc(String),

    /// Confirmation polling reached its attempt ceiling
    #[error("Transaction {signature} not confirmed within the polling window")]
    ConfirmationTimeout { signature: String },

    /// A stored address or anchor value could not be parsed
    #[error("Invalid anchor data: {0}")]
    InvalidAnchor(String),

    /// Request rejected before any work was done
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transaction signing failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::TransientRpc(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::ConfirmationTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            RelayError::InvalidAnchor(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Signing(_)
            | RelayError::Database(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::PoolExhausted => ErrorKind::ServiceUnavailable,
            RelayError::TransientRpc(_) => ErrorKind::ServiceUnavailable,
            RelayError::ConfirmationTimeout { .. } => ErrorKind::RequestTimeout,
            RelayError::InvalidAnchor(_) => ErrorKind::UnprocessableEntity,
            RelayError::InvalidRequest(_) => ErrorKind::BadRequest,
            RelayError::Signing(_)
            | RelayError::Database(_)
            | RelayError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            RelayError::Database(e) => {
                tracing::error!(error = %e, "Relay database error");
            }
            RelayError::Signing(msg) | RelayError::Internal(msg) => {
                tracing::error!(message = %msg, "Relay internal error");
            }
            RelayError::PoolExhausted => {
                tracing::warn!("Nonce pool exhausted");
            }
            RelayError::ConfirmationTimeout { signature } => {
                tracing::warn!(signature = %signature, "Confirmation timed out");
            }
            _ => {
                tracing::debug!(error = %self, "Relay error");
            }
        }
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // Return empty body for security (don't leak details)
        (status, ()).into_response()
    }
}

impl From<solana_client::client_error::ClientError> for RelayError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        RelayError::TransientRpc(err.to_string())
    }
}

impl From<solana_sdk::signer::SignerError> for RelayError {
    fn from(err: solana_sdk::signer::SignerError) -> Self {
        RelayError::Signing(err.to_string())
    }
}
