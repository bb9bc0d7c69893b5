//! Error types for the sync server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use replichat_protocol::ProtocolError;
use replichat_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The request body or one of its fields is invalid.
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ProtocolError),

    /// The client speaks a different pull protocol version.
    #[error("unsupported pull version: expected {expected}, got {actual}")]
    UnsupportedPullVersion {
        /// Version the server accepts.
        expected: u64,
        /// Version the client sent.
        actual: u64,
    },

    /// The store could not be read.
    #[error("store failure: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::MalformedRequest(_) | ServerError::UnsupportedPullVersion { .. }
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::warn!(error = %self, "rejected pull");
        } else {
            tracing::error!(error = %self, "pull failed");
        }
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        let malformed = ServerError::from(ProtocolError::MissingClientId);
        assert!(malformed.is_client_error());
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

        let store = ServerError::from(StoreError::Unavailable("down".into()));
        assert!(store.is_server_error());
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        assert!(!ServerError::Internal("oops".into()).is_client_error());
    }

    #[test]
    fn error_display() {
        let err = ServerError::UnsupportedPullVersion {
            expected: 0,
            actual: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('0'));
        assert!(msg.contains('5'));

        let err = ServerError::from(StoreError::Unavailable("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
    }
}
