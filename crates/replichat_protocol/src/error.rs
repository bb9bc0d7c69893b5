//! Error types for protocol decoding and validation.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or validating protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body is not valid JSON or does not match the message shape.
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The request carries no `clientID`.
    #[error("missing clientID")]
    MissingClientId,

    /// The `clientID` is present but empty.
    #[error("empty clientID")]
    EmptyClientId,

    /// The cookie is present but not a non-negative integer.
    #[error("malformed cookie: {0}")]
    MalformedCookie(String),

    /// The `pullVersion` is present but not a non-negative integer.
    #[error("malformed pullVersion: {0}")]
    MalformedPullVersion(String),
}
