//! Error types for the Performance Platform client.
//!
//! # Design
//! Failures are classified where they happen. `RequestFailed` carries the raw
//! status code and body so callers (and the 404 wrapper in `client`) can
//! branch on the status. Retryable statuses never reach the caller unless the
//! retry budget was exhausted, in which case the last response is reported as
//! an ordinary `RequestFailed`.

use thiserror::Error;

/// Errors returned by `Client` and the façades built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client was constructed with an invalid base URL, token or
    /// configuration document.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A chunked post was requested for a payload that is not a sequence.
    #[error("cannot chunk payload: {0}")]
    Chunking(String),

    /// The server answered with an error status.
    #[error("HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The HTTP exchange itself failed (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Gzip compression of the request body failed.
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

impl ClientError {
    /// The HTTP status of a `RequestFailed` error, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
