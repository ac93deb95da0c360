//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering wire decoding and metadata registration.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Failed to encode a record.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A session id was zero, negative or not a number.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// A process with the same name is already registered.
    #[error("process already registered: {name}")]
    DuplicateProcess {
        /// The conflicting process name.
        name: String,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() || err.is_syntax() {
            ProtocolError::MalformedResponse(err.to_string())
        } else {
            ProtocolError::Serialization(err.to_string())
        }
    }
}
