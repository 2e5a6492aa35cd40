//! Server error types.

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors produced by the cache server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind, accept, or read the listener address.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A connection broke the protocol rules.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Framing error on a connection.
    #[error(transparent)]
    Proto(#[from] pyrope_proto::ProtoError),
}

impl ServerError {
    /// Create a protocol violation error.
    pub fn protocol(message: impl Into<String>) -> Self {
        ServerError::Protocol(message.into())
    }
}
