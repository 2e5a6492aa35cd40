//! Error types for framing and message (de)serialization.

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors produced while reading or writing frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A frame announced or produced a body larger than the allowed maximum.
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// The peer closed the stream at a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtoError {
    /// Whether this error indicates the connection itself is no longer
    /// usable, as opposed to a malformed message on a healthy stream.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ProtoError::ConnectionClosed | ProtoError::Io(_))
    }
}
