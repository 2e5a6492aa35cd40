//! Client error types.

use std::time::Duration;

use pyrope_proto::{ErrorCode, ProtoError};
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the pool, regions, and the session store.
///
/// The split that matters to callers: [`Error::Connection`] means startup
/// failed and retrying is pointless until the deployment is fixed, while
/// [`Error::Unavailable`] and [`Error::Timeout`] describe a running system
/// that could not serve one operation. An absent key is never an error;
/// reads report it as `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// No configured endpoint accepted a connection when the pool was
    /// built. Surfaced once, at startup, and never retried automatically.
    #[error("no cache server reachable: {0}")]
    Connection(String),

    /// The retry budget for one operation ran out.
    #[error("cache unavailable after {attempts} attempt(s): {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    /// A single attempt exceeded the read timeout.
    #[error("operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Every connection was in use and none freed up within the
    /// free-connection timeout.
    #[error("connection pool exhausted (waited {waited:?})")]
    PoolExhausted { waited: Duration },

    /// The pool was closed.
    #[error("pool is closed")]
    Closed,

    /// The server answered with an error response.
    #[error("server error ({code:?}): {message}")]
    Server { code: ErrorCode, message: String },

    /// The peer sent a response that does not fit the request.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Framing error on the wire.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// IO error while dialing or talking to a server.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Whether this error reports the service as unreachable or overloaded
    /// after the retry budget was spent.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable { .. })
    }

    /// Whether this error is a per-attempt read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Transient transport failures qualify. Startup connection failures,
    /// server-reported errors, and local mistakes (bad configuration,
    /// malformed data) do not; retrying those would just repeat them.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } | Error::PoolExhausted { .. } => true,
            Error::Io(_) => true,
            Error::Proto(err) => err.is_connection_error(),
            Error::Connection(_)
            | Error::Unavailable { .. }
            | Error::Closed
            | Error::Server { .. }
            | Error::Protocol(_)
            | Error::Json(_)
            | Error::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(
            Error::Timeout {
                timeout: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(
            Error::PoolExhausted {
                waited: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(Error::Proto(ProtoError::ConnectionClosed).is_retryable());

        assert!(!Error::Connection("refused".to_string()).is_retryable());

        assert!(
            !Error::Server {
                code: ErrorCode::NoSuchRegion,
                message: "gone".to_string()
            }
            .is_retryable()
        );
        assert!(!Error::Closed.is_retryable());
        assert!(!Error::protocol("bad reply").is_retryable());
        assert!(!Error::config("bad endpoint").is_retryable());
    }

    #[test]
    fn test_predicates() {
        let unavailable = Error::Unavailable {
            attempts: 2,
            last_error: "connection closed".to_string(),
        };
        assert!(unavailable.is_unavailable());
        assert!(!unavailable.is_timeout());

        let timeout = Error::Timeout {
            timeout: Duration::from_secs(20),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_unavailable());
    }
}
