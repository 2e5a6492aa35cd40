//! Request and response messages exchanged between client and server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version announced by the server in [`Response::Welcome`].
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Handshake. Must be the first frame on every connection.
    Hello {
        /// Name the client announces, for server-side logging.
        client_name: String,
        /// Whether the client intends to register subscriptions. Recorded
        /// by the server; no push channel is established yet.
        #[serde(default)]
        subscription_enabled: bool,
    },
    /// Liveness probe. Pooled connections send these while parked.
    Ping,
    /// Create the named region if it does not exist yet.
    EnsureRegion {
        /// Region name.
        region: String,
        /// Idle timeout for entries, in whole seconds. `None` means entries
        /// never expire.
        #[serde(skip_serializing_if = "Option::is_none")]
        idle_timeout_secs: Option<u64>,
    },
    /// Read the value stored under a key.
    Get { region: String, key: String },
    /// Store a value under a key, restarting its idle countdown.
    Put {
        region: String,
        key: String,
        value: Value,
    },
    /// Delete a key immediately, regardless of any idle timeout.
    Remove { region: String, key: String },
}

/// Messages sent from server to client. Every request gets exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Handshake reply.
    Welcome {
        /// Name the server announces.
        server_name: String,
        /// Protocol version the server speaks.
        version: u32,
    },
    /// Reply to [`Request::Ping`].
    Pong,
    /// Reply to [`Request::EnsureRegion`].
    RegionReady { region: String },
    /// Reply to [`Request::Get`]. `None` covers both a key that was never
    /// stored and one the server already expired; the client cannot tell
    /// the two apart.
    Value { value: Option<Value> },
    /// Reply to [`Request::Put`] and [`Request::Remove`]. `existed` reports
    /// whether a live entry was present beforehand.
    Done { existed: bool },
    /// The request could not be served.
    Error { code: ErrorCode, message: String },
}

impl Response {
    /// Create an error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }
}

/// Failure categories a server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The named region does not exist on this server.
    NoSuchRegion,
    /// The request was malformed or arrived out of order.
    BadRequest,
    /// The server failed internally.
    Internal,
}
