//! The session data model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A session held by a caller.
///
/// This is a plain value: mutating it changes nothing remotely until it is
/// saved again through the store. Expiration is enforced by the server; the
/// local [`Session::is_expired`] view is advisory and the server's answer
/// wins whenever the two disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, fixed at creation.
    pub id: SessionId,
    /// When the session was created. Never changes.
    pub creation_time: DateTime<Utc>,
    /// When the session was last touched or saved.
    pub last_accessed_time: DateTime<Utc>,
    /// Inactivity window after which the server expires the session.
    #[serde(with = "duration_secs")]
    pub max_inactive_interval: Duration,
    /// Named attributes attached to the session.
    pub attributes: HashMap<String, Value>,
}

impl Session {
    /// Create a fresh session with a random ID and no attributes.
    pub fn new(max_inactive_interval: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            creation_time: now,
            last_accessed_time: now,
            max_inactive_interval,
            attributes: HashMap::new(),
        }
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its value if it was set.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Names of all attributes, in no particular order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Mark the session as used now.
    ///
    /// Purely local: the server's idle countdown only restarts once the
    /// session is saved.
    pub fn touch(&mut self) {
        self.last_accessed_time = Utc::now();
    }

    /// The local view of whether this session has sat idle too long.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.last_accessed_time).to_std() {
            Ok(elapsed) => elapsed > self.max_inactive_interval,
            // A last-accessed time in the future is not idle.
            Err(_) => false,
        }
    }
}

/// `Duration` as whole seconds on the wire, matching how idle timeouts are
/// configured server-side.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
