//! Typed key/value access to a remote region.

use std::marker::PhantomData;
use std::time::Duration;

use pyrope_proto::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pool::Pool;

/// Base delay between attempts; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration for a remote region.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Region name on the server.
    pub name: String,
    /// Idle timeout the server enforces per entry. `None` disables
    /// expiration.
    pub idle_timeout: Option<Duration>,
}

impl RegionConfig {
    /// Create a configuration for the named region with no expiration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            idle_timeout: None,
        }
    }

    /// Set the per-entry idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// Typed handle to a named key/value namespace on the cache tier.
///
/// Every call borrows a pooled connection for exactly one exchange and
/// applies the pool's retry policy. A `get` returning `None` means the key
/// holds no live value; whether it was never written or already expired is
/// deliberately not distinguishable.
pub struct Region<V> {
    pool: Pool,
    name: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for Region<V> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            name: self.name.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> Region<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Ensure the named region exists on the server and return a handle.
    ///
    /// Creation is idempotent. A region that already exists keeps the idle
    /// timeout it was first created with.
    pub async fn create(pool: Pool, config: RegionConfig) -> Result<Self> {
        let RegionConfig { name, idle_timeout } = config;
        let region = Self {
            pool,
            name,
            _value: PhantomData,
        };
        let request = Request::EnsureRegion {
            region: region.name.clone(),
            idle_timeout_secs: idle_timeout.map(|t| t.as_secs()),
        };
        match region.request(request).await? {
            Response::RegionReady { .. } => {
                debug!(region = %region.name, ?idle_timeout, "region ready");
                Ok(region)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Read the value stored under `key`.
    ///
    /// `None` covers both a key that was never stored and one the server
    /// expired. Reads do not restart the server-side idle countdown.
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        let request = Request::Get {
            region: self.name.clone(),
            key: key.to_string(),
        };
        match self.request(request).await? {
            Response::Value { value: Some(value) } => Ok(Some(serde_json::from_value(value)?)),
            Response::Value { value: None } => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// Store `value` under `key`.
    ///
    /// The server restarts the key's idle countdown on every put.
    pub async fn put(&self, key: &str, value: &V) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let request = Request::Put {
            region: self.name.clone(),
            key: key.to_string(),
            value,
        };
        match self.request(request).await? {
            Response::Done { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Delete `key` immediately, regardless of any idle timeout.
    ///
    /// Returns whether a live entry was removed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let request = Request::Remove {
            region: self.name.clone(),
            key: key.to_string(),
        };
        match self.request(request).await? {
            Response::Done { existed } => Ok(existed),
            other => Err(unexpected(other)),
        }
    }

    /// The region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one request under the pool's retry policy.
    ///
    /// Transient failures are retried until the budget is spent; a read
    /// timeout on the final attempt keeps its identity, other transport
    /// failures roll up into [`Error::Unavailable`]. Server-reported errors
    /// are returned as-is, never retried.
    async fn request(&self, request: Request) -> Result<Response> {
        let total_attempts = 1 + self.pool.config().retry_attempts;
        let mut remaining = self.pool.config().retry_attempts;

        loop {
            match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && remaining > 0 => {
                    let attempt = total_attempts - remaining;
                    warn!(
                        region = %self.name,
                        attempt,
                        error = %err,
                        "attempt failed, will retry"
                    );
                    remaining -= 1;
                    sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) if err.is_retryable() => {
                    return Err(match err {
                        Error::Timeout { timeout } => Error::Timeout { timeout },
                        other => Error::Unavailable {
                            attempts: total_attempts,
                            last_error: other.to_string(),
                        },
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One acquire-exchange-release cycle.
    ///
    /// A failed exchange leaves the stream in an unknown state, so the
    /// connection is discarded. A server error rides a healthy exchange;
    /// that connection goes back into rotation.
    async fn attempt(&self, request: &Request) -> Result<Response> {
        let mut conn = self.pool.acquire().await?;
        match conn.exchange(request).await {
            Ok(Response::Error { code, message }) => Err(Error::Server { code, message }),
            Ok(response) => Ok(response),
            Err(err) => {
                conn.discard();
                Err(err)
            }
        }
    }
}

fn unexpected(response: Response) -> Error {
    Error::protocol(format!("unexpected response: {:?}", response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_config_builder() {
        let config = RegionConfig::new("sessions");
        assert_eq!(config.name, "sessions");
        assert!(config.idle_timeout.is_none());

        let config = RegionConfig::new("sessions").with_idle_timeout(Duration::from_secs(60));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(60)));
    }
}
