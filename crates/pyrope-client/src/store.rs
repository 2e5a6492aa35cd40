//! The session store facade.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::pool::Pool;
use crate::region::{Region, RegionConfig};
use crate::session::{Session, SessionId};

/// Default name of the backing region.
pub const DEFAULT_SESSION_REGION: &str = "sessions";
/// Default inactivity window before the server expires a session.
pub const DEFAULT_MAX_INACTIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Configuration for a session store.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Name of the backing region.
    pub region_name: String,
    /// Inactivity window; becomes the region's idle timeout on the server.
    pub max_inactive_interval: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            region_name: DEFAULT_SESSION_REGION.to_string(),
            max_inactive_interval: DEFAULT_MAX_INACTIVE_INTERVAL,
        }
    }
}

impl SessionStoreConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backing region name.
    pub fn with_region_name(mut self, name: impl Into<String>) -> Self {
        self.region_name = name.into();
        self
    }

    /// Set the inactivity window.
    pub fn with_max_inactive_interval(mut self, interval: Duration) -> Self {
        self.max_inactive_interval = interval;
        self
    }
}

/// Facade for sessions backed by a remote region.
///
/// The store hands out plain [`Session`] values. Nothing is persisted until
/// [`SessionStore::save`] runs, and a saved session keeps living remotely
/// until its inactivity window passes or it is deleted. Expiry is the
/// server's call alone; the store never deletes a session on the server's
/// behalf.
#[derive(Clone)]
pub struct SessionStore {
    region: Region<Session>,
    max_inactive_interval: Duration,
}

impl SessionStore {
    /// Ensure the backing region exists and open the store.
    pub async fn open(pool: Pool, config: SessionStoreConfig) -> Result<Self> {
        let region = Region::create(
            pool,
            RegionConfig::new(&config.region_name).with_idle_timeout(config.max_inactive_interval),
        )
        .await?;
        debug!(
            region = %config.region_name,
            max_inactive_interval = ?config.max_inactive_interval,
            "session store ready"
        );
        Ok(Self {
            region,
            max_inactive_interval: config.max_inactive_interval,
        })
    }

    /// Create a session with a fresh random ID and no attributes.
    ///
    /// The session exists only in this process until it is saved.
    pub fn create(&self) -> Session {
        let session = Session::new(self.max_inactive_interval);
        debug!(session_id = %session.id, "session created");
        session
    }

    /// Persist the session and restart its idle countdown on the server.
    ///
    /// The session's last-accessed time is refreshed as part of saving.
    pub async fn save(&self, session: &mut Session) -> Result<()> {
        session.touch();
        self.region.put(&session.id.to_string(), session).await?;
        debug!(session_id = %session.id, "session saved");
        Ok(())
    }

    /// Load a session by ID.
    ///
    /// `None` means no live session: the ID was never saved, the session
    /// was deleted, or the server expired it. The cases are deliberately
    /// indistinguishable. Infrastructure trouble surfaces as an error,
    /// never as `None`.
    pub async fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        self.region.get(&id.to_string()).await
    }

    /// Mark the session as used now, locally.
    ///
    /// The server's idle countdown is unaffected until the session is
    /// saved.
    pub fn touch(&self, session: &mut Session) {
        session.touch();
    }

    /// Delete a session immediately, regardless of expiration.
    ///
    /// Returns whether a live session was present.
    pub async fn delete(&self, id: &SessionId) -> Result<bool> {
        let existed = self.region.remove(&id.to_string()).await?;
        debug!(session_id = %id, existed, "session deleted");
        Ok(existed)
    }

    /// The inactivity window sessions are created with.
    pub fn max_inactive_interval(&self) -> Duration {
        self.max_inactive_interval
    }

    /// The backing region handle.
    pub fn region(&self) -> &Region<Session> {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionStoreConfig::default();
        assert_eq!(config.region_name, "sessions");
        assert_eq!(config.max_inactive_interval, Duration::from_secs(1800));
    }

    #[test]
    fn test_builder_methods() {
        let config = SessionStoreConfig::new()
            .with_region_name("checkout")
            .with_max_inactive_interval(Duration::from_secs(60));
        assert_eq!(config.region_name, "checkout");
        assert_eq!(config.max_inactive_interval, Duration::from_secs(60));
    }
}
