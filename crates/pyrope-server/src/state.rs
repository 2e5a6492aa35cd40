//! Shared server state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::ServerConfig;
use crate::region::RegionStore;

/// State shared by every connection task and the sweeper.
pub struct ServerState {
    regions: RwLock<HashMap<String, RegionStore>>,
    config: ServerConfig,
}

/// Cheap-to-clone handle to [`ServerState`].
pub type SharedState = Arc<ServerState>;

impl ServerState {
    /// Create the shared state for a server.
    pub fn new(config: ServerConfig) -> SharedState {
        Arc::new(Self {
            regions: RwLock::new(HashMap::new()),
            config,
        })
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Create the named region if it does not exist yet.
    ///
    /// An existing region keeps its original idle timeout; later calls with
    /// a different timeout do not change it. A region created without a
    /// timeout falls back to the configured default.
    pub fn ensure_region(&self, name: &str, idle_timeout: Option<Duration>) {
        let mut regions = self.regions.write();
        if !regions.contains_key(name) {
            let timeout = idle_timeout.or(self.config.default_idle_timeout);
            debug!(region = %name, ?timeout, "region created");
            regions.insert(name.to_string(), RegionStore::new(timeout));
        }
    }

    /// Run `f` against the named region, or return `None` when no such
    /// region exists.
    pub fn with_region<T>(&self, name: &str, f: impl FnOnce(&mut RegionStore) -> T) -> Option<T> {
        self.regions.write().get_mut(name).map(f)
    }

    /// Drop expired entries in every region.
    ///
    /// Returns the total number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let mut removed = 0;
        for (name, region) in self.regions.write().iter_mut() {
            let count = region.sweep();
            if count > 0 {
                trace!(region = %name, removed = count, "swept expired entries");
            }
            removed += count;
        }
        removed
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_state() -> SharedState {
        ServerState::new(ServerConfig::new())
    }

    #[test]
    fn test_ensure_region_is_idempotent() {
        let state = test_state();
        state.ensure_region("sessions", Some(Duration::from_secs(1)));
        state.ensure_region("sessions", Some(Duration::from_secs(99)));

        assert_eq!(state.region_count(), 1);
        let timeout = state.with_region("sessions", |region| region.idle_timeout());
        assert_eq!(timeout, Some(Some(Duration::from_secs(1))));
    }

    #[test]
    fn test_region_without_timeout_uses_server_default() {
        let config = ServerConfig::new().with_default_idle_timeout(Duration::from_secs(7));
        let state = ServerState::new(config);
        state.ensure_region("sessions", None);

        let timeout = state.with_region("sessions", |region| region.idle_timeout());
        assert_eq!(timeout, Some(Some(Duration::from_secs(7))));
    }

    #[test]
    fn test_with_region_on_missing_region() {
        let state = test_state();
        let result = state.with_region("nope", |region| region.len());
        assert!(result.is_none());
    }

    #[test]
    fn test_sweep_covers_every_region() {
        let state = test_state();
        state.ensure_region("a", Some(Duration::from_millis(10)));
        state.ensure_region("b", Some(Duration::from_millis(10)));
        state.with_region("a", |region| region.put("k", json!(1)));
        state.with_region("b", |region| region.put("k", json!(2)));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(state.sweep_expired(), 2);
    }
}
