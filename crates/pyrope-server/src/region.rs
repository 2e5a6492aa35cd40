//! In-memory region storage with idle-timeout expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

/// One stored entry and the timestamp its idle countdown runs from.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    last_write: Instant,
}

/// A named key/value namespace with an optional per-entry idle timeout.
///
/// Only writes restart an entry's countdown. Reads check it, so an expired
/// entry is unobservable even before the sweeper gets to it, but they never
/// feed it.
#[derive(Debug)]
pub struct RegionStore {
    entries: HashMap<String, StoredEntry>,
    idle_timeout: Option<Duration>,
}

impl RegionStore {
    /// Create an empty region. `None` disables expiration.
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            idle_timeout,
        }
    }

    /// The idle timeout this region was created with.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Read a key, dropping it first when its countdown has run out.
    ///
    /// Expired and absent keys both come back as `None`.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        if self.is_entry_expired(key) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Write a key, restarting its idle countdown.
    ///
    /// Returns whether a live entry was already present.
    pub fn put(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        let existed = !self.is_entry_expired(&key) && self.entries.contains_key(&key);
        self.entries.insert(
            key,
            StoredEntry {
                value,
                last_write: Instant::now(),
            },
        );
        existed
    }

    /// Delete a key immediately, regardless of its countdown.
    ///
    /// Returns whether a live entry was removed; deleting an already
    /// expired key reports `false`.
    pub fn remove(&mut self, key: &str) -> bool {
        let expired = self.is_entry_expired(key);
        self.entries.remove(key).is_some() && !expired
    }

    /// Drop every entry whose countdown has run out.
    ///
    /// Returns how many entries were removed.
    pub fn sweep(&mut self) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_write.elapsed() <= timeout);
        before - self.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        match self.idle_timeout {
            None => self.entries.len(),
            Some(timeout) => self
                .entries
                .values()
                .filter(|entry| entry.last_write.elapsed() <= timeout)
                .count(),
        }
    }

    /// Whether the region holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_entry_expired(&self, key: &str) -> bool {
        match (self.idle_timeout, self.entries.get(key)) {
            (Some(timeout), Some(entry)) => entry.last_write.elapsed() > timeout,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_then_get() {
        let mut region = RegionStore::new(None);
        assert!(!region.put("a", json!(1)));
        assert_eq!(region.get("a"), Some(json!(1)));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_get_absent_key_returns_none() {
        let mut region = RegionStore::new(None);
        assert_eq!(region.get("missing"), None);
    }

    #[test]
    fn test_put_reports_prior_existence() {
        let mut region = RegionStore::new(None);
        assert!(!region.put("a", json!(1)));
        assert!(region.put("a", json!(2)));
        assert_eq!(region.get("a"), Some(json!(2)));
    }

    #[test]
    fn test_remove_reports_existence() {
        let mut region = RegionStore::new(None);
        region.put("a", json!(1));
        assert!(region.remove("a"));
        assert!(!region.remove("a"));
        assert_eq!(region.get("a"), None);
    }

    #[test]
    fn test_entries_expire_after_idle_timeout() {
        let mut region = RegionStore::new(Some(Duration::from_millis(20)));
        region.put("a", json!("value"));
        assert_eq!(region.get("a"), Some(json!("value")));

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(region.get("a"), None);
        assert!(region.is_empty());
    }

    #[test]
    fn test_put_restarts_the_countdown() {
        let mut region = RegionStore::new(Some(Duration::from_millis(50)));
        region.put("a", json!(1));

        std::thread::sleep(Duration::from_millis(30));
        region.put("a", json!(2));

        std::thread::sleep(Duration::from_millis(30));
        // 60ms since the first write, 30ms since the second.
        assert_eq!(region.get("a"), Some(json!(2)));
    }

    #[test]
    fn test_get_does_not_restart_the_countdown() {
        let mut region = RegionStore::new(Some(Duration::from_millis(50)));
        region.put("a", json!(1));

        std::thread::sleep(Duration::from_millis(30));
        assert!(region.get("a").is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(region.get("a"), None);
    }

    #[test]
    fn test_remove_of_expired_entry_reports_false() {
        let mut region = RegionStore::new(Some(Duration::from_millis(10)));
        region.put("a", json!(1));
        std::thread::sleep(Duration::from_millis(30));
        assert!(!region.remove("a"));
    }

    #[test]
    fn test_sweep_drops_only_expired_entries() {
        let mut region = RegionStore::new(Some(Duration::from_millis(30)));
        region.put("old", json!(1));
        std::thread::sleep(Duration::from_millis(50));
        region.put("fresh", json!(2));

        assert_eq!(region.sweep(), 1);
        assert_eq!(region.get("old"), None);
        assert_eq!(region.get("fresh"), Some(json!(2)));
    }

    #[test]
    fn test_sweep_without_timeout_is_a_no_op() {
        let mut region = RegionStore::new(None);
        region.put("a", json!(1));
        assert_eq!(region.sweep(), 0);
        assert_eq!(region.len(), 1);
    }
}
