//! Pool configuration.

use std::time::Duration;

/// Default interval between health-check pings of parked connections.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);
/// Default per-attempt read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(20);
/// Default number of retries after a failed attempt.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;
/// Default cap on connections per pool.
pub const DEFAULT_MAX_CONNECTIONS: usize = 8;
/// Default age after which a parked connection is closed instead of reused.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Default bounded wait for a connection when the pool is exhausted.
pub const DEFAULT_FREE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a connection pool.
///
/// Fixed once the pool is built; there is no runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name announced to servers in the handshake.
    pub client_name: String,
    /// Whether to announce subscription intent in the handshake.
    pub subscription_enabled: bool,
    /// How often the health-check task pings parked connections.
    pub ping_interval: Duration,
    /// Ceiling on a single request/response exchange. Also bounds the
    /// connect-and-handshake sequence when dialing.
    pub read_timeout: Duration,
    /// Retries after a failed attempt. Zero means one attempt total.
    pub retry_attempts: u32,
    /// Ceiling on connections handed out at once.
    pub max_connections: usize,
    /// Parked connections older than this are closed by the health check.
    pub idle_timeout: Duration,
    /// How long an acquire waits for a connection when all are in use.
    pub free_connection_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            client_name: "pyrope-client".to_string(),
            subscription_enabled: false,
            ping_interval: DEFAULT_PING_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            free_connection_timeout: DEFAULT_FREE_CONNECTION_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the announced client name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Announce subscription intent in the handshake.
    pub fn with_subscription_enabled(mut self, enabled: bool) -> Self {
        self.subscription_enabled = enabled;
        self
    }

    /// Set the health-check ping interval.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set the per-attempt read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the number of retries after a failed attempt.
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set the connection ceiling.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the parked-connection idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the bounded wait for a connection on an exhausted pool.
    pub fn with_free_connection_timeout(mut self, timeout: Duration) -> Self {
        self.free_connection_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.client_name, "pyrope-client");
        assert!(!config.subscription_enabled);
        assert_eq!(config.ping_interval, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(20));
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.free_connection_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_methods() {
        let config = PoolConfig::new()
            .with_client_name("web-frontend")
            .with_subscription_enabled(true)
            .with_ping_interval(Duration::from_secs(1))
            .with_read_timeout(Duration::from_secs(2))
            .with_retry_attempts(3)
            .with_max_connections(2)
            .with_idle_timeout(Duration::from_secs(60))
            .with_free_connection_timeout(Duration::from_millis(250));

        assert_eq!(config.client_name, "web-frontend");
        assert!(config.subscription_enabled);
        assert_eq!(config.ping_interval, Duration::from_secs(1));
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.free_connection_timeout, Duration::from_millis(250));
    }
}
