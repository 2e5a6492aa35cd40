//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Default port, kept at the conventional cache-server port.
pub const DEFAULT_PORT: u16 = 40404;
/// Default interval between expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
/// Default ceiling on silence before a connection is considered dead.
pub const DEFAULT_MAX_TIME_BETWEEN_PINGS: Duration = Duration::from_secs(60);

/// Configuration for the cache server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind. Port 0 picks an ephemeral port.
    pub bind_address: SocketAddr,
    /// Name announced to clients in the handshake.
    pub server_name: String,
    /// Idle timeout applied to regions created without an explicit one.
    /// `None` means such regions never expire entries.
    pub default_idle_timeout: Option<Duration>,
    /// How often the background sweeper drops expired entries.
    pub sweep_interval: Duration,
    /// Connections with no traffic, pings included, for longer than this
    /// are closed.
    pub max_time_between_pings: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            server_name: "pyrope-server".to_string(),
            default_idle_timeout: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_time_between_pings: DEFAULT_MAX_TIME_BETWEEN_PINGS,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the announced server name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the idle timeout for regions created without one.
    pub fn with_default_idle_timeout(mut self, timeout: Duration) -> Self {
        self.default_idle_timeout = Some(timeout);
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the silence ceiling for connections.
    pub fn with_max_time_between_pings(mut self, ceiling: Duration) -> Self {
        self.max_time_between_pings = ceiling;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), DEFAULT_PORT);
        assert_eq!(config.server_name, "pyrope-server");
        assert!(config.default_idle_timeout.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.max_time_between_pings, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_methods() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:0".parse().unwrap())
            .with_server_name("test-server")
            .with_default_idle_timeout(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_millis(100))
            .with_max_time_between_pings(Duration::from_secs(5));

        assert_eq!(config.bind_address.port(), 0);
        assert_eq!(config.server_name, "test-server");
        assert_eq!(config.default_idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.sweep_interval, Duration::from_millis(100));
        assert_eq!(config.max_time_between_pings, Duration::from_secs(5));
    }
}
