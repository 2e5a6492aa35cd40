//! Cache server addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Address of one cache server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionEndpoint {
    /// Server hostname or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl ConnectionEndpoint {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The `host:port` form used for dialing.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ConnectionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ConnectionEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            Error::config(format!("invalid endpoint '{}': expected host:port", s))
        })?;
        if host.is_empty() {
            return Err(Error::config(format!("invalid endpoint '{}': empty host", s)));
        }
        let port = port
            .parse()
            .map_err(|_| Error::config(format!("invalid port in endpoint '{}'", s)))?;
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let endpoint: ConnectionEndpoint = "cache.internal:40404".parse().unwrap();
        assert_eq!(endpoint.host, "cache.internal");
        assert_eq!(endpoint.port, 40404);
        assert_eq!(endpoint.to_string(), "cache.internal:40404");
        assert_eq!(endpoint.authority(), "cache.internal:40404");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("no-port".parse::<ConnectionEndpoint>().is_err());
        assert!(":40404".parse::<ConnectionEndpoint>().is_err());
        assert!("host:notaport".parse::<ConnectionEndpoint>().is_err());
        assert!("host:99999".parse::<ConnectionEndpoint>().is_err());
    }
}
