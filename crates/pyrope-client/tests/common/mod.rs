//! Common test utilities for integration tests.
//!
//! Every suite builds its own server and pool here and tears them down
//! when the test ends; nothing is shared between tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pyrope_client::{ConnectionEndpoint, Pool, PoolConfig};
use pyrope_server::{CacheServer, ServerConfig};

/// A cache server running in the background for one test.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// Handle to the server task.
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral port.
    pub async fn start() -> Result<Self> {
        Self::start_with_config(ServerConfig::new()).await
    }

    /// Start a server with custom configuration. The bind address is
    /// always replaced with an ephemeral one.
    pub async fn start_with_config(config: ServerConfig) -> Result<Self> {
        let config = config.with_bind_address("127.0.0.1:0".parse()?);
        Self::bind_and_spawn(config).await
    }

    /// Start a server on a specific address, typically one a stopped
    /// server just vacated. Binding retries briefly while the old socket
    /// finishes closing.
    pub async fn restart_on(addr: SocketAddr, config: ServerConfig) -> Result<Self> {
        let config = config.with_bind_address(addr);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            match Self::bind_and_spawn(config.clone()).await {
                Ok(server) => return Ok(server),
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn bind_and_spawn(config: ServerConfig) -> Result<Self> {
        let server = CacheServer::bind(config).await?;
        let addr = server.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = server.run().await;
        });
        Ok(Self { addr, handle })
    }

    /// The server's endpoint for pool construction.
    pub fn endpoint(&self) -> ConnectionEndpoint {
        ConnectionEndpoint::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// Connect a pool with test-friendly timeouts.
    pub async fn pool(&self) -> Result<Pool> {
        Ok(Pool::connect(vec![self.endpoint()], test_pool_config()).await?)
    }

    /// Stop the server, severing every open connection.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Pool configuration with timeouts scaled down for tests.
pub fn test_pool_config() -> PoolConfig {
    PoolConfig::new()
        .with_client_name("pyrope-tests")
        .with_read_timeout(Duration::from_secs(2))
        .with_free_connection_timeout(Duration::from_millis(400))
        .with_ping_interval(Duration::from_millis(200))
}

/// Poll `condition` until it holds or `wait` elapses.
pub async fn wait_for<F, Fut>(wait: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    timeout(wait, async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .is_ok()
}
