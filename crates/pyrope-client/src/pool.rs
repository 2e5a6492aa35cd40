//! Connection pooling with liveness checks and bounded acquisition.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use pyrope_proto::{Request, Response};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;
use crate::connection::Connection;
use crate::endpoint::ConnectionEndpoint;
use crate::error::{Error, Result};

/// A parked connection waiting for reuse.
struct IdleConnection {
    conn: Connection,
    /// When the last caller released it.
    idle_since: Instant,
}

struct PoolInner {
    endpoints: Vec<ConnectionEndpoint>,
    config: PoolConfig,
    /// Parked connections, most recently released last.
    idle: Mutex<Vec<IdleConnection>>,
    /// Bounds connections handed out at once.
    limiter: Arc<Semaphore>,
    /// Round-robin cursor over `endpoints` for fresh dials.
    next_endpoint: AtomicUsize,
    closed: AtomicBool,
    pinger: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        if let Some(handle) = self.pinger.lock().take() {
            handle.abort();
        }
    }
}

/// Pool of connections to one or more cache servers.
///
/// Cloning is cheap; clones share the same connections and configuration.
/// Connections have no caller affinity: a guard from [`Pool::acquire`] may
/// wrap any endpoint's connection, and consecutive acquires may hand back
/// different sockets.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Validate the configuration, establish a first connection, and start
    /// the health-check task.
    ///
    /// Endpoints are tried in order; the first that completes the handshake
    /// wins. When none does, the error is [`Error::Connection`]: startup
    /// cannot proceed and no retry schedule applies.
    pub async fn connect(endpoints: Vec<ConnectionEndpoint>, config: PoolConfig) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::config("at least one endpoint is required"));
        }
        if config.max_connections == 0 {
            return Err(Error::config("max_connections must be at least 1"));
        }
        if config.ping_interval.is_zero() {
            return Err(Error::config("ping_interval must be positive"));
        }

        let mut last_error = String::from("no endpoints tried");
        let mut first = None;
        for endpoint in &endpoints {
            match Connection::open(endpoint, &config).await {
                Ok(conn) => {
                    first = Some(conn);
                    break;
                }
                Err(err) => {
                    warn!(endpoint = %endpoint, error = %err, "endpoint not reachable");
                    last_error = err.to_string();
                }
            }
        }
        let Some(conn) = first else {
            return Err(Error::Connection(last_error));
        };

        let inner = Arc::new(PoolInner {
            limiter: Arc::new(Semaphore::new(config.max_connections)),
            endpoints,
            config,
            idle: Mutex::new(vec![IdleConnection {
                conn,
                idle_since: Instant::now(),
            }]),
            next_endpoint: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            pinger: Mutex::new(None),
        });

        // The pinger holds a weak handle so an abandoned pool shuts it down.
        let pinger = tokio::spawn(ping_loop(Arc::downgrade(&inner)));
        *inner.pinger.lock() = Some(pinger);

        debug!(
            endpoints = inner.endpoints.len(),
            max_connections = inner.config.max_connections,
            "connection pool ready"
        );
        Ok(Self { inner })
    }

    /// Take a connection from the pool.
    ///
    /// Reuses a parked connection when one exists, dials a fresh one
    /// otherwise, and waits at most the free-connection timeout when all
    /// `max_connections` are handed out. Dropping the returned guard gives
    /// the connection back.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let wait = self.inner.config.free_connection_timeout;
        let permit = match timeout(wait, self.inner.limiter.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(Error::Closed),
            Err(_) => return Err(Error::PoolExhausted { waited: wait }),
        };

        if let Some(idle) = self.inner.idle.lock().pop() {
            trace!(endpoint = %idle.conn.endpoint(), "reusing pooled connection");
            return Ok(PooledConnection::new(self.inner.clone(), idle.conn, permit));
        }

        // Nothing parked; dial, trying each endpoint at most once.
        let mut last_error = Error::Connection("no endpoints configured".to_string());
        for _ in 0..self.inner.endpoints.len() {
            let index = self.inner.next_endpoint.fetch_add(1, Ordering::Relaxed)
                % self.inner.endpoints.len();
            let endpoint = &self.inner.endpoints[index];
            match Connection::open(endpoint, &self.inner.config).await {
                Ok(conn) => {
                    return Ok(PooledConnection::new(self.inner.clone(), conn, permit));
                }
                Err(err) => {
                    warn!(endpoint = %endpoint, error = %err, "failed to open connection");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    /// The pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> PoolStats {
        let idle = self.inner.idle.lock().len();
        let in_use = self.inner.config.max_connections - self.inner.limiter.available_permits();
        PoolStats {
            in_use,
            idle,
            endpoints: self.inner.endpoints.len(),
        }
    }

    /// Whether [`Pool::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }

    /// Close the pool.
    ///
    /// Stops the health-check task, fails new acquisitions with
    /// [`Error::Closed`], and drops parked connections. Guards already
    /// handed out keep working; their connections are dropped on release
    /// instead of parked.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.limiter.close();
        if let Some(handle) = self.inner.pinger.lock().take() {
            handle.abort();
        }
        self.inner.idle.lock().clear();
        debug!("connection pool closed");
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently handed out.
    pub in_use: usize,
    /// Connections parked for reuse.
    pub idle: usize,
    /// Configured endpoints.
    pub endpoints: usize,
}

/// RAII guard for an acquired connection.
///
/// Dropping the guard parks the connection for reuse. After a failed or
/// timed-out exchange the stream state is unknown; call
/// [`PooledConnection::discard`] so the connection never re-enters
/// rotation.
pub struct PooledConnection {
    inner: Arc<PoolInner>,
    conn: Option<Connection>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    fn new(inner: Arc<PoolInner>, conn: Connection, permit: OwnedSemaphorePermit) -> Self {
        Self {
            inner,
            conn: Some(conn),
            _permit: permit,
        }
    }

    /// The endpoint this connection talks to.
    pub fn endpoint(&self) -> Option<&ConnectionEndpoint> {
        self.conn.as_ref().map(|conn| conn.endpoint())
    }

    /// Drop the underlying connection instead of returning it to the pool.
    pub fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            debug!(endpoint = %conn.endpoint(), "discarding connection");
        }
    }

    /// Send one request and await its response, bounded by the pool's read
    /// timeout.
    pub(crate) async fn exchange(&mut self, request: &Request) -> Result<Response> {
        let read_timeout = self.inner.config.read_timeout;
        match self.conn.as_mut() {
            Some(conn) => conn.exchange(request, read_timeout).await,
            None => Err(Error::Closed),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.inner.closed.load(Ordering::Relaxed) {
            return;
        }
        trace!(endpoint = %conn.endpoint(), "returning connection to pool");
        self.inner.idle.lock().push(IdleConnection {
            conn,
            idle_since: Instant::now(),
        });
    }
}

/// Background liveness check for parked connections.
///
/// Each round takes the parked connections out of rotation, closes those
/// idle past the timeout, pings the rest, and returns the survivors. A
/// fresh dial can race a round; the parked list is capped at the pool
/// bound afterwards so the race never grows the pool.
async fn ping_loop(inner: Weak<PoolInner>) {
    let Some(pool) = inner.upgrade() else { return };
    let ping_interval = pool.config.ping_interval;
    let read_timeout = pool.config.read_timeout;
    let idle_timeout = pool.config.idle_timeout;
    let max_connections = pool.config.max_connections;
    drop(pool);

    let mut ticker = interval(ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; freshly opened connections do not
    // need a probe yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(pool) = inner.upgrade() else { return };
        if pool.closed.load(Ordering::Relaxed) {
            return;
        }

        let parked = std::mem::take(&mut *pool.idle.lock());
        if parked.is_empty() {
            continue;
        }

        let mut healthy = Vec::with_capacity(parked.len());
        for mut idle in parked {
            if idle.idle_since.elapsed() > idle_timeout {
                debug!(endpoint = %idle.conn.endpoint(), "closing connection idle past timeout");
                continue;
            }
            match idle.conn.ping(read_timeout).await {
                Ok(()) => healthy.push(idle),
                Err(err) => {
                    warn!(
                        endpoint = %idle.conn.endpoint(),
                        error = %err,
                        "dropping unhealthy pooled connection"
                    );
                }
            }
        }

        let mut idle = pool.idle.lock();
        idle.extend(healthy);
        if idle.len() > max_connections {
            let excess = idle.len() - max_connections;
            idle.drain(..excess);
        }
    }
}
