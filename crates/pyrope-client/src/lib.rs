//! Pooled cache client and session store for the Pyrope server.
//!
//! The crate is layered. [`Pool`] owns a bounded set of connections to the
//! cache tier, keeps them healthy with background pings, and hands them out
//! one exchange at a time. [`Region`] is a typed key/value view over the
//! pool with a retry policy for transient failures. [`SessionStore`] sits
//! on top and gives sessions their usual shape: create, save, load, delete,
//! with expiry enforced by the server rather than the client.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use pyrope_client::{
//!     ConnectionEndpoint, Pool, PoolConfig, Result, SessionStore, SessionStoreConfig,
//! };
//!
//! # async fn example() -> Result<()> {
//! // Connect a pool to the cache tier
//! let pool = Pool::connect(
//!     vec![ConnectionEndpoint::new("127.0.0.1", 40404)],
//!     PoolConfig::new().with_max_connections(4),
//! )
//! .await?;
//!
//! // Open a session store over it
//! let store = SessionStore::open(
//!     pool,
//!     SessionStoreConfig::new().with_max_inactive_interval(Duration::from_secs(1800)),
//! )
//! .await?;
//!
//! // Create, mutate, save
//! let mut session = store.create();
//! session.set_attribute("user", "alice");
//! store.save(&mut session).await?;
//!
//! // Load it back, possibly from another process
//! let loaded = store.load(&session.id).await?;
//! assert!(loaded.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Failure semantics
//!
//! An unreachable cache tier at startup fails [`Pool::connect`] with
//! [`Error::Connection`] and is not retried. Once running, each operation
//! gets one attempt plus the configured retries; what remains afterwards
//! surfaces as [`Error::Unavailable`] or, for a final read timeout,
//! [`Error::Timeout`]. A missing or expired key is not a failure at all:
//! reads report it as `None`.

mod connection;

pub mod config;
pub mod endpoint;
pub mod error;
pub mod pool;
pub mod region;
pub mod session;
pub mod store;

pub use config::PoolConfig;
pub use endpoint::ConnectionEndpoint;
pub use error::{Error, Result};
pub use pool::{Pool, PoolStats, PooledConnection};
pub use region::{Region, RegionConfig};
pub use session::{Session, SessionId};
pub use store::{DEFAULT_SESSION_REGION, SessionStore, SessionStoreConfig};

// The error code vocabulary travels with server errors.
pub use pyrope_proto::ErrorCode;
