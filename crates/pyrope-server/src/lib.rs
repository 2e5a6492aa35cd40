//! Single-node cache server speaking the Pyrope wire protocol.
//!
//! The server holds named regions in memory and enforces their idle
//! timeouts. Expiration is enforced twice over: reads check an entry's
//! countdown before answering, and a background sweeper reclaims expired
//! entries even when nobody asks for them.
//!
//! This is a cache tier for development and testing, not a replicated
//! store. One process, one copy of the data.

pub mod config;
pub mod error;
pub mod region;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::{ServerState, SharedState};

use std::net::SocketAddr;
use std::time::Duration;

use pyrope_proto::{
    ErrorCode, PROTOCOL_VERSION, ProtoError, Request, Response, read_frame, write_frame,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

/// The cache server: a TCP listener serving framed requests.
pub struct CacheServer {
    listener: TcpListener,
    state: SharedState,
}

impl CacheServer {
    /// Bind the configured address.
    ///
    /// Binding port 0 picks an ephemeral port; [`CacheServer::local_addr`]
    /// reports the one chosen.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        info!(
            addr = %listener.local_addr()?,
            name = %config.server_name,
            "cache server listening"
        );
        let state = ServerState::new(config);
        Ok(Self { listener, state })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared state.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Serve connections until the surrounding task is dropped or aborted.
    ///
    /// Runs the accept loop and the expiration sweeper together, so killing
    /// the task tears both down.
    pub async fn run(self) -> Result<()> {
        let sweeper_state = self.state.clone();
        tokio::select! {
            result = accept_loop(self.listener, self.state) => result,
            _ = sweep_loop(sweeper_state) => Ok(()),
        }
    }
}

async fn accept_loop(listener: TcpListener, state: SharedState) -> Result<()> {
    // Connection tasks live in a JoinSet so dropping the server severs
    // every open connection with it.
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let state = state.clone();
                connections.spawn(async move {
                    if let Err(err) = serve_connection(stream, peer, state).await {
                        debug!(peer = %peer, error = %err, "connection ended with error");
                    }
                });
            }
            Some(_) = connections.join_next() => {}
        }
    }
}

/// Serve one client connection.
///
/// The first frame must be a [`Request::Hello`]; anything else is answered
/// with an error and the connection is closed. After the handshake the
/// connection is a strict request/response loop until the peer disconnects
/// or goes silent past the ping ceiling.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: SharedState,
) -> Result<()> {
    let silence_ceiling = state.config().max_time_between_pings;

    let client_name = match read_request(&mut stream, silence_ceiling).await? {
        Some(Request::Hello {
            client_name,
            subscription_enabled,
        }) => {
            debug!(
                peer = %peer,
                client = %client_name,
                subscription_enabled,
                "client connected"
            );
            let welcome = Response::Welcome {
                server_name: state.config().server_name.clone(),
                version: PROTOCOL_VERSION,
            };
            write_frame(&mut stream, &welcome).await?;
            client_name
        }
        Some(_) => {
            let response = Response::error(ErrorCode::BadRequest, "expected hello");
            write_frame(&mut stream, &response).await?;
            return Err(ServerError::protocol(format!(
                "peer {} skipped the handshake",
                peer
            )));
        }
        // Closed before saying hello; nothing to do.
        None => return Ok(()),
    };

    loop {
        let request = match read_request(&mut stream, silence_ceiling).await? {
            Some(request) => request,
            None => {
                debug!(peer = %peer, client = %client_name, "client disconnected");
                return Ok(());
            }
        };
        let response = dispatch(&state, request);
        write_frame(&mut stream, &response).await?;
    }
}

/// Read the next request.
///
/// A clean close at a frame boundary comes back as `None`. A connection
/// silent for longer than `silence_ceiling` is treated as dead and closed.
async fn read_request(
    stream: &mut TcpStream,
    silence_ceiling: Duration,
) -> Result<Option<Request>> {
    match timeout(silence_ceiling, read_frame::<_, Request>(stream)).await {
        Ok(Ok(request)) => Ok(Some(request)),
        Ok(Err(ProtoError::ConnectionClosed)) => Ok(None),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(ServerError::protocol(format!(
            "no traffic for {:?}, closing connection",
            silence_ceiling
        ))),
    }
}

/// Answer one request against the shared state.
fn dispatch(state: &SharedState, request: Request) -> Response {
    match request {
        Request::Hello { .. } => Response::error(ErrorCode::BadRequest, "unexpected hello"),
        Request::Ping => Response::Pong,
        Request::EnsureRegion {
            region,
            idle_timeout_secs,
        } => {
            state.ensure_region(&region, idle_timeout_secs.map(Duration::from_secs));
            Response::RegionReady { region }
        }
        Request::Get { region, key } => {
            match state.with_region(&region, |store| store.get(&key)) {
                Some(value) => Response::Value { value },
                None => no_such_region(&region),
            }
        }
        Request::Put { region, key, value } => {
            match state.with_region(&region, |store| store.put(key, value)) {
                Some(existed) => Response::Done { existed },
                None => no_such_region(&region),
            }
        }
        Request::Remove { region, key } => {
            match state.with_region(&region, |store| store.remove(&key)) {
                Some(existed) => Response::Done { existed },
                None => no_such_region(&region),
            }
        }
    }
}

fn no_such_region(region: &str) -> Response {
    Response::error(
        ErrorCode::NoSuchRegion,
        format!("region '{}' does not exist", region),
    )
}

/// Periodically drop expired entries so memory is reclaimed even without
/// client traffic.
async fn sweep_loop(state: SharedState) {
    let mut ticker = tokio::time::interval(state.config().sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = state.sweep_expired();
        if removed > 0 {
            debug!(removed, "expired entries swept");
        }
    }
}
