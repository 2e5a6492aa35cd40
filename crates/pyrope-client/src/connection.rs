//! A single framed connection to a cache server.

use std::time::Duration;

use pyrope_proto::{Request, Response, read_frame, write_frame};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::PoolConfig;
use crate::endpoint::ConnectionEndpoint;
use crate::error::{Error, Result};

/// One established, handshaken connection.
///
/// A connection carries strictly alternating request/response traffic. If
/// an exchange fails or times out partway through, the stream state is
/// unknown and the connection must be dropped, not reused.
#[derive(Debug)]
pub(crate) struct Connection {
    stream: TcpStream,
    endpoint: ConnectionEndpoint,
}

impl Connection {
    /// Dial `endpoint` and perform the hello/welcome handshake.
    ///
    /// The whole sequence is bounded by the configured read timeout.
    pub(crate) async fn open(endpoint: &ConnectionEndpoint, config: &PoolConfig) -> Result<Self> {
        let hello = Request::Hello {
            client_name: config.client_name.clone(),
            subscription_enabled: config.subscription_enabled,
        };

        let open = async {
            let stream = TcpStream::connect(endpoint.authority()).await?;
            stream.set_nodelay(true)?;
            let mut conn = Self {
                stream,
                endpoint: endpoint.clone(),
            };
            match conn.exchange_unbounded(&hello).await? {
                Response::Welcome {
                    server_name,
                    version,
                } => {
                    debug!(
                        endpoint = %conn.endpoint,
                        server = %server_name,
                        version,
                        "connected to cache server"
                    );
                    Ok(conn)
                }
                other => Err(Error::protocol(format!(
                    "expected welcome, got {:?}",
                    other
                ))),
            }
        };

        match timeout(config.read_timeout, open).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                timeout: config.read_timeout,
            }),
        }
    }

    /// The endpoint this connection talks to.
    pub(crate) fn endpoint(&self) -> &ConnectionEndpoint {
        &self.endpoint
    }

    /// Send one request and await its response, bounded by `read_timeout`.
    pub(crate) async fn exchange(
        &mut self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response> {
        match timeout(read_timeout, self.exchange_unbounded(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                timeout: read_timeout,
            }),
        }
    }

    /// Probe liveness with a ping.
    pub(crate) async fn ping(&mut self, read_timeout: Duration) -> Result<()> {
        match self.exchange(&Request::Ping, read_timeout).await? {
            Response::Pong => {
                trace!(endpoint = %self.endpoint, "ping ok");
                Ok(())
            }
            other => Err(Error::protocol(format!("expected pong, got {:?}", other))),
        }
    }

    async fn exchange_unbounded(&mut self, request: &Request) -> Result<Response> {
        write_frame(&mut self.stream, request).await?;
        let response = read_frame(&mut self.stream).await?;
        Ok(response)
    }
}
