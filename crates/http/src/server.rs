//! A minimal TCP server: one task per connection, one request per connection.
//!
//! ```no_run
//! # use micro_h1::handler::Handler;
//! # use micro_h1::server::Server;
//! # async fn run(handler: impl Handler + 'static) -> Result<(), micro_h1::server::ServerError> {
//! let server = Server::builder().address("127.0.0.1:42069").bind(handler).await?;
//! tokio::signal::ctrl_c().await.ok();
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::select;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::connection::{ConnectionConfig, HttpConnection};
use crate::handler::Handler;

const DEFAULT_ADDRESS: &str = "127.0.0.1:0";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind server error: {source}")]
    Bind {
        #[from]
        source: io::Error,
    },

    #[error("accept loop failed: {source}")]
    Join {
        #[from]
        source: JoinError,
    },
}

/// Lifecycle of a [`Server`]. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl ServerState {
    fn load(state: &AtomicU8) -> Self {
        match state.load(Ordering::Acquire) {
            0 => ServerState::Open,
            1 => ServerState::Closing,
            _ => ServerState::Closed,
        }
    }

    fn store(self, state: &AtomicU8) {
        state.store(self as u8, Ordering::Release);
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Open => "open",
            ServerState::Closing => "closing",
            ServerState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct ServerBuilder {
    address: io::Result<Vec<SocketAddr>>,
    config: ConnectionConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: DEFAULT_ADDRESS.to_socket_addrs().map(Iterator::collect), config: ConnectionConfig::default() }
    }

    /// Where to listen, `127.0.0.1:0` unless set. Resolution errors surface from
    /// [`bind`](Self::bind).
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = address.to_socket_addrs().map(Iterator::collect);
        self
    }

    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.config.read_buffer_size = read_buffer_size;
        self
    }

    pub fn max_header_size(mut self, max_header_size: usize) -> Self {
        self.config.max_header_size = max_header_size;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = Some(read_timeout);
        self
    }

    /// Binds the listener and starts accepting connections in a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address can't be resolved or bound.
    pub async fn bind<H>(self, handler: H) -> Result<Server, ServerError>
    where
        H: Handler + 'static,
    {
        let address = self.address?;
        let listener = TcpListener::bind(address.as_slice()).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "start listening");

        let state = Arc::new(AtomicU8::new(ServerState::Open as u8));
        let cancellation = CancellationToken::new();
        let tracker = TaskTracker::new();

        let accept_loop = AcceptLoop {
            listener,
            handler: Arc::new(handler),
            config: self.config,
            state: Arc::clone(&state),
            cancellation: cancellation.clone(),
            tracker: tracker.clone(),
        };
        let accept_task = tokio::spawn(accept_loop.run());

        Ok(Server { local_addr, state, cancellation, tracker, accept_task: Some(accept_task) })
    }
}

/// A running server.
///
/// Dropping the server stops the accept loop as well, but only [`close`](Self::close)
/// waits for it to finish.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    state: Arc<AtomicU8>,
    cancellation: CancellationToken,
    tracker: TaskTracker,
    accept_task: Option<JoinHandle<()>>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The address actually bound, with the real port when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        ServerState::load(&self.state)
    }

    /// Stops accepting connections and releases the listener.
    ///
    /// Connections already accepted keep running. Calling `close` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Join`] if the accept loop panicked.
    pub async fn close(&mut self) -> Result<(), ServerError> {
        let Some(accept_task) = self.accept_task.take() else {
            return Ok(());
        };

        ServerState::Closing.store(&self.state);
        self.cancellation.cancel();
        let result = accept_task.await;
        ServerState::Closed.store(&self.state);

        info!(local_addr = %self.local_addr, in_flight = self.tracker.len(), "server closed");
        result?;
        Ok(())
    }

    /// Closes the server and waits until every accepted connection has been served.
    ///
    /// # Errors
    ///
    /// Same as [`close`](Self::close).
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        self.close().await?;
        self.tracker.close();
        self.tracker.wait().await;
        info!(local_addr = %self.local_addr, "all connections finished");
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

struct AcceptLoop<H> {
    listener: TcpListener,
    handler: Arc<H>,
    config: ConnectionConfig,
    state: Arc<AtomicU8>,
    cancellation: CancellationToken,
    tracker: TaskTracker,
}

impl<H> AcceptLoop<H>
where
    H: Handler + 'static,
{
    async fn run(self) {
        loop {
            let (tcp_stream, remote_addr) = select! {
                () = self.cancellation.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        if ServerState::load(&self.state) != ServerState::Open {
                            break;
                        }
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&self.handler);
            let config = self.config;

            self.tracker.spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::with_config(reader, writer, &config);
                match connection.process(handler.as_ref()).await {
                    Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                }
            });
        }

        info!(local_addr = ?self.listener.local_addr().ok(), "stop accepting connections");
    }
}
