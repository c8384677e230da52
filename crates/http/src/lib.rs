//! An incremental HTTP/1.1 request parser and ordered response writer on tokio
//!
//! This crate reads exactly one request per connection, hands it to a user supplied
//! [`handler::Handler`] and lets that handler write the response through a writer that
//! refuses to emit parts out of order. It is small on purpose: the interesting part is the
//! buffering discipline that lets parsing proceed no matter how the peer's bytes are
//! split across reads.
//!
//! # Features
//!
//! - Request line, header and content-length body parsing that tolerates any fragmentation
//! - Case-insensitive header collection keeping insertion order, with value folding
//! - Fixed-length and chunked response bodies, with trailers
//! - A tokio TCP server with graceful close and draining shutdown
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use micro_h1::connection::ResponseWriter;
//! use micro_h1::handler::Handler;
//! use micro_h1::protocol::{Request, default_headers};
//! use micro_h1::server::Server;
//! use tokio::io::AsyncWrite;
//! use tracing::{Level, error, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! struct HelloWorld;
//!
//! impl Handler for HelloWorld {
//!     async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Request)
//!     where
//!         W: AsyncWrite + Unpin + Send,
//!     {
//!         info!(path = request.target(), "receiving request");
//!
//!         let body = b"Hello World!\r\n";
//!         let result = async {
//!             writer.write_status_line(StatusCode::OK)?;
//!             writer.write_headers(&default_headers(body.len()))?;
//!             writer.write_body(body).await
//!         };
//!         if let Err(e) = result.await {
//!             error!(cause = %e, "can't write response");
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let server = match Server::builder().address("127.0.0.1:8080").bind(HelloWorld).await {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     if let Err(e) = server.shutdown().await {
//!         error!(cause = %e, "shutdown error");
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request, header and state types plus the error types
//! - [`codec`]: sans-io request decoding and response encoding
//! - [`connection`]: the read loop, the response writer and per-connection processing
//! - [`handler`]: the trait user code implements
//! - [`server`]: the TCP accept loop
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: the request could not be parsed; always fatal for the connection
//! - [`protocol::SendError`]: a response part was out of order or the socket failed
//! - [`protocol::HttpError`]: either of the above, returned by connection processing
//! - [`server::ServerError`]: binding failed or the accept loop died
//!
//! # Limitations
//!
//! - HTTP/1.1 only, one request per connection, no keep-alive
//! - Request bodies need a `Content-Length`; chunked request bodies are not decoded
//! - Request line plus headers are limited to 8 KiB by default
//! - No TLS

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
