//! Request handler trait.
//!
//! A handler receives the parsed [`Request`] together with a [`ResponseWriter`] and writes
//! its response through it. The writer enforces part ordering; the handler decides what
//! to send and whether to frame the body with a content-length or chunked.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use micro_h1::connection::ResponseWriter;
//! use micro_h1::handler::Handler;
//! use micro_h1::protocol::{Request, default_headers};
//! use tokio::io::AsyncWrite;
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     async fn call<W>(&self, writer: &mut ResponseWriter<W>, _request: Request)
//!     where
//!         W: AsyncWrite + Unpin + Send,
//!     {
//!         let body = b"Hello World!\n";
//!         let _ = writer.write_status_line(StatusCode::OK);
//!         let _ = writer.write_headers(&default_headers(body.len()));
//!         let _ = writer.write_body(body).await;
//!     }
//! }
//! ```

use std::future::Future;

use tokio::io::AsyncWrite;

use crate::connection::ResponseWriter;
use crate::protocol::Request;

pub trait Handler: Send + Sync {
    /// Handles one request. Called exactly once per connection, after the request was
    /// parsed completely.
    fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Request) -> impl Future<Output = ()> + Send
    where
        W: AsyncWrite + Unpin + Send;
}
