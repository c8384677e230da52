use std::time::Duration;

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{DEFAULT_MAX_HEADER_SIZE, RequestDecoder};
use crate::connection::{RequestReader, ResponseWriter};
use crate::handler::Handler;
use crate::protocol::{HttpError, WriterState, default_headers};

pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Per connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Initial capacity of the read buffer, and how much room each read asks for
    pub read_buffer_size: usize,
    /// Upper bound on request line plus header section, in bytes
    pub max_header_size: usize,
    /// Deadline for each individual read; `None` waits forever
    pub read_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { read_buffer_size: DEFAULT_READ_BUFFER_SIZE, max_header_size: DEFAULT_MAX_HEADER_SIZE, read_timeout: None }
    }
}

/// One request, one response.
///
/// `HttpConnection` reads a single request from `R`, hands it to a [`Handler`] together
/// with a [`ResponseWriter`] over `W`, and then closes the write side. There is no
/// keep-alive: every response is the last one on its connection.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: RequestReader<R>,
    writer: ResponseWriter<W>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, &ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: &ConnectionConfig) -> Self {
        let decoder = RequestDecoder::with_max_header_size(config.max_header_size);
        Self {
            reader: RequestReader::new(reader, config.read_buffer_size, decoder).with_read_timeout(config.read_timeout),
            writer: ResponseWriter::new(writer),
        }
    }

    /// Serves the connection.
    ///
    /// # Errors
    ///
    /// A request that can't be parsed is answered with `400 Bad Request` and the parse error
    /// is returned. Errors writing the response are returned as well. Whatever the handler
    /// does with its writer is its own business and never fails the connection.
    pub async fn process<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let request = match self.reader.read_request().await {
            Ok(request) => request,
            Err(e) => {
                error!(cause = %e, "can't receive request, send bad request");
                self.send_bad_request().await;
                return Err(e.into());
            }
        };

        info!(method = request.method(), path = request.target(), body_size = request.body().len(), "received request");

        handler.call(&mut self.writer, request).await;

        if self.writer.state() == WriterState::StatusLine {
            warn!("handler finished without writing a response");
        }

        self.writer.shutdown().await?;
        Ok(())
    }

    async fn send_bad_request(&mut self) {
        if self.writer.state() != WriterState::StatusLine {
            return;
        }

        let result = async {
            self.writer.write_status_line(StatusCode::BAD_REQUEST)?;
            self.writer.write_headers(&default_headers(0))?;
            self.writer.shutdown().await
        };

        // the peer may already be gone; the parse error is what gets reported
        if let Err(e) = result.await {
            debug!(cause = %e, "can't send bad request response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ParseError, Request};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the request body back with a content-length.
    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    impl Handler for Echo {
        async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Request)
        where
            W: AsyncWrite + Unpin + Send,
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            writer.write_status_line(StatusCode::OK).unwrap();
            writer.write_headers(&default_headers(request.body().len())).unwrap();
            writer.write_body(request.body()).await.unwrap();
        }
    }

    struct Silent;

    impl Handler for Silent {
        async fn call<W>(&self, _writer: &mut ResponseWriter<W>, _request: Request)
        where
            W: AsyncWrite + Unpin + Send,
        {
        }
    }

    async fn serve<H: Handler>(input: &str, handler: &H) -> (Result<(), HttpError>, String) {
        let mut output = Vec::new();
        let result = HttpConnection::new(input.as_bytes(), &mut output).process(handler).await;
        (result, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn echo_request_body() {
        let handler = Echo::default();
        let (result, output) = serve("POST /echo HTTP/1.1\r\nHost: h\r\nContent-Length: 5\r\n\r\nhello", &handler).await;

        result.unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            output,
            "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nconnection: close\r\ncontent-type: text/plain\r\n\r\nhello"
        );
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let handler = Echo::default();
        let (result, output) = serve("GET /coffee HTTP/1.0\r\n\r\n", &handler).await;

        let err = result.unwrap_err();
        assert!(matches!(err, HttpError::RequestError { source: ParseError::UnsupportedVersion { .. } }));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            output,
            "HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\ncontent-type: text/plain\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn truncated_request_gets_bad_request() {
        let handler = Echo::default();
        let (result, output) = serve("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel", &handler).await;

        assert!(matches!(result.unwrap_err(), HttpError::RequestError { source: ParseError::BodyLengthMismatch { .. } }));
        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn oversized_head_is_rejected() {
        let handler = Echo::default();
        let config = ConnectionConfig { max_header_size: 64, ..ConnectionConfig::default() };
        let input = format!("GET / HTTP/1.1\r\nX-Filler: {}\r\n\r\n", "a".repeat(128));
        let mut output = Vec::new();

        let result = HttpConnection::with_config(input.as_bytes(), &mut output, &config).process(&handler).await;

        assert!(matches!(result.unwrap_err(), HttpError::RequestError { source: ParseError::TooLargeHeader { .. } }));
        assert!(output.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn silent_handler_writes_nothing() {
        let (result, output) = serve("GET / HTTP/1.1\r\n\r\n", &Silent).await;

        result.unwrap();
        assert!(output.is_empty());
    }
}
