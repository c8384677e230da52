//! Ordered response writing over an async byte sink.

use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;

use crate::codec::{ResponseEncoder, ResponsePart};
use crate::protocol::{Headers, SendError, WriterState};

const DEFAULT_WRITE_CAPACITY: usize = 8 * 1024;

/// Writes one response, part by part.
///
/// Status line and headers are only buffered; they reach the wire together with the
/// first body write, or on [`flush`](Self::flush). Every body write flushes. Parts written
/// out of order fail with [`SendError::OutOfOrder`] and leave both the buffer and the
/// state untouched, so a caller may recover by writing the expected part.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_WRITE_CAPACITY)
    }

    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(capacity), encoder: ResponseEncoder::new() }
    }

    pub fn state(&self) -> WriterState {
        self.encoder.state()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    ///
    /// Only 200, 400 and 500 carry a reason phrase; any other code is written with an empty
    /// one, as `HTTP/1.1 <code> \r\n`. Codes outside `100..=999` can't be written at all,
    /// since [`StatusCode`] refuses to hold them.
    ///
    /// # Errors
    ///
    /// Fails unless this is the first part of the response.
    pub fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.feed(ResponsePart::StatusLine(status))
    }

    /// Writes every header field followed by the empty line closing the header section.
    ///
    /// # Errors
    ///
    /// Fails unless the status line was the last part written.
    pub fn write_headers(&mut self, headers: &Headers) -> Result<(), SendError> {
        self.feed(ResponsePart::Headers(headers))
    }

    /// Writes raw body bytes and returns how many were written.
    ///
    /// # Errors
    ///
    /// Fails before the headers are written, or when the sink fails.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.feed(ResponsePart::Body(body))?;
        self.flush().await?;
        Ok(body.len())
    }

    /// Writes `body` as one chunk, `<hex size>\r\n<body>\r\n`, and returns the body length.
    /// An empty slice writes nothing, since a zero sized chunk would end the body.
    ///
    /// # Errors
    ///
    /// Fails before the headers are written, after the terminal chunk, or when the sink fails.
    pub async fn write_chunked_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.feed(ResponsePart::Chunk(body))?;
        self.flush().await?;
        Ok(body.len())
    }

    /// Writes the terminal chunk `0\r\n\r\n`.
    ///
    /// # Errors
    ///
    /// Fails before the headers are written, when called twice, or when the sink fails.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), SendError> {
        self.feed(ResponsePart::ChunkEof)?;
        self.flush().await
    }

    /// Writes trailer fields after the terminal chunk, followed by an empty line.
    ///
    /// # Errors
    ///
    /// Fails unless the terminal chunk was written and no trailers were sent yet.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), SendError> {
        self.feed(ResponsePart::Trailers(trailers))?;
        self.flush().await
    }

    /// Pushes everything buffered to the sink.
    ///
    /// # Errors
    ///
    /// Fails when the sink fails.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if !self.buffer.is_empty() {
            self.writer.write_all_buf(&mut self.buffer).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Flushes and then shuts the sink down.
    ///
    /// # Errors
    ///
    /// Fails when the sink fails.
    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    fn feed(&mut self, part: ResponsePart<'_>) -> Result<(), SendError> {
        self.encoder.encode(part, &mut self.buffer)
    }
}
