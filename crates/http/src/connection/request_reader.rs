//! The read loop feeding the request decoder.

use std::io;
use std::io::ErrorKind;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::RequestDecoder;
use crate::protocol::{ParseError, Request};

/// Reads one request from a byte stream.
///
/// The reader owns a growable buffer. Each cycle reads into the free tail of the buffer,
/// lets the [`RequestDecoder`] consume as many complete pieces as it can, and drops the
/// consumed prefix so the unparsed remainder sits at the start again. A line or body split
/// across reads therefore simply stays buffered until the rest arrives.
#[derive(Debug)]
pub struct RequestReader<R> {
    reader: R,
    buffer: BytesMut,
    read_size: usize,
    decoder: RequestDecoder,
    read_timeout: Option<Duration>,
}

impl<R> RequestReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, read_size: usize, decoder: RequestDecoder) -> Self {
        Self { reader, buffer: BytesMut::with_capacity(read_size), read_size, decoder, read_timeout: None }
    }

    /// Fails a read that waits longer than `timeout` for data with [`ErrorKind::TimedOut`].
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Reads until one request is complete.
    ///
    /// # Errors
    ///
    /// Any decoder error is returned as is. If the stream ends before the request is
    /// complete, the result is [`ParseError::IncompleteRequest`] or, when the body was cut
    /// short, [`ParseError::BodyLengthMismatch`].
    pub async fn read_request(&mut self) -> Result<Request, ParseError> {
        loop {
            if let Some(request) = self.decoder.decode(&mut self.buffer)? {
                return Ok(request);
            }

            // reclaims the consumed prefix, moving the unparsed bytes to the front
            self.buffer.reserve(self.read_size);

            let read = self.read_more().await?;
            if read == 0 {
                trace!(buffered = self.buffer.len(), state = %self.decoder.state(), "reached end of input");
                return match self.decoder.decode_eof(&mut self.buffer)? {
                    Some(request) => Ok(request),
                    None => Err(ParseError::incomplete_request(self.decoder.state())),
                };
            }

            trace!(read, buffered = self.buffer.len(), "read request bytes");
        }
    }

    async fn read_more(&mut self) -> Result<usize, ParseError> {
        let read = self.reader.read_buf(&mut self.buffer);
        let result = match self.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read).await.map_err(|_elapsed| io::Error::from(ErrorKind::TimedOut))?,
            None => read.await,
        };
        result.map_err(ParseError::io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ParserState;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Hands out at most `chunk_size` bytes per read.
    struct ChunkReader {
        data: Vec<u8>,
        position: usize,
        chunk_size: usize,
    }

    impl ChunkReader {
        fn new(data: &str, chunk_size: usize) -> Self {
            Self { data: data.as_bytes().to_vec(), position: 0, chunk_size }
        }
    }

    impl AsyncRead for ChunkReader {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            let end = (self.position + self.chunk_size).min(self.data.len()).min(self.position + buf.remaining());
            let chunk = self.data[self.position..end].to_vec();
            buf.put_slice(&chunk);
            self.position = end;
            Poll::Ready(Ok(()))
        }
    }

    async fn read_with(data: &str, chunk_size: usize) -> Result<Request, ParseError> {
        RequestReader::new(ChunkReader::new(data, chunk_size), 16, RequestDecoder::new()).read_request().await
    }

    const POST: &str = "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 13\r\n\r\nhello world!\n";

    #[tokio::test]
    async fn good_request_line() {
        let request = read_with("GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n", 3)
            .await
            .unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.target(), "/");
        assert_eq!(request.request_line().version(), "1.1");
    }

    #[tokio::test]
    async fn good_request_line_with_path() {
        let request = read_with("GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n", 1).await.unwrap();

        assert_eq!(request.target(), "/coffee");
    }

    #[tokio::test]
    async fn every_chunk_size_gives_the_same_request() {
        let expected = read_with(POST, POST.len()).await.unwrap();
        assert_eq!(&expected.body()[..], b"hello world!\n");
        assert_eq!(expected.headers().get("content-length"), Some("13"));

        for chunk_size in 1..=POST.len() {
            let request = read_with(POST, chunk_size).await.unwrap();
            assert_eq!(request, expected, "chunk size {chunk_size}");
        }
    }

    #[tokio::test]
    async fn request_larger_than_initial_buffer() {
        let body = "x".repeat(4096);
        let message = format!("PUT /upload HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len());

        let request = read_with(&message, 1000).await.unwrap();
        assert_eq!(request.body().len(), 4096);
    }

    #[tokio::test]
    async fn body_shorter_than_content_length() {
        let err = read_with("POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 20\r\n\r\npartial content", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::BodyLengthMismatch { expected: 20, received: 15 }));
    }

    #[tokio::test]
    async fn missing_end_of_headers() {
        let err = read_with("GET / HTTP/1.1\r\nHost: localhost:42069\r\n", 4).await.unwrap_err();

        assert!(matches!(err, ParseError::IncompleteRequest { state: ParserState::ParsingHeaders }));
    }

    #[tokio::test]
    async fn empty_input() {
        let err = read_with("", 4).await.unwrap_err();

        assert!(matches!(err, ParseError::IncompleteRequest { state: ParserState::ParsingRequestLine }));
    }

    #[tokio::test]
    async fn invalid_number_of_parts() {
        let err = read_with("/coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n", 3).await.unwrap_err();

        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[tokio::test]
    async fn read_timeout() {
        let (client, server) = tokio::io::duplex(64);
        let mut reader = RequestReader::new(server, 64, RequestDecoder::new()).with_read_timeout(Some(Duration::from_millis(20)));

        let err = reader.read_request().await.unwrap_err();
        assert!(matches!(&err, ParseError::Io { source } if source.kind() == ErrorKind::TimedOut));
        drop(client);
    }
}
