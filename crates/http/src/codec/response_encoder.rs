//! HTTP response encoder module
//!
//! [`ResponseEncoder`] serializes the parts of a response and enforces the order they may
//! appear in. The allowed transitions are:
//!
//! ```text
//! part        | required state | next state
//! ------------+----------------+-----------
//! StatusLine  | StatusLine     | Headers
//! Headers     | Headers        | Body
//! Body        | Body           | Body       (not once a chunk was written)
//! Chunk       | Body           | Body       (not after Body or ChunkEof)
//! ChunkEof    | Body           | Body       (once, not after Body)
//! Trailers    | Body           | Body       (once, only after ChunkEof)
//! ```
//!
//! The first body part fixes the framing of the whole body: raw `Body` bytes and chunks
//! never mix. Any other combination is rejected with [`SendError::OutOfOrder`] and nothing
//! is written.

use std::io::Write;

use bytes::BytesMut;
use http::StatusCode;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::body::ChunkedEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Headers, PayloadItem, SendError, WriterState};
use crate::utils::FastWrite;

/// One piece of a response, in the order they are written.
#[derive(Debug, Clone, Copy)]
pub enum ResponsePart<'a> {
    StatusLine(StatusCode),
    Headers(&'a Headers),
    /// Raw body bytes, for bodies whose length was declared in the headers
    Body(&'a [u8]),
    /// Body bytes framed as one chunk
    Chunk(&'a [u8]),
    /// The terminal zero-length chunk
    ChunkEof,
    /// Header fields sent after the terminal chunk
    Trailers(&'a Headers),
}

impl ResponsePart<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ResponsePart::StatusLine(_) => "status line",
            ResponsePart::Headers(_) => "headers",
            ResponsePart::Body(_) => "body",
            ResponsePart::Chunk(_) => "chunked body",
            ResponsePart::ChunkEof => "chunked body end",
            ResponsePart::Trailers(_) => "trailers",
        }
    }
}

/// How the body of the current response is framed, decided by its first body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Fixed,
    Chunked,
}

/// Encoder for HTTP responses implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    state: WriterState,
    header_encoder: HeaderEncoder,
    chunked_encoder: ChunkedEncoder,
    body_mode: Option<BodyMode>,
    trailers_sent: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Whether `part` may be written in the current state.
    fn accepts(&self, part: &ResponsePart<'_>) -> bool {
        match (self.state, part) {
            (WriterState::StatusLine, ResponsePart::StatusLine(_)) => true,
            (WriterState::Headers, ResponsePart::Headers(_)) => true,
            (WriterState::Body, ResponsePart::Body(_)) => self.body_mode != Some(BodyMode::Chunked),
            (WriterState::Body, ResponsePart::Chunk(_) | ResponsePart::ChunkEof) => {
                self.body_mode != Some(BodyMode::Fixed) && !self.chunked_encoder.is_finish()
            }
            (WriterState::Body, ResponsePart::Trailers(_)) => self.chunked_encoder.is_finish() && !self.trailers_sent,
            _ => false,
        }
    }
}

impl Encoder<ResponsePart<'_>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, part: ResponsePart<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if !self.accepts(&part) {
            return Err(SendError::out_of_order(part.name(), self.state));
        }

        match part {
            ResponsePart::StatusLine(status) => {
                encode_status_line(status, dst)?;
                self.state = WriterState::Headers;
            }
            ResponsePart::Headers(headers) => {
                self.header_encoder.encode(headers, dst)?;
                self.state = WriterState::Body;
            }
            ResponsePart::Body(bytes) => {
                dst.extend_from_slice(bytes);
                self.body_mode = Some(BodyMode::Fixed);
            }
            ResponsePart::Chunk(bytes) => {
                self.chunked_encoder.encode(PayloadItem::Chunk(bytes), dst)?;
                self.body_mode = Some(BodyMode::Chunked);
            }
            ResponsePart::ChunkEof => {
                self.chunked_encoder.encode(PayloadItem::<&[u8]>::Eof, dst)?;
                self.body_mode = Some(BodyMode::Chunked);
            }
            ResponsePart::Trailers(trailers) => {
                self.header_encoder.encode(trailers, dst)?;
                self.trailers_sent = true;
            }
        }

        trace!(part = part.name(), state = %self.state, "encoded response part");
        Ok(())
    }
}

/// Reason phrases for the status codes this server produces itself. Other codes are
/// written with an empty reason, which RFC 9112 permits.
fn reason_phrase(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::OK | StatusCode::BAD_REQUEST | StatusCode::INTERNAL_SERVER_ERROR => status.canonical_reason(),
        _ => None,
    }
}

fn encode_status_line(status: StatusCode, dst: &mut BytesMut) -> Result<(), SendError> {
    let reason = reason_phrase(status).unwrap_or_default();
    write!(FastWrite(dst), "HTTP/1.1 {} {reason}\r\n", status.as_str())?;
    Ok(())
}
