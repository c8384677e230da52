//! HTTP codec module for decoding requests and encoding responses
//!
//! Everything in here is sans-io: decoders look at the bytes buffered so far and report
//! how many they consumed, encoders append to a [`bytes::BytesMut`]. The connection layer
//! owns the sockets and drives both sides.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`parse_request_line`]: parses the first line of a request
//!   - Header lines via [`Headers::parse`](crate::protocol::Headers::parse)
//!   - Content-length bodies via [`LengthDecoder`]
//!   - [`RequestDecoder`]: the state machine tying the three together
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: enforces status line, headers, body ordering
//!   - Header encoding via the `header` module
//!   - Chunked framing via the `body` module
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET /coffee HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.target(), "/coffee");
//! ```

mod body;
mod header;
mod request_decoder;
mod request_line;
mod response_encoder;

pub use body::LengthDecoder;
pub use request_decoder::DEFAULT_MAX_HEADER_SIZE;
pub use request_decoder::RequestDecoder;
pub use request_line::parse_request_line;
pub use response_encoder::ResponseEncoder;
pub use response_encoder::ResponsePart;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Index of the first CRLF in `src`, if any.
pub(crate) fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF.len()).position(|window| window == CRLF)
}
