//! HTTP request decoder module
//!
//! This module provides the state machine that turns buffered bytes into a [`Request`].
//! It moves through [`ParserState`] strictly in order:
//!
//! ```text
//! ParsingRequestLine -> ParsingHeaders -> ParsingBody -> Done
//! ```
//!
//! `ParsingBody` is skipped when the request has no Content-Length or declares zero.
//! Chunked request bodies are not supported, so Content-Length is the only body framing.
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"POST /coffee HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel"[..]);
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.extend_from_slice(b"lo");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(&request.body()[..], b"hello");
//! ```

use std::mem;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::LengthDecoder;
use crate::codec::request_line::parse_request_line;
use crate::ensure;
use crate::protocol::{Headers, ParseError, ParserState, Request, RequestLine};

/// Default limit for the request line plus header section, in bytes.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

/// A decoder for HTTP requests implementing the [`Decoder`] trait.
///
/// Besides the [`Decoder`] interface, [`RequestDecoder::parse`] exposes the raw step
/// loop over a byte slice for callers that manage their own buffer.
#[derive(Debug)]
pub struct RequestDecoder {
    state: ParserState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Option<LengthDecoder>,
    /// bytes of request line and header section consumed so far
    head_size: usize,
    max_header_size: usize,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with the default header size limit
    pub fn new() -> Self {
        Self::with_max_header_size(DEFAULT_MAX_HEADER_SIZE)
    }

    /// Creates a new `RequestDecoder` rejecting requests whose request line and headers
    /// together exceed `max_header_size` bytes
    pub fn with_max_header_size(max_header_size: usize) -> Self {
        Self {
            state: ParserState::ParsingRequestLine,
            request_line: None,
            headers: Headers::new(),
            body: None,
            head_size: 0,
            max_header_size,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Runs parse steps over `src` until one needs more input, fails, or the request is done.
    ///
    /// # Returns
    ///
    /// The number of bytes consumed from the front of `src`. The caller must drop exactly
    /// that many bytes before feeding the rest back together with newly read data.
    pub fn parse(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        let mut parsed = 0;
        while self.state != ParserState::Done {
            let before = self.state;
            let consumed = self.parse_step(&src[parsed..])?;
            parsed += consumed;

            if consumed == 0 && self.state == before {
                break;
            }
        }

        if matches!(self.state, ParserState::ParsingRequestLine | ParserState::ParsingHeaders) {
            let buffered = self.head_size + (src.len() - parsed);
            ensure!(buffered <= self.max_header_size, ParseError::too_large_header(buffered, self.max_header_size));
        }

        Ok(parsed)
    }

    /// Runs a single step of the current state against `src`.
    fn parse_step(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::ParsingRequestLine => {
                let Some((request_line, consumed)) = parse_request_line(src)? else {
                    return Ok(0);
                };
                self.request_line = Some(request_line);
                self.add_head_size(consumed)?;
                self.state = ParserState::ParsingHeaders;
                Ok(consumed)
            }

            ParserState::ParsingHeaders => {
                let (consumed, done) = self.headers.parse(src)?;
                self.add_head_size(consumed)?;
                if done {
                    self.state = self.start_body()?;
                }
                Ok(consumed)
            }

            ParserState::ParsingBody => {
                let Some(body) = &mut self.body else {
                    self.state = ParserState::Done;
                    return Ok(0);
                };
                let (consumed, _) = body.parse(src);
                if body.is_complete() {
                    self.state = ParserState::Done;
                }
                Ok(consumed)
            }

            ParserState::Done => Ok(0),
        }
    }

    fn add_head_size(&mut self, consumed: usize) -> Result<(), ParseError> {
        self.head_size += consumed;
        ensure!(self.head_size <= self.max_header_size, ParseError::too_large_header(self.head_size, self.max_header_size));
        Ok(())
    }

    /// Picks the state that follows the header section, based on Content-Length.
    fn start_body(&mut self) -> Result<ParserState, ParseError> {
        let Some(value) = self.headers.get(http::header::CONTENT_LENGTH.as_str()) else {
            trace!("no content-length, request has no body");
            return Ok(ParserState::Done);
        };

        let content_length = value
            .parse::<u64>()
            .ok()
            .filter(|_| value.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| ParseError::invalid_content_length(format!("value {value:?} is not a decimal u64")))?;

        trace!(content_length, "headers done");
        if content_length == 0 {
            return Ok(ParserState::Done);
        }

        self.body = Some(LengthDecoder::new(content_length));
        Ok(ParserState::ParsingBody)
    }

    /// Takes the finished request out and resets the decoder for the next message.
    fn take_request(&mut self) -> Option<Request> {
        debug_assert_eq!(self.state, ParserState::Done);
        let request_line = self.request_line.take()?;
        let headers = mem::take(&mut self.headers);
        let body = self.body.take().map_or_else(Bytes::new, LengthDecoder::into_bytes);

        self.state = ParserState::ParsingRequestLine;
        self.head_size = 0;
        Some(Request::new(request_line, headers, body))
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode a request from the bytes buffered in `src`
    ///
    /// Consumed bytes are split off the front of `src`, so the buffer only ever holds
    /// unparsed input and its free capacity can be reclaimed for the next read.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the request is complete
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request is malformed; the decoder must not be used again
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let consumed = self.parse(src)?;
        src.advance(consumed);

        if self.state == ParserState::Done {
            return Ok(self.take_request());
        }
        Ok(None)
    }

    /// Runs a final parse over the residual bytes once the input has ended
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the residual bytes completed the request
    /// - `Ok(None)`: the input ended cleanly between requests
    /// - `Err(ParseError::BodyLengthMismatch)`: the input ended inside the body
    /// - `Err(ParseError::IncompleteRequest)`: the input ended inside the request line or headers
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        match (self.state, &self.body) {
            (ParserState::ParsingRequestLine, _) if src.is_empty() => Ok(None),
            (ParserState::ParsingBody, Some(body)) => Err(ParseError::body_length_mismatch(body.content_length(), body.current_length())),
            (state, _) => Err(ParseError::incomplete_request(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn get_request() -> String {
        indoc! {r##"
        GET /coffee HTTP/1.1
        Host: localhost:42069
        User-Agent: curl/7.81.0
        Accept: */*

        "##}
        .replace('\n', "\r\n")
    }

    fn post_request() -> String {
        indoc! {r##"
        POST /submit HTTP/1.1
        Host: localhost:42069
        Content-Length: 12

        hello world!"##}
        .replace('\n', "\r\n")
    }

    fn decode_all(src: &[u8]) -> Result<Option<Request>, ParseError> {
        let mut buffer = BytesMut::from(src);
        RequestDecoder::new().decode_eof(&mut buffer)
    }

    #[test]
    fn decode_get() {
        let request = decode_all(get_request().as_bytes()).unwrap().unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.target(), "/coffee");
        assert_eq!(request.request_line().version(), "1.1");
        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.headers().get("host"), Some("localhost:42069"));
        assert_eq!(request.headers().get("user-agent"), Some("curl/7.81.0"));
        assert_eq!(request.headers().get("accept"), Some("*/*"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn decode_post_with_body() {
        let request = decode_all(post_request().as_bytes()).unwrap().unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(&request.body()[..], b"hello world!");
    }

    #[test]
    fn leave_bytes_after_body_in_buffer() {
        let mut buffer = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET / HTTP/1.1\r\n");
        let mut decoder = RequestDecoder::new();

        let request = decoder.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(&request.body()[..], b"hello");
        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");
        assert_eq!(decoder.state(), ParserState::ParsingRequestLine);
    }

    #[test]
    fn zero_content_length_needs_no_body_bytes() {
        let mut buffer = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");

        let request = RequestDecoder::new().decode(&mut buffer).unwrap().unwrap();

        assert!(request.body().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn state_advances_with_input() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::new();

        buffer.extend_from_slice(b"POST /x HTTP/1.1\r\nContent-Le");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(decoder.state(), ParserState::ParsingHeaders);
        assert_eq!(&buffer[..], b"Content-Le");

        buffer.extend_from_slice(b"ngth: 4\r\n\r\nab");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(decoder.state(), ParserState::ParsingBody);
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"cd");
        let request = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&request.body()[..], b"abcd");
    }

    #[test]
    fn every_split_point_gives_the_same_request() {
        for message in [get_request(), post_request()] {
            let expected = decode_all(message.as_bytes()).unwrap().unwrap();

            for split in 0..=message.len() {
                let (first, second) = message.as_bytes().split_at(split);
                let mut decoder = RequestDecoder::new();
                let mut buffer = BytesMut::new();

                buffer.extend_from_slice(first);
                let early = decoder.decode(&mut buffer).unwrap();
                buffer.extend_from_slice(second);
                let request = match early {
                    Some(request) => request,
                    None => decoder.decode_eof(&mut buffer).unwrap().unwrap(),
                };

                assert_eq!(request, expected, "split at {split}");
            }
        }
    }

    #[test]
    fn every_pair_of_split_points_gives_the_same_request() {
        let message = post_request();
        let message = message.as_bytes();
        let expected = decode_all(message).unwrap().unwrap();

        for first in 0..=message.len() {
            for second in first..=message.len() {
                let mut decoder = RequestDecoder::new();
                let mut buffer = BytesMut::new();
                let mut decoded = None;

                for part in [&message[..first], &message[first..second], &message[second..]] {
                    buffer.extend_from_slice(part);
                    if let Some(request) = decoder.decode(&mut buffer).unwrap() {
                        decoded = Some(request);
                    }
                }

                assert_eq!(decoded.as_ref(), Some(&expected), "splits at {first} and {second}");
            }
        }
    }

    #[test]
    fn reject_malformed_request_line() {
        let err = decode_all(b"/coffee HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[test]
    fn reject_malformed_header() {
        let err = decode_all(b"GET / HTTP/1.1\r\nHost : localhost\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFieldName { .. }));
    }

    #[test]
    fn reject_invalid_content_length() {
        let err = decode_all(b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength { .. }));

        let err = decode_all(b"POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 5\r\n\r\nhello").unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength { .. }));

        for value in ["+5", "-1", "0x5", ""] {
            let message = format!("POST / HTTP/1.1\r\nContent-Length: {value}\r\n\r\nhello");
            let err = decode_all(message.as_bytes()).unwrap_err();
            assert!(matches!(err, ParseError::InvalidContentLength { .. }), "content-length {value:?} should be rejected");
        }
    }

    #[test]
    fn incomplete_headers_at_eof() {
        let err = decode_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::IncompleteRequest { state: ParserState::ParsingHeaders }));

        let err = decode_all(b"GET / HTTP/1.1").unwrap_err();
        assert!(matches!(err, ParseError::IncompleteRequest { state: ParserState::ParsingRequestLine }));
    }

    #[test]
    fn short_body_at_eof() {
        let err = decode_all(b"POST / HTTP/1.1\r\nContent-Length: 20\r\n\r\npartial content").unwrap_err();
        assert!(matches!(err, ParseError::BodyLengthMismatch { expected: 20, received: 15 }));
    }

    #[test]
    fn empty_input_at_eof() {
        assert!(decode_all(b"").unwrap().is_none());
    }

    #[test]
    fn reject_too_large_header() {
        let mut decoder = RequestDecoder::with_max_header_size(64);
        let mut buffer = BytesMut::from("GET / HTTP/1.1\r\n");
        buffer.extend_from_slice(format!("X-Long: {}", "a".repeat(64)).as_bytes());

        let err = decoder.decode(&mut buffer).unwrap_err();
        assert!(matches!(err, ParseError::TooLargeHeader { max_size: 64, .. }));
    }

    #[test]
    fn reject_too_large_complete_header() {
        let message = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "a".repeat(64));
        let mut buffer = BytesMut::from(message.as_str());

        let err = RequestDecoder::with_max_header_size(64).decode(&mut buffer).unwrap_err();
        assert!(matches!(err, ParseError::TooLargeHeader { max_size: 64, .. }));
    }

    #[test]
    fn large_body_is_not_limited_by_header_size() {
        let body = "b".repeat(256);
        let message = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len());
        let mut buffer = BytesMut::from(message.as_str());

        let request = RequestDecoder::with_max_header_size(64).decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.body().len(), 256);
    }

    #[tokio::test]
    async fn framed_read_yields_each_request_then_ends() {
        use futures::StreamExt;
        use tokio_util::codec::FramedRead;

        let input = format!("{}{}", post_request(), get_request());
        let mut framed = FramedRead::with_capacity(input.as_bytes(), RequestDecoder::new(), 8);

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.target(), "/submit");
        assert_eq!(&first.body()[..], b"hello world!");

        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(second.target(), "/coffee");

        assert!(framed.next().await.is_none());
    }
}
