//! Parsed HTTP request types.
//!
//! A [`Request`] is only ever produced once the request decoder has reached
//! [`ParserState::Done`], so every value of this type carries a validated request line,
//! the complete header section and a body whose length matches its `content-length`.

use std::fmt;

use bytes::Bytes;
use http::{Method, Version};

use crate::protocol::Headers;

/// The first line of a request: `METHOD SP TARGET SP HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    pub(crate) fn new(method: String, target: String, version: String) -> Self {
        Self { method, target, version }
    }

    /// The request method, always non-empty uppercase ASCII letters.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target exactly as it appeared on the wire.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The protocol version without the `HTTP/` prefix, always `"1.1"`.
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// The states the request decoder moves through, strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    ParsingRequestLine,
    ParsingHeaders,
    ParsingBody,
    Done,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserState::ParsingRequestLine => "parsing request line",
            ParserState::ParsingHeaders => "parsing headers",
            ParserState::ParsingBody => "parsing body",
            ParserState::Done => "done",
        };
        f.write_str(name)
    }
}

/// A fully parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub(crate) fn new(request_line: RequestLine, headers: Headers, body: Bytes) -> Self {
        Self { request_line, headers, body }
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    pub fn method(&self) -> &str {
        self.request_line.method()
    }

    pub fn target(&self) -> &str {
        self.request_line.target()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The request body; empty when the request carried no `content-length`.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (RequestLine, Headers, Bytes) {
        (self.request_line, self.headers, self.body)
    }
}

/// Converts into the `http` crate's request type, for handlers that want to reuse
/// code written against it. Fails when the target is not a valid URI or a header
/// value contains bytes `http` refuses.
impl TryFrom<Request> for http::Request<Bytes> {
    type Error = http::Error;

    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let (request_line, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(Method::from_bytes(request_line.method.as_bytes())?)
            .uri(request_line.target)
            .version(Version::HTTP_11);

        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }

        builder.body(body)
    }
}
