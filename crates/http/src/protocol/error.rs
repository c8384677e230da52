use std::io;
use thiserror::Error;

use crate::protocol::{ParserState, WriterState};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("unsupported http version: {version}")]
    UnsupportedVersion { version: String },

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("malformed field name: {reason}")]
    MalformedFieldName { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("incomplete request, input ended in state {state}")]
    IncompleteRequest { state: ParserState },

    #[error("body length mismatch, content-length is {expected} but only {received} bytes received")]
    BodyLengthMismatch { expected: u64, received: u64 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_request_line<S: ToString>(str: S) -> Self {
        Self::MalformedRequestLine { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn malformed_field_name<S: ToString>(str: S) -> Self {
        Self::MalformedFieldName { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn incomplete_request(state: ParserState) -> Self {
        Self::IncompleteRequest { state }
    }

    pub fn body_length_mismatch(expected: u64, received: u64) -> Self {
        Self::BodyLengthMismatch { expected, received }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("cannot write {part} in state {state}")]
    OutOfOrder { part: &'static str, state: WriterState },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn out_of_order(part: &'static str, state: WriterState) -> Self {
        Self::OutOfOrder { part, state }
    }

    pub fn is_out_of_order(&self) -> bool {
        matches!(self, Self::OutOfOrder { .. })
    }
}
