//! Core HTTP protocol types.
//!
//! This module holds the values that flow between the codec and the connection layer:
//!
//! - **Requests**: [`Request`], its [`RequestLine`] and the decoder's [`ParserState`]
//! - **Headers**: the case-insensitive [`Headers`] collection
//! - **Responses**: the response writer's [`WriterState`]
//! - **Payloads**: [`PayloadItem`], the unit the chunked encoder frames
//! - **Errors**:
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request parsing errors
//!   - [`SendError`]: Response sending errors

mod message;
pub use message::PayloadItem;

mod headers;
pub use headers::Headers;
pub use headers::default_headers;

mod request;
pub use request::ParserState;
pub use request::Request;
pub use request::RequestLine;

mod response;
pub use response::WriterState;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
