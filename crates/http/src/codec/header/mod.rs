//! Header line parsing and header section encoding
//!
//! - `Headers::parse` (in `header_decoder`): consumes one CRLF terminated field line at a
//!   time and validates the field name against the RFC 9110 token set
//! - [`HeaderEncoder`]: writes a [`Headers`](crate::protocol::Headers) collection as a
//!   header section, used for both response headers and chunked trailers

mod header_decoder;
mod header_encoder;

pub use header_encoder::HeaderEncoder;
