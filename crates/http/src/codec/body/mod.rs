//! HTTP body handling for request and response payloads
//!
//! # Components
//!
//! - [`LengthDecoder`]: accumulates a request body of a declared Content-Length
//! - [`ChunkedEncoder`]: frames response payloads with chunked transfer coding
//!
//! Request bodies are only ever framed by Content-Length; chunked framing is only
//! produced on the response side.

mod chunked_encoder;
mod length_decoder;

pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
