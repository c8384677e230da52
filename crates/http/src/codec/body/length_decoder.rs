//! Decoder for request bodies framed by a Content-Length header.
//!
//! See [RFC 9112 Section 6.2](https://www.rfc-editor.org/rfc/rfc9112#section-6.2).

use std::cmp;

use bytes::{Bytes, BytesMut};
use tracing::trace;

/// Accumulates a body of a declared length.
///
/// The decoder never takes more than the bytes still missing from the body, so whatever
/// follows the body in the input stays in the caller's buffer.
///
/// Invariant: `current_length <= content_length`; the body is complete exactly when the
/// two are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The declared body size, from the Content-Length header
    content_length: u64,
    /// The number of bytes accumulated so far
    current_length: u64,
    body: BytesMut,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder instance.
    ///
    /// # Arguments
    /// * `content_length` - The total content length to decode, specified by Content-Length header
    pub fn new(content_length: u64) -> Self {
        let capacity = usize::try_from(content_length).unwrap_or(usize::MAX).min(MAX_PREALLOCATE);
        Self { content_length, current_length: 0, body: BytesMut::with_capacity(capacity) }
    }

    /// Appends as much of `src` as the body is still missing.
    ///
    /// # Returns
    /// `(consumed, done)`: the number of bytes taken from the front of `src`, and whether
    /// the body is now complete. A zero length body is complete without any input.
    pub fn parse(&mut self, src: &[u8]) -> (usize, bool) {
        let remaining = self.content_length - self.current_length;
        let len = cmp::min(remaining, src.len() as u64) as usize;

        self.body.extend_from_slice(&src[..len]);
        self.current_length += len as u64;
        trace!(read = len, current = self.current_length, total = self.content_length, "read body bytes");

        (len, self.is_complete())
    }

    pub fn is_complete(&self) -> bool {
        self.current_length == self.content_length
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn current_length(&self) -> u64 {
        self.current_length
    }

    /// Consumes the decoder and returns the bytes accumulated so far.
    pub fn into_bytes(self) -> Bytes {
        self.body.freeze()
    }
}

/// Upper bound for the buffer reserved up front, so a huge declared length cannot make
/// us allocate before any byte has arrived.
const MAX_PREALLOCATE: usize = 64 * 1024;
