//! Serialization of header sections.
//!
//! Response headers and chunked trailers share the same layout: one `name: value` line
//! per field in the collection's iteration order, followed by an empty line.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::CRLF;
use crate::protocol::{Headers, SendError};

/// Encoder for a header section implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<&Headers> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, headers: &Headers, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size: usize = headers.iter().map(|(name, value)| name.len() + value.len() + 4).sum();
        dst.reserve(size + CRLF.len());

        for (name, value) in headers.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(CRLF);
        }
        dst.put_slice(CRLF);
        Ok(())
    }
}
