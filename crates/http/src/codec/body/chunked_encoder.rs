use std::io::Write;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::CRLF;
use crate::protocol::{PayloadItem, SendError};
use crate::utils::FastWrite;

const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Frames payload items with chunked transfer coding.
///
/// Every chunk is written as its length in lowercase hex, CRLF, the data and CRLF.
/// [`PayloadItem::Eof`] writes the terminal zero-length chunk, after which the encoder
/// refuses further items.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: u64,
}

impl ChunkedEncoder {
    /// Whether the terminal chunk has been written.
    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let size = bytes.remaining();
                // an empty chunk would be read as the terminal one
                if size == 0 {
                    return Ok(());
                }

                dst.reserve(size + 16);
                write!(FastWrite(dst), "{size:x}\r\n")?;
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                dst.extend_from_slice(CRLF);

                self.send_size += size as u64;
                trace!(size, total = self.send_size, "encoded chunk");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(LAST_CHUNK);
                Ok(())
            }
        }
    }
}
