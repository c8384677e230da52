use bytes::{Buf, Bytes};

/// Input of the chunked body encoder.
///
/// `Chunk` is framed as one chunk; `Eof` becomes the terminal `0\r\n\r\n` after which
/// the encoder ignores anything else it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}
