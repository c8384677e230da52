//! Response-side state shared by the encoder and the writer.

use std::fmt;

/// Where a response currently is in its emission order.
///
/// The order is strictly forward: status line, then headers, then any number of body
/// writes. Only [`WriterState::Body`] may be entered repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterState {
    #[default]
    StatusLine,
    Headers,
    Body,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterState::StatusLine => "status line",
            WriterState::Headers => "headers",
            WriterState::Body => "body",
        };
        f.write_str(name)
    }
}
