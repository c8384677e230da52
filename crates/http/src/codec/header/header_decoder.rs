//! Incremental parsing of header field lines.
//!
//! Each call to [`Headers::parse`] looks at exactly one CRLF terminated line, so the
//! request decoder can feed it whatever has been buffered and call it again with the rest.

use tracing::trace;

use crate::codec::{CRLF, find_crlf};
use crate::ensure;
use crate::protocol::{Headers, ParseError};

impl Headers {
    /// Parses one header line from the start of `src`.
    ///
    /// # Returns
    ///
    /// - `Ok((0, false))` if no complete line is buffered yet
    /// - `Ok((2, true))` if the line is empty, which ends the header section
    /// - `Ok((consumed, false))` after storing one field, `consumed` includes the CRLF
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedFieldName`] if the line has no colon, or the name is
    /// empty, ends with whitespace or contains a byte outside the RFC 9110 token set.
    /// Nothing is stored in that case and the whole request must be rejected.
    pub fn parse(&mut self, src: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(line_end) = find_crlf(src) else {
            return Ok((0, false));
        };

        if line_end == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &src[..line_end];
        let Some(colon) = line.iter().position(|b| *b == b':') else {
            return Err(ParseError::malformed_field_name("header line has no colon"));
        };

        let (name, value) = (&line[..colon], &line[colon + 1..]);
        ensure!(!name.is_empty(), ParseError::malformed_field_name("field name is empty"));
        ensure!(
            !name.last().is_some_and(u8::is_ascii_whitespace),
            ParseError::malformed_field_name("field name contains space before colon")
        );

        if let Some(invalid) = name.iter().find(|b| !is_token_char(**b)) {
            return Err(ParseError::malformed_field_name(format!("invalid character {:?} in field name", char::from(*invalid))));
        }

        // token chars are ascii, so this never fails
        let name = String::from_utf8_lossy(name);
        let value = String::from_utf8_lossy(value.trim_ascii());

        trace!(name = %name, value = %value, "parsed header field");
        self.set(&name, &value);

        Ok((line_end + CRLF.len(), false))
    }
}

/// Checks a byte against the `tchar` rule of RFC 9110 section 5.6.2.
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}
