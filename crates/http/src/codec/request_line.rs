//! Request line parsing.
//!
//! The request line is the first CRLF terminated line of a request and must consist of
//! exactly three tokens separated by single spaces: `METHOD SP TARGET SP HTTP/1.1`.

use tracing::trace;

use crate::codec::{CRLF, find_crlf};
use crate::ensure;
use crate::protocol::{ParseError, RequestLine};

const HTTP_PREFIX: &str = "HTTP/";
const SUPPORTED_VERSION: &str = "1.1";

/// Parses a request line from the start of `src`.
///
/// # Returns
///
/// - `Ok(Some((line, consumed)))` once a full line is buffered; `consumed` includes the CRLF
/// - `Ok(None)` if no CRLF has arrived yet, nothing is consumed
/// - `Err(_)` if the line is malformed, has an unsupported version or an invalid method
pub fn parse_request_line(src: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(src) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&src[..line_end]).map_err(|_| ParseError::malformed_request_line("request line is not utf-8"))?;
    let consumed = line_end + CRLF.len();

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(ParseError::malformed_request_line(format!("expect 3 parts but got {}: {line:?}", parts.len())));
    };

    let version = match version.strip_prefix(HTTP_PREFIX) {
        Some(version) => version,
        None => return Err(ParseError::unsupported_version(*version)),
    };
    ensure!(version == SUPPORTED_VERSION, ParseError::unsupported_version(version));
    ensure!(is_valid_method(method), ParseError::invalid_method(*method));

    trace!(method, target, "parsed request line");
    Ok(Some((RequestLine::new(method.to_string(), target.to_string(), version.to_string()), consumed)))
}

fn is_valid_method(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get() {
        let src = b"GET / HTTP/1.1\r\nHost: localhost:42069\r\n\r\n";
        let (line, consumed) = parse_request_line(src).unwrap().unwrap();

        assert_eq!(line.method(), "GET");
        assert_eq!(line.target(), "/");
        assert_eq!(line.version(), "1.1");
        assert_eq!(consumed, "GET / HTTP/1.1\r\n".len());
    }

    #[test]
    fn parse_various_methods_and_targets() {
        for (method, target) in [("POST", "/coffee"), ("DELETE", "/a/b?c=d"), ("PATCH", "*"), ("M", "http://example.com/x")] {
            let src = format!("{method} {target} HTTP/1.1\r\n");
            let (line, consumed) = parse_request_line(src.as_bytes()).unwrap().unwrap();

            assert_eq!(line.method(), method);
            assert_eq!(line.target(), target);
            assert_eq!(consumed, src.len());
        }
    }

    #[test]
    fn need_more_data_without_crlf() {
        assert!(parse_request_line(b"").unwrap().is_none());
        assert!(parse_request_line(b"GET / HTTP/1.1").unwrap().is_none());
        assert!(parse_request_line(b"GET / HTTP/1.1\r").unwrap().is_none());
    }

    #[test]
    fn reject_wrong_token_count() {
        let err = parse_request_line(b"/coffee HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));

        let err = parse_request_line(b"GET  /coffee HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));

        let err = parse_request_line(b"GET /coffee HTTP/1.1 extra\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[test]
    fn reject_unsupported_version() {
        let err = parse_request_line(b"GET / HTTP/1.0\r\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { version } if version == "1.0"));

        let err = parse_request_line(b"GET / HTTP/2\r\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { .. }));

        let err = parse_request_line(b"GET / 1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { .. }));
    }

    #[test]
    fn reject_invalid_method() {
        for method in ["get", "Get", "G3T", "GET!", ""] {
            let src = format!("{method} / HTTP/1.1\r\n");
            let err = parse_request_line(src.as_bytes()).unwrap_err();
            assert!(matches!(err, ParseError::InvalidMethod { .. }), "method {method:?} should be rejected");
        }
    }
}
