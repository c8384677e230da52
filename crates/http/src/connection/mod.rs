//! HTTP connection handling module
//!
//! Wires the sans-io codecs to async byte streams:
//!
//! - [`RequestReader`]: the read loop that feeds socket bytes to the request decoder until
//!   one request is complete
//! - [`ResponseWriter`]: ordered, buffered response output
//! - [`HttpConnection`]: reads one request, runs the handler, closes the write side

mod http_connection;
mod request_reader;
mod response_writer;

pub use http_connection::ConnectionConfig;
pub use http_connection::DEFAULT_READ_BUFFER_SIZE;
pub use http_connection::HttpConnection;
pub use request_reader::RequestReader;
pub use response_writer::ResponseWriter;
