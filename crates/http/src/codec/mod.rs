//! Incremental request parsing.
//!
//! The parser consumes the connection's receive buffer a step at a time and
//! hands body chunks to whatever [`ContentSink`] the input supplies.
//!
//! - Request heads: [`header`] (`httparse` based)
//! - Body framing: Content-Length and chunked decoders in `body`
//! - [`RequestParser`]: the [`ContentParser`] combining both
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use micro_http_input::codec::{ContentParser, ContentSink, RequestParser};
//! use micro_http_input::protocol::InputError;
//!
//! struct Print;
//!
//! impl ContentSink<Bytes> for Print {
//!     fn content(&mut self, item: Bytes) -> Result<(), InputError> {
//!         println!("{} body bytes", item.len());
//!         Ok(())
//!     }
//! }
//!
//! let mut parser = RequestParser::new();
//! let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi"[..]);
//! parser.parse_next(&mut buf, &mut Print).unwrap();
//! assert!(parser.take_header().is_some());
//! ```

mod body;
pub mod header;
mod request_parser;

pub use request_parser::{ContentParser, ContentSink, RequestParser};
