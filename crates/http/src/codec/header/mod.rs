//! Request head decoding.
//!
//! [`HeaderDecoder`] parses the request line and header fields and reports how
//! the body that follows is framed.

mod header_decoder;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
