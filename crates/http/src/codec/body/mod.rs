//! Request body decoders.
//!
//! - `LengthDecoder`: bodies framed by Content-Length
//! - `ChunkedDecoder`: chunked transfer encoding
//! - [`PayloadDecoder`]: selects one of the above, or no body at all
//!
//! Each decoder yields at most one [`PayloadItem`](crate::protocol::PayloadItem)
//! per call and returns `Ok(None)` when it needs more bytes.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::PayloadDecoder;
