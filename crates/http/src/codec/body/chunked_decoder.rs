//! Decoder for chunked transfer encoding,
//! see [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112.html#section-7.1).
//!
//! Chunk size lines are parsed with `httparse::parse_chunk_size`; chunk data is
//! handed out as soon as any of it is buffered, so a large chunk may surface as
//! several [`PayloadItem::Chunk`]s. Trailer fields are skipped.

use std::cmp;

use bytes::{Buf, BytesMut};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::MAX_HEADER_BYTES;
use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};

/// Longest chunk size line accepted, extensions included.
const MAX_CHUNK_LINE_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Reading a chunk size line
    Size,
    /// Reading chunk data, with the bytes still owed
    Data(u64),
    /// Reading the CRLF after chunk data
    DataCrlf,
    /// Skipping trailer fields until the empty line
    Trailer,
    /// The last chunk and its trailer section were read
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ChunkedState::Size => match httparse::parse_chunk_size(&src[..]) {
                    Ok(Status::Complete((consumed, size))) => {
                        src.advance(consumed);
                        trace!(size, "read chunk size");
                        self.state = if size == 0 { ChunkedState::Trailer } else { ChunkedState::Data(size) };
                    }
                    Ok(Status::Partial) => {
                        ensure!(src.len() <= MAX_CHUNK_LINE_BYTES, ParseError::invalid_body("chunk size line too long"));
                        return Ok(None);
                    }
                    Err(_) => return Err(ParseError::invalid_body("invalid chunk size")),
                },

                ChunkedState::Data(owed) => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = cmp::min(owed, src.len() as u64);
                    let bytes = src.split_to(len as usize).freeze();
                    let owed = owed - len;
                    self.state = if owed == 0 { ChunkedState::DataCrlf } else { ChunkedState::Data(owed) };
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                ChunkedState::DataCrlf => {
                    if src.len() < 2 {
                        if src.first().is_some_and(|b| *b != b'\r') {
                            return Err(ParseError::invalid_body("missing CRLF after chunk data"));
                        }
                        return Ok(None);
                    }
                    ensure!(&src[..2] == b"\r\n", ParseError::invalid_body("missing CRLF after chunk data"));
                    src.advance(2);
                    self.state = ChunkedState::Size;
                }

                ChunkedState::Trailer => match src.windows(2).position(|w| w == b"\r\n") {
                    Some(0) => {
                        src.advance(2);
                        self.state = ChunkedState::End;
                    }
                    Some(line_end) => {
                        trace!(len = line_end, "skip trailer field");
                        src.advance(line_end + 2);
                    }
                    None => {
                        ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                        return Ok(None);
                    }
                },

                ChunkedState::End => return Ok(Some(PayloadItem::Eof)),
            }
        }
    }
}
