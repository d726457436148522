//! The incremental parser that feeds body content to an input.
//!
//! A [`ContentParser`] is driven with whatever bytes the connection has
//! buffered. Each call may or may not hand one content chunk to a
//! [`ContentSink`]; the caller then decides whether to read more bytes, wait,
//! or return what it got.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Content, InputError, ParseError, PayloadItem, RequestHeader};

/// Receives content chunks from a parser.
pub trait ContentSink<C> {
    /// Takes one chunk. Fails with [`InputError::InvariantViolation`] when the
    /// previous chunk has not been consumed yet.
    fn content(&mut self, item: C) -> Result<(), InputError>;
}

/// A byte stream parser producing body content.
///
/// Contract with the caller:
/// - `parse_next` consumes as much of `buf` as it can and hands at most one
///   chunk to `sink`. Returning without a chunk and without completing means it
///   needs more bytes.
/// - After [`ContentParser::at_eof`], a `parse_next` that cannot make progress
///   either completes the message or fails, it never asks for more bytes again.
pub trait ContentParser: Send + 'static {
    type Content: Content;

    fn parse_next(&mut self, buf: &mut BytesMut, sink: &mut dyn ContentSink<Self::Content>) -> Result<(), InputError>;

    /// Whether the current message has been parsed to its end.
    fn is_complete(&self) -> bool;

    /// Tells the parser no more bytes will arrive.
    fn at_eof(&mut self);

    /// Prepares for the next message on the same connection.
    fn reset(&mut self);
}

#[derive(Debug)]
enum ParserState {
    Head,
    Body(PayloadDecoder),
    Complete,
}

/// Parses HTTP/1.x requests: the head first, then the body chunk by chunk.
///
/// The parsed head is kept until the connection takes it with
/// [`RequestParser::take_header`].
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    header: Option<RequestHeader>,
    eof: bool,
}

impl RequestParser {
    pub fn new() -> Self {
        Self { state: ParserState::Head, header: None, eof: false }
    }

    pub fn take_header(&mut self) -> Option<RequestHeader> {
        self.header.take()
    }

    /// Whether the head of the current request has been parsed.
    pub fn is_head_complete(&self) -> bool {
        !matches!(self.state, ParserState::Head)
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for RequestParser {
    type Content = bytes::Bytes;

    fn parse_next(&mut self, buf: &mut BytesMut, sink: &mut dyn ContentSink<Self::Content>) -> Result<(), InputError> {
        loop {
            match &mut self.state {
                ParserState::Head => match HeaderDecoder.decode(buf)? {
                    Some((header, payload_size)) => {
                        debug!(method = %header.method(), uri = %header.uri(), ?payload_size, "parsed request head");
                        self.header = Some(header);
                        self.state = if payload_size.is_empty() {
                            ParserState::Complete
                        } else {
                            ParserState::Body(payload_size.into())
                        };
                        // a body that arrived with the head is parsed in the same call
                    }
                    None if self.eof => {
                        return Err(ParseError::incomplete_message("end of stream before the request head was complete").into());
                    }
                    None => return Ok(()),
                },

                ParserState::Body(payload_decoder) => {
                    return match payload_decoder.decode(buf)? {
                        Some(PayloadItem::Chunk(bytes)) => {
                            trace!(len = bytes.len(), "parsed content");
                            sink.content(bytes)
                        }
                        Some(PayloadItem::Eof) => {
                            trace!("request body complete");
                            self.state = ParserState::Complete;
                            Ok(())
                        }
                        None if self.eof => Err(ParseError::incomplete_message("end of stream before the request body was complete").into()),
                        None => Ok(()),
                    };
                }

                ParserState::Complete => return Ok(()),
            }
        }
    }

    fn is_complete(&self) -> bool {
        matches!(self.state, ParserState::Complete)
    }

    fn at_eof(&mut self) {
        trace!(complete = self.is_complete(), "parser reached end of stream");
        self.eof = true;
    }

    fn reset(&mut self) {
        self.state = ParserState::Head;
        self.header = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use indoc::indoc;

    #[derive(Default)]
    struct Collect(Vec<Bytes>);

    impl ContentSink<Bytes> for Collect {
        fn content(&mut self, item: Bytes) -> Result<(), InputError> {
            self.0.push(item);
            Ok(())
        }
    }

    #[test]
    fn head_and_first_chunk_in_one_call() {
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhel"[..]);
        let mut parser = RequestParser::new();
        let mut sink = Collect::default();

        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_head_complete());
        assert_eq!(parser.take_header().unwrap().uri().path(), "/");
        assert_eq!(sink.0, vec![Bytes::from_static(b"hel")]);
        assert!(!parser.is_complete());

        // needs more bytes, hands out nothing
        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);

        buf.extend_from_slice(b"lo");
        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert_eq!(sink.0[1], "lo");

        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_complete());
    }

    #[test]
    fn bodiless_request_completes_with_head() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        Accept: */*

        "##};
        let mut buf = BytesMut::from(str);
        let mut parser = RequestParser::new();
        let mut sink = Collect::default();

        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_complete());
        assert!(sink.0.is_empty());
        assert_eq!(parser.take_header().unwrap().uri().path(), "/index.html");
    }

    #[test]
    fn eof_inside_body_is_incomplete() {
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc"[..]);
        let mut parser = RequestParser::new();
        let mut sink = Collect::default();

        parser.parse_next(&mut buf, &mut sink).unwrap();
        parser.at_eof();
        let error = parser.parse_next(&mut buf, &mut sink).unwrap_err();
        assert!(error.is_incomplete_message());
    }

    #[test]
    fn eof_inside_head_is_incomplete() {
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nHost"[..]);
        let mut parser = RequestParser::new();
        parser.at_eof();
        let error = parser.parse_next(&mut buf, &mut Collect::default()).unwrap_err();
        assert!(error.is_incomplete_message());
    }

    #[test]
    fn eof_after_buffered_remainder_still_completes() {
        let mut buf = BytesMut::from(&b"PUT / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n"[..]);
        let mut parser = RequestParser::new();
        let mut sink = Collect::default();
        parser.at_eof();

        parser.parse_next(&mut buf, &mut sink).unwrap();
        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_complete());
        assert_eq!(sink.0, vec![Bytes::from_static(b"abc")]);
    }

    #[test]
    fn malformed_body_is_a_protocol_error() {
        let mut buf = BytesMut::from(&b"PUT / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n"[..]);
        let mut parser = RequestParser::new();
        let error = parser.parse_next(&mut buf, &mut Collect::default()).unwrap_err();
        assert!(error.is_protocol());
        assert!(!error.is_incomplete_message());
    }

    #[test]
    fn reset_between_pipelined_requests() {
        let mut buf = BytesMut::from(&b"POST /a HTTP/1.1\r\nContent-Length: 1\r\n\r\naGET /b HTTP/1.1\r\n\r\n"[..]);
        let mut parser = RequestParser::new();
        let mut sink = Collect::default();

        parser.parse_next(&mut buf, &mut sink).unwrap();
        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_complete());
        assert_eq!(parser.take_header().unwrap().uri().path(), "/a");

        parser.reset();
        assert!(!parser.is_complete());
        parser.parse_next(&mut buf, &mut sink).unwrap();
        assert!(parser.is_complete());
        assert_eq!(parser.take_header().unwrap().uri().path(), "/b");
        assert!(buf.is_empty());
    }
}
