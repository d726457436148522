//! Binds the read engine to an [`EndPoint`] and a [`ContentParser`].

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, info, trace};

use crate::callback::{BlockingCallback, Callback};
use crate::codec::{ContentParser, ContentSink, RequestParser};
use crate::config::InputConfig;
use crate::endpoint::{EndPoint, Fill};
use crate::ensure;
use crate::input::http_input::{ContentSource, NextContent};
use crate::protocol::{Content, InputError, RequestHeader};

/// Holds the one chunk the parser injected and the input has not taken yet.
#[derive(Debug)]
struct ContentSlot<C>(Option<C>);

impl<C: Content> ContentSlot<C> {
    /// Takes the held chunk if it still has bytes.
    fn take_remaining(&mut self) -> Option<C> {
        self.0.take().filter(Content::has_remaining)
    }
}

impl<C: Content> ContentSink<C> for ContentSlot<C> {
    fn content(&mut self, item: C) -> Result<(), InputError> {
        ensure!(
            !self.0.as_ref().is_some_and(Content::has_remaining),
            InputError::invariant_violation("content injected while the previous content is unconsumed")
        );
        self.0 = Some(item);
        Ok(())
    }
}

/// A [`ContentSource`] reading HTTP/1.x bodies off an [`EndPoint`].
///
/// Owns the connection's receive buffer: the endpoint fills it and the parser
/// consumes it, content chunks are handed on without further copying.
pub struct HttpInputOverHttp<E, P: ContentParser> {
    endpoint: Arc<E>,
    parser: P,
    request_buffer: BytesMut,
    content: ContentSlot<P::Content>,
    buffer_capacity: usize,
}

impl<E: EndPoint, P: ContentParser> HttpInputOverHttp<E, P> {
    pub fn new(endpoint: Arc<E>, parser: P, config: &InputConfig) -> Self {
        let buffer_capacity = config.request_buffer_capacity();
        Self {
            endpoint,
            parser,
            request_buffer: BytesMut::with_capacity(buffer_capacity),
            content: ContentSlot(None),
            buffer_capacity,
        }
    }

    /// Hands a chunk to the input, as the parser does while parsing.
    ///
    /// Fails with [`InputError::InvariantViolation`] while a previously injected
    /// chunk still has unread bytes.
    pub fn inject_content(&mut self, item: P::Content) -> Result<(), InputError> {
        self.content.content(item)
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Bytes received but not yet parsed.
    pub fn buffered(&self) -> usize {
        self.request_buffer.len()
    }

    fn fill(&mut self) -> Result<Fill, InputError> {
        self.request_buffer.reserve(self.buffer_capacity);
        let fill = self.endpoint.fill(&mut self.request_buffer)?;
        trace!(?fill, "filled request buffer");
        Ok(fill)
    }

    fn wait_readable(&self) -> Result<(), InputError> {
        let blocker = BlockingCallback::new();
        self.endpoint.fill_interested(Arc::clone(&blocker) as Arc<dyn Callback>);
        debug!("block readable");
        blocker.block()
    }

    fn drain(&mut self, skipped: &mut usize) -> Result<(), InputError> {
        if let Some(content) = self.content.0.take() {
            *skipped += content.remaining();
        }

        while !self.parser.is_complete() {
            self.parser.parse_next(&mut self.request_buffer, &mut self.content)?;
            if let Some(content) = self.content.0.take() {
                *skipped += content.remaining();
                continue;
            }
            if self.parser.is_complete() {
                break;
            }

            if self.request_buffer.is_empty() && self.endpoint.is_input_shutdown() {
                self.parser.at_eof();
                continue;
            }
            match self.fill()? {
                Fill::Filled(_) => {}
                Fill::Shutdown => self.parser.at_eof(),
                Fill::Empty => self.wait_readable()?,
            }
        }
        Ok(())
    }
}

impl<E: EndPoint, P: ContentParser> ContentSource for HttpInputOverHttp<E, P> {
    type Content = P::Content;

    fn next_content(&mut self) -> Result<NextContent<P::Content>, InputError> {
        if let Some(content) = self.content.take_remaining() {
            return Ok(NextContent::Content(content));
        }

        while !self.parser.is_complete() {
            // the parser may progress even without new bytes
            self.parser.parse_next(&mut self.request_buffer, &mut self.content)?;
            if let Some(content) = self.content.take_remaining() {
                return Ok(NextContent::Content(content));
            }
            if self.parser.is_complete() {
                break;
            }

            if self.request_buffer.is_empty() && self.endpoint.is_input_shutdown() {
                self.parser.at_eof();
                continue;
            }

            match self.fill()? {
                Fill::Filled(_) => {}
                Fill::Empty => return Ok(NextContent::WouldBlock),
                Fill::Shutdown => self.parser.at_eof(),
            }
        }

        Ok(NextContent::EndOfMessage)
    }

    fn block_for_content(&mut self) -> Result<NextContent<P::Content>, InputError> {
        loop {
            self.wait_readable()?;
            match self.next_content()? {
                NextContent::WouldBlock => continue,
                next => return Ok(next),
            }
        }
    }

    fn arm_interest(&mut self, callback: Arc<dyn Callback>) {
        self.endpoint.fill_interested(callback);
    }

    fn consume_all(&mut self) -> bool {
        let mut skipped = 0;
        match self.drain(&mut skipped) {
            Ok(()) => {
                if skipped > 0 {
                    info!(size = skipped, "skip request body");
                }
            }
            Err(e) => {
                // the body is abandoned, a failure only ends the drain
                debug!(cause = %e, skipped, "failed to skip request body, treat as end of stream");
                self.parser.at_eof();
            }
        }
        self.parser.is_complete()
    }

    fn recycle(&mut self) {
        self.content.0 = None;
    }
}

impl<E: EndPoint> HttpInputOverHttp<E, RequestParser> {
    /// Reads the head of the next request, waiting for the transport as needed.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly between
    /// requests. Body bytes that arrive with the head stay buffered for the
    /// input.
    pub fn read_request_header(&mut self) -> Result<Option<RequestHeader>, InputError> {
        ensure!(!self.parser.is_head_complete(), InputError::invariant_violation("request head already read"));

        loop {
            if self.request_buffer.is_empty() && (self.parser.is_eof() || self.endpoint.is_input_shutdown()) {
                debug!("connection closed between requests");
                return Ok(None);
            }

            self.parser.parse_next(&mut self.request_buffer, &mut self.content)?;
            if let Some(header) = self.parser.take_header() {
                return Ok(Some(header));
            }

            match self.fill()? {
                Fill::Filled(_) => {}
                Fill::Shutdown if self.request_buffer.is_empty() => {
                    debug!("connection closed between requests");
                    return Ok(None);
                }
                Fill::Shutdown => self.parser.at_eof(),
                Fill::Empty => self.wait_readable()?,
            }
        }
    }

    /// Prepares the parser for the next request on the connection.
    pub fn reset_parser(&mut self) {
        self.parser.reset();
    }
}

impl<E, P: ContentParser> fmt::Debug for HttpInputOverHttp<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpInputOverHttp")
            .field("buffered", &self.request_buffer.len())
            .field("complete", &self.parser.is_complete())
            .field("has_content", &self.content.0.as_ref().is_some_and(Content::has_remaining))
            .finish()
    }
}
