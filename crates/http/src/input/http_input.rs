//! The transport agnostic read engine.
//!
//! [`HttpInput`] owns the read state machine of one connection and drives a
//! [`ContentSource`] for new chunks. All state changes happen behind one lock.
//! Listener callbacks are made after the lock is released, from the
//! connection's dispatch loop.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::callback::{Callback, ReadInterest};
use crate::connection::{ConnectionEvent, Dispatcher};
use crate::ensure;
use crate::input::state::{InputState, ReadState, ReadStatus};
use crate::protocol::{Content, InputError};

/// What a source produced when asked for more content.
#[derive(Debug)]
pub enum NextContent<C> {
    /// A chunk with unread bytes.
    Content(C),
    /// Nothing can be produced without waiting for the transport.
    WouldBlock,
    /// The message body is complete.
    EndOfMessage,
}

/// Where an [`HttpInput`] gets its content from.
///
/// Implementations bind the engine to a transport and a parser; see
/// [`HttpInputOverHttp`](crate::input::HttpInputOverHttp).
pub trait ContentSource: Send + 'static {
    type Content: Content;

    /// Produces the next chunk without waiting.
    fn next_content(&mut self) -> Result<NextContent<Self::Content>, InputError>;

    /// Waits for the transport until a chunk or the end of the message is
    /// available. Never returns [`NextContent::WouldBlock`].
    fn block_for_content(&mut self) -> Result<NextContent<Self::Content>, InputError>;

    /// Registers `callback` to be completed once reading may progress.
    fn arm_interest(&mut self, callback: Arc<dyn Callback>);

    /// Reads and discards the rest of the message.
    ///
    /// Returns whether the message was read to its end, i.e. whether the
    /// connection can serve another request. Never fails: a failure while
    /// draining ends the drain as if the stream had ended.
    fn consume_all(&mut self) -> bool;

    /// Drops per request state before the next request.
    fn recycle(&mut self);
}

/// Receives readiness notifications of an async reader.
///
/// Called from the connection's dispatch loop, at most once per armed wait and
/// never from within [`HttpInput::set_read_listener`].
#[cfg_attr(test, mockall::automock)]
pub trait ReadListener: Send + Sync {
    /// Content can be read without blocking.
    fn on_data_available(&self);

    /// The body was read to its end.
    fn on_all_data_read(&self);

    /// Reading failed, the input will not deliver more content.
    fn on_error(&self, cause: &InputError);
}

enum Notification {
    DataAvailable,
    AllDataRead,
    Error(InputError),
}

struct Inner<S: ContentSource> {
    state: ReadState<S::Content>,
    source: S,
    listener: Option<Arc<dyn ReadListener>>,
    dispatcher: Dispatcher,
    generation: u64,
    pending: Option<u64>,
}

impl<S: ContentSource> Inner<S> {
    fn read(&mut self, dst: &mut [u8]) -> Result<ReadStatus, InputError> {
        loop {
            match &mut self.state {
                ReadState::HasContent(content) => {
                    let len = content.copy_to(dst);
                    content.consume(len);
                    if !content.has_remaining() {
                        self.state = ReadState::Idle;
                    }
                    return Ok(ReadStatus::Data(len));
                }
                ReadState::Idle => {
                    let next = self.source.next_content();
                    if let Some(status) = self.accept(next)? {
                        return Ok(status);
                    }
                }
                ReadState::AsyncArmed => return Ok(ReadStatus::WouldBlock),
                ReadState::Eof => return Ok(ReadStatus::Eof),
                ReadState::Failed(cause) => return Err(cause.clone()),
            }
        }
    }

    /// Moves to the state matching what the source produced. Returns a status
    /// only when the read has to stop without copying.
    fn accept(&mut self, next: Result<NextContent<S::Content>, InputError>) -> Result<Option<ReadStatus>, InputError> {
        match next {
            Ok(NextContent::Content(content)) => {
                if content.has_remaining() {
                    trace!(len = content.remaining(), "content available");
                    self.state = ReadState::HasContent(content);
                }
                Ok(None)
            }
            Ok(NextContent::WouldBlock) => Ok(Some(ReadStatus::WouldBlock)),
            Ok(NextContent::EndOfMessage) => {
                debug!("all content read");
                self.state = ReadState::Eof;
                Ok(None)
            }
            Err(e) => {
                debug!(cause = %e, "read failed");
                self.state = ReadState::Failed(e.clone());
                Err(e)
            }
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.pending = Some(self.generation);
        self.generation
    }

    /// Waits for transport readiness on behalf of the listener.
    fn arm(&mut self) {
        let generation = self.next_generation();
        trace!(generation, "arm read interest");
        self.state = ReadState::AsyncArmed;
        let interest = ReadInterest::new(self.dispatcher.clone(), generation);
        self.source.arm_interest(interest);
    }

    /// Tells the listener about the current state through the dispatch loop.
    fn schedule(&mut self) {
        let generation = self.next_generation();
        trace!(generation, state = ?self.state.kind(), "schedule listener notification");
        self.dispatcher.dispatch(ConnectionEvent::ReadPossible { generation });
    }

    /// Resolves a fired wait into what the listener must hear, if anything.
    fn resolve(&mut self) -> Option<Notification> {
        if let ReadState::AsyncArmed = self.state {
            self.state = ReadState::Idle;
            let next = self.source.next_content();
            match self.accept(next) {
                Ok(Some(_would_block)) => {
                    // readiness was spurious, wait again
                    self.arm();
                    return None;
                }
                Ok(None) => {}
                Err(e) => return Some(Notification::Error(e)),
            }
        }

        match &self.state {
            ReadState::HasContent(_) => Some(Notification::DataAvailable),
            ReadState::Eof => Some(Notification::AllDataRead),
            ReadState::Failed(cause) => Some(Notification::Error(cause.clone())),
            ReadState::Idle | ReadState::AsyncArmed => None,
        }
    }

    /// Accepts the event only if it answers the wait currently pending.
    fn take_pending(&mut self, generation: u64) -> bool {
        if self.pending == Some(generation) {
            self.pending = None;
            true
        } else {
            trace!(generation, pending = ?self.pending, "ignore stale readiness event");
            false
        }
    }
}

/// The request body reader of one connection.
///
/// Supports two ways of reading, one at a time:
///
/// - blocking: [`HttpInput::read_blocking`] (or `std::io::Read`) parks the
///   calling thread until content, end of body or an error is available
/// - async: after [`HttpInput::set_read_listener`], [`HttpInput::read`] never
///   waits; when it would, readiness interest is armed and the listener is told
///   once reading may progress
pub struct HttpInput<S: ContentSource> {
    inner: Mutex<Inner<S>>,
}

impl<S: ContentSource> HttpInput<S> {
    pub fn new(source: S, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ReadState::Idle,
                source,
                listener: None,
                dispatcher,
                generation: 0,
                pending: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies available content into `dst` without waiting.
    ///
    /// Returns [`ReadStatus::WouldBlock`] when nothing is available right now;
    /// with a listener set, readiness interest is then armed.
    pub fn read(&self, dst: &mut [u8]) -> Result<ReadStatus, InputError> {
        let mut inner = self.lock();
        let status = inner.read(dst)?;
        if status.is_would_block() && inner.listener.is_some() && inner.state.kind() == InputState::Idle {
            inner.arm();
        }
        Ok(status)
    }

    /// Copies content into `dst`, waiting for the transport when none is
    /// available. Returns 0 at the end of the body.
    pub fn read_blocking(&self, dst: &mut [u8]) -> Result<usize, InputError> {
        let mut inner = self.lock();
        loop {
            match inner.read(dst)? {
                ReadStatus::Data(len) => return Ok(len),
                ReadStatus::Eof => return Ok(0),
                ReadStatus::WouldBlock => {
                    ensure!(inner.listener.is_none(), InputError::invariant_violation("blocking read on an input with a read listener"));
                    trace!("block for content");
                    let next = inner.source.block_for_content();
                    inner.accept(next)?;
                }
            }
        }
    }

    /// Switches the input to async reading.
    ///
    /// The listener is first notified from the dispatch loop, once content,
    /// the end of the body or a failure is available.
    pub fn set_read_listener(&self, listener: Arc<dyn ReadListener>) -> Result<(), InputError> {
        let mut inner = self.lock();
        ensure!(inner.listener.is_none(), InputError::invariant_violation("read listener already set"));
        inner.listener = Some(listener);

        if inner.state.kind() == InputState::Idle {
            let next = inner.source.next_content();
            // a failure is reported through the listener
            if let Ok(Some(_would_block)) = inner.accept(next) {
                inner.arm();
                return Ok(());
            }
        }
        if inner.state.kind() != InputState::AsyncArmed {
            inner.schedule();
        }
        Ok(())
    }

    /// Whether a read would make progress without waiting.
    ///
    /// When it would not and a listener is set, readiness interest is armed.
    pub fn is_ready(&self) -> bool {
        let mut inner = self.lock();
        match inner.state.kind() {
            InputState::HasContent | InputState::Eof | InputState::Failed => true,
            InputState::AsyncArmed => false,
            InputState::Idle => {
                let next = inner.source.next_content();
                match inner.accept(next) {
                    Ok(Some(_would_block)) => {
                        if inner.listener.is_some() {
                            inner.arm();
                        }
                        false
                    }
                    _ => inner.state.kind() != InputState::Idle,
                }
            }
        }
    }

    /// Handles a readiness event queued by an armed [`ReadInterest`].
    pub fn on_read_possible(&self, generation: u64) {
        let (notification, listener) = {
            let mut inner = self.lock();
            if !inner.take_pending(generation) {
                return;
            }
            (inner.resolve(), inner.listener.clone())
        };
        notify(listener, notification);
    }

    /// Handles a failed readiness wait queued by an armed [`ReadInterest`].
    pub fn on_read_failed(&self, generation: u64, cause: InputError) {
        let (notification, listener) = {
            let mut inner = self.lock();
            if !inner.take_pending(generation) {
                debug!(generation, cause = %cause, "ignore stale read failure");
                return;
            }
            if !inner.state.is_terminal() {
                debug!(cause = %cause, "readiness wait failed");
                inner.state = ReadState::Failed(cause);
            }
            (inner.resolve(), inner.listener.clone())
        };
        notify(listener, notification);
    }

    /// Discards the rest of the body.
    ///
    /// Returns whether the message was read to its end, so the connection can
    /// be reused. Never fails, see [`ContentSource::consume_all`].
    pub fn consume_all(&self) -> bool {
        let mut inner = self.lock();
        // an armed interest is superseded by the drain's own wait, a late
        // event from it no longer matches any generation
        inner.pending = None;
        match inner.state.kind() {
            InputState::Failed => false,
            InputState::Eof => true,
            InputState::Idle | InputState::HasContent | InputState::AsyncArmed => {
                inner.state = ReadState::Eof;
                inner.source.consume_all()
            }
        }
    }

    /// Resets the input for the next request on the same connection.
    ///
    /// Held content and the listener are dropped; readiness events from before
    /// the reset are ignored.
    pub fn recycle(&self) {
        let mut inner = self.lock();
        trace!(state = ?inner.state.kind(), "recycle input");
        inner.state = ReadState::Idle;
        inner.listener = None;
        inner.pending = None;
        inner.source.recycle();
    }

    /// Number of bytes that can be read without touching the source.
    pub fn available(&self) -> usize {
        match &self.lock().state {
            ReadState::HasContent(content) => content.remaining(),
            _ => 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.lock().state, ReadState::Eof)
    }

    pub fn state(&self) -> InputState {
        self.lock().state.kind()
    }

    /// Runs `f` on the source while holding the input's lock.
    pub fn with_source<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock().source)
    }
}

fn notify(listener: Option<Arc<dyn ReadListener>>, notification: Option<Notification>) {
    let (Some(listener), Some(notification)) = (listener, notification) else {
        return;
    };
    match notification {
        Notification::DataAvailable => listener.on_data_available(),
        Notification::AllDataRead => listener.on_all_data_read(),
        Notification::Error(cause) => listener.on_error(&cause),
    }
}

impl<S: ContentSource> io::Read for &HttpInput<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_blocking(buf).map_err(io::Error::from)
    }
}

impl<S: ContentSource> fmt::Debug for HttpInput<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("HttpInput")
            .field("state", &inner.state.kind())
            .field("listener", &inner.listener.is_some())
            .field("pending", &inner.pending)
            .finish()
    }
}
