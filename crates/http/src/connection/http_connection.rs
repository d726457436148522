use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use futures::lock::Mutex;
use tracing::{debug, info, trace};

use crate::codec::RequestParser;
use crate::config::InputConfig;
use crate::connection::{ConnectionEvent, Dispatcher, dispatch_channel};
use crate::endpoint::EndPoint;
use crate::input::{HttpInput, HttpInputOverHttp};
use crate::protocol::{InputError, RequestHeader};

type Input<E> = HttpInput<HttpInputOverHttp<E, RequestParser>>;

/// One HTTP/1.x connection as seen by the request body reader.
///
/// `HttpConnection` handles the request side of a persistent connection:
/// - reading the head of each request
/// - exposing the body through [`HttpConnection::input`]
/// - draining unread body bytes and recycling the input between requests
/// - delivering readiness events to an async reader's listener
///
/// Blocking operations park the calling thread; run them off the async
/// runtime, e.g. with `tokio::task::spawn_blocking`.
pub struct HttpConnection<E: EndPoint> {
    endpoint: Arc<E>,
    input: Input<E>,
    dispatcher: Dispatcher,
    events: Mutex<UnboundedReceiver<ConnectionEvent>>,
}

impl<E: EndPoint> HttpConnection<E> {
    pub fn new(endpoint: Arc<E>, config: &InputConfig) -> Self {
        let (dispatcher, events) = dispatch_channel();
        let source = HttpInputOverHttp::new(Arc::clone(&endpoint), RequestParser::new(), config);
        Self { endpoint, input: HttpInput::new(source, dispatcher.clone()), dispatcher, events: Mutex::new(events) }
    }

    pub fn endpoint(&self) -> &Arc<E> {
        &self.endpoint
    }

    /// The body reader of the current request.
    pub fn input(&self) -> &Input<E> {
        &self.input
    }

    /// Reads the head of the next request, blocking until it is complete.
    ///
    /// Returns `Ok(None)` when the peer closed the connection between requests.
    pub fn read_request_header(&self) -> Result<Option<RequestHeader>, InputError> {
        let header = self.input.with_source(HttpInputOverHttp::read_request_header)?;
        if let Some(header) = &header {
            info!(method = %header.method(), uri = %header.uri(), "receive request");
        }
        Ok(header)
    }

    /// Finishes the current request: skips the unread body, then readies the
    /// input and the parser for the next request.
    ///
    /// Returns whether the connection can serve another request. A body that
    /// could not be read to its end leaves the connection unusable.
    pub fn complete_request(&self) -> bool {
        let reusable = self.input.consume_all();
        self.input.recycle();
        self.input.with_source(HttpInputOverHttp::reset_parser);
        debug!(reusable, "request completed");
        reusable
    }

    /// Delivers readiness events to the input until the connection is closed.
    ///
    /// Listener callbacks run on the task driving this future.
    pub async fn dispatch(&self) {
        let mut events = self.events.lock().await;
        while let Some(event) = events.next().await {
            self.handle(event);
        }
        debug!("dispatch loop finished");
    }

    /// Delivers the events queued so far without waiting for more, returning
    /// how many were handled. Handles nothing while [`HttpConnection::dispatch`]
    /// is running.
    pub fn dispatch_pending(&self) -> usize {
        let Some(mut events) = self.events.try_lock() else {
            return 0;
        };
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Ends the dispatch loop once the queued events are delivered.
    pub fn close(&self) {
        if self.dispatcher.is_closed() {
            return;
        }
        debug!("close connection dispatch");
        self.dispatcher.close();
    }

    fn handle(&self, event: ConnectionEvent) {
        trace!(?event, "handle connection event");
        match event {
            ConnectionEvent::ReadPossible { generation } => self.input.on_read_possible(generation),
            ConnectionEvent::ReadFailed { generation, cause } => self.input.on_read_failed(generation, cause),
        }
    }
}

impl<E: EndPoint> fmt::Debug for HttpConnection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection").field("input", &self.input).finish_non_exhaustive()
    }
}
