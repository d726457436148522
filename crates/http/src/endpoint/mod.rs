//! The transport seam.
//!
//! An [`EndPoint`] offers three primitives to the input: a non-blocking
//! [`EndPoint::fill`], an input shutdown query, and
//! [`EndPoint::fill_interested`] which completes a [`Callback`] once when the
//! next fill is likely to make progress or fail for good.
//!
//! Idle timeouts belong here: a readiness wait that never ends is failed by the
//! endpoint with a timeout error, which the waiting reader surfaces.

mod tcp;

pub use tcp::TcpEndPoint;

use std::io;
use std::sync::Arc;

use bytes::BytesMut;

use crate::callback::Callback;

/// Outcome of a non-blocking fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Bytes were appended to the buffer
    Filled(usize),
    /// No bytes are available right now
    Empty,
    /// The peer shut down its output, no more bytes will come
    Shutdown,
}

pub trait EndPoint: Send + Sync + 'static {
    /// Appends whatever bytes are available into the spare capacity of `buf`
    /// without waiting.
    fn fill(&self, buf: &mut BytesMut) -> io::Result<Fill>;

    /// Whether a fill has observed the end of the input.
    fn is_input_shutdown(&self) -> bool;

    /// Completes `callback` exactly once, asynchronously, when a subsequent
    /// fill is likely to succeed or fail definitively.
    ///
    /// At most one wait is outstanding: registering again supersedes the
    /// previous callback, which is dropped without completing.
    fn fill_interested(&self, callback: Arc<dyn Callback>);
}
