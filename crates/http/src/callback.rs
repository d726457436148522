//! Single-shot completions fired by an endpoint when reading may progress.
//!
//! Both flavors honour the same contract: an endpoint completes a callback
//! exactly once, with success or with the failure that ended the wait.
//!
//! - [`BlockingCallback`] parks the calling thread in [`BlockingCallback::block`]
//!   until it is completed, and turns a failure into an error.
//! - [`ReadInterest`] does no work itself: it queues an event on the owning
//!   connection's dispatch loop, so listener code runs there and never inside
//!   the endpoint's completion context.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::channel::oneshot;
use tracing::{trace, warn};

use crate::connection::{ConnectionEvent, Dispatcher};
use crate::protocol::InputError;

/// A completion handed to [`EndPoint::fill_interested`](crate::endpoint::EndPoint::fill_interested).
pub trait Callback: Send + Sync {
    /// A subsequent fill is likely to make progress.
    fn succeeded(&self);

    /// Waiting failed, e.g. the endpoint was closed or timed out.
    fn failed(&self, cause: InputError);
}

type Completion = Result<(), InputError>;

/// Blocks a thread until an endpoint reports readiness.
///
/// Backed by a `oneshot` channel awaited with `futures::executor::block_on`.
/// Never call [`BlockingCallback::block`] from an async runtime worker: the
/// endpoint completes the callback from its own tasks, which would be starved.
pub struct BlockingCallback {
    sender: Mutex<Option<oneshot::Sender<Completion>>>,
    receiver: Mutex<Option<oneshot::Receiver<Completion>>>,
}

impl BlockingCallback {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = oneshot::channel();
        Arc::new(Self { sender: Mutex::new(Some(sender)), receiver: Mutex::new(Some(receiver)) })
    }

    /// Parks the calling thread until the callback is completed.
    ///
    /// Returns the failure the endpoint reported, if any. A callback can be
    /// waited on only once.
    pub fn block(&self) -> Result<(), InputError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| InputError::invariant_violation("blocking callback waited on twice"))?;

        trace!("blocking until readable");
        match futures::executor::block_on(receiver) {
            Ok(completion) => completion,
            Err(oneshot::Canceled) => {
                Err(InputError::transport(io::Error::new(io::ErrorKind::BrokenPipe, "blocking callback dropped before completion")))
            }
        }
    }

    fn complete(&self, completion: Completion) {
        match self.sender.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(sender) => {
                // the waiter may already be gone, nothing left to wake
                let _ = sender.send(completion);
            }
            None => warn!("blocking callback completed more than once"),
        }
    }
}

impl Callback for BlockingCallback {
    fn succeeded(&self) {
        self.complete(Ok(()));
    }

    fn failed(&self, cause: InputError) {
        self.complete(Err(cause));
    }
}

impl fmt::Debug for BlockingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let completed = self.sender.lock().unwrap_or_else(PoisonError::into_inner).is_none();
        f.debug_struct("BlockingCallback").field("completed", &completed).finish()
    }
}

/// The readiness token of an async reader.
///
/// Carries the arming generation of the input it belongs to so the input can
/// tell a stale wakeup from the one it is waiting for.
#[derive(Debug)]
pub struct ReadInterest {
    dispatcher: Dispatcher,
    generation: u64,
    fired: AtomicBool,
}

impl ReadInterest {
    pub fn new(dispatcher: Dispatcher, generation: u64) -> Arc<Self> {
        Arc::new(Self { dispatcher, generation, fired: AtomicBool::new(false) })
    }

    fn fire(&self, event: ConnectionEvent) {
        if self.fired.swap(true, Ordering::AcqRel) {
            warn!(generation = self.generation, "read interest completed more than once");
            return;
        }
        self.dispatcher.dispatch(event);
    }
}

impl Callback for ReadInterest {
    fn succeeded(&self) {
        self.fire(ConnectionEvent::ReadPossible { generation: self.generation });
    }

    fn failed(&self, cause: InputError) {
        self.fire(ConnectionEvent::ReadFailed { generation: self.generation, cause });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::dispatch_channel;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn block_until_succeeded() {
        let callback = BlockingCallback::new();
        let completer = Arc::clone(&callback);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.succeeded();
        });

        callback.block().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn failure_is_raised_on_unblock() {
        let callback = BlockingCallback::new();
        callback.failed(InputError::transport(io::Error::new(io::ErrorKind::TimedOut, "idle timeout")));

        let error = callback.block().unwrap_err();
        assert!(error.is_timeout());
    }

    #[test]
    fn only_first_completion_counts() {
        let callback = BlockingCallback::new();
        callback.succeeded();
        callback.failed(InputError::invariant_violation("late"));
        assert!(callback.block().is_ok());
    }

    #[test]
    fn waiting_twice_is_a_violation() {
        let callback = BlockingCallback::new();
        callback.succeeded();
        callback.block().unwrap();
        assert!(callback.block().unwrap_err().is_invariant_violation());
    }

    #[test]
    fn read_interest_queues_one_event() {
        let (dispatcher, mut events) = dispatch_channel();
        let interest = ReadInterest::new(dispatcher, 7);

        interest.succeeded();
        interest.failed(InputError::invariant_violation("late"));

        assert!(matches!(events.try_recv(), Ok(ConnectionEvent::ReadPossible { generation: 7 })));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn read_interest_forwards_failure() {
        let (dispatcher, mut events) = dispatch_channel();
        ReadInterest::new(dispatcher, 3).failed(InputError::transport(io::Error::from(io::ErrorKind::ConnectionReset)));

        match events.try_recv() {
            Ok(ConnectionEvent::ReadFailed { generation, cause }) => {
                assert_eq!(generation, 3);
                assert!(cause.is_transport());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
