//! An in-memory endpoint for driving inputs in tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::callback::Callback;
use crate::endpoint::{EndPoint, Fill};

#[derive(Default)]
struct Script {
    pending: VecDeque<Bytes>,
    shutdown: bool,
    shutdown_seen: bool,
    fill_error: Option<io::Error>,
    interest_error: Option<io::Error>,
    interest: Option<Arc<dyn Callback>>,
    registrations: usize,
}

/// How long a stored interest waits by default before it fails with a timeout.
const INTEREST_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Shared {
    script: Mutex<Script>,
    interested: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }
}

/// Replays pushed chunks, one chunk per fill.
///
/// Fill interest is completed as soon as a chunk or the shutdown is pending,
/// otherwise it is stored until [`ScriptedEndPoint::deliver`] or
/// [`ScriptedEndPoint::deliver_shutdown`]. A stored interest nobody completes
/// fails with a timeout after a deadline, like an idle connection.
pub(crate) struct ScriptedEndPoint {
    shared: Arc<Shared>,
    deadline: Duration,
}

impl ScriptedEndPoint {
    pub(crate) fn new() -> Self {
        Self::with_interest_deadline(INTEREST_DEADLINE)
    }

    pub(crate) fn with_interest_deadline(deadline: Duration) -> Self {
        Self { shared: Arc::default(), deadline }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.shared.lock()
    }

    pub(crate) fn push(&self, chunk: impl Into<Bytes>) {
        self.lock().pending.push_back(chunk.into());
    }

    /// Pushes a chunk and wakes a stored interest.
    pub(crate) fn deliver(&self, chunk: impl Into<Bytes>) {
        let interest = {
            let mut script = self.lock();
            script.pending.push_back(chunk.into());
            script.interest.take()
        };
        if let Some(interest) = interest {
            interest.succeeded();
        }
    }

    /// The peer shuts down its output once the pending chunks are read.
    pub(crate) fn shutdown(&self) {
        self.lock().shutdown = true;
    }

    pub(crate) fn deliver_shutdown(&self) {
        let interest = {
            let mut script = self.lock();
            script.shutdown = true;
            script.interest.take()
        };
        if let Some(interest) = interest {
            interest.succeeded();
        }
    }

    /// The next fill fails with `error`.
    pub(crate) fn fail_fill(&self, error: io::Error) {
        self.lock().fill_error = Some(error);
    }

    /// Fails the stored interest, or the next one registered.
    pub(crate) fn fail_interest(&self, error: io::Error) {
        let interest = {
            let mut script = self.lock();
            match script.interest.take() {
                Some(interest) => Some(interest),
                None => {
                    script.interest_error = Some(error);
                    return;
                }
            }
        };
        if let Some(interest) = interest {
            interest.failed(error.into());
        }
    }

    /// Waits until an interest is stored.
    pub(crate) fn wait_for_interest(&self) {
        let script = self.lock();
        let (_script, wait) = self
            .shared
            .interested
            .wait_timeout_while(script, self.deadline, |script| script.interest.is_none())
            .unwrap();
        assert!(!wait.timed_out(), "no interest registered");
    }

    pub(crate) fn registrations(&self) -> usize {
        self.lock().registrations
    }
}

impl EndPoint for ScriptedEndPoint {
    fn fill(&self, buf: &mut BytesMut) -> io::Result<Fill> {
        let mut script = self.lock();
        if let Some(error) = script.fill_error.take() {
            return Err(error);
        }
        match script.pending.pop_front() {
            Some(chunk) => {
                buf.extend_from_slice(&chunk);
                Ok(Fill::Filled(chunk.len()))
            }
            None if script.shutdown => {
                script.shutdown_seen = true;
                Ok(Fill::Shutdown)
            }
            None => Ok(Fill::Empty),
        }
    }

    fn is_input_shutdown(&self) -> bool {
        self.lock().shutdown_seen
    }

    fn fill_interested(&self, callback: Arc<dyn Callback>) {
        let mut script = self.lock();
        script.registrations += 1;

        if let Some(error) = script.interest_error.take() {
            drop(script);
            callback.failed(error.into());
        } else if !script.pending.is_empty() || script.shutdown {
            drop(script);
            callback.succeeded();
        } else {
            let registration = script.registrations;
            script.interest = Some(callback);
            self.shared.interested.notify_all();
            drop(script);

            let shared = Arc::clone(&self.shared);
            let deadline = self.deadline;
            thread::spawn(move || {
                thread::sleep(deadline);
                let interest = {
                    let mut script = shared.lock();
                    if script.registrations != registration {
                        return;
                    }
                    script.interest.take()
                };
                if let Some(interest) = interest {
                    interest.failed(io::Error::new(io::ErrorKind::TimedOut, "interest never completed").into());
                }
            });
        }
    }
}
