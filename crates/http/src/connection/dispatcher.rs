use futures::channel::mpsc;
use tracing::{trace, warn};

use crate::protocol::InputError;

/// A readiness event queued for the connection's dispatch loop.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The transport reported that a fill may now make progress.
    ReadPossible { generation: u64 },
    /// Waiting on the transport failed.
    ReadFailed { generation: u64, cause: InputError },
}

impl ConnectionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            ConnectionEvent::ReadPossible { generation } | ConnectionEvent::ReadFailed { generation, .. } => *generation,
        }
    }
}

/// The sending half of a connection's dispatch queue.
///
/// Cheap to clone, one clone travels inside every armed
/// [`ReadInterest`](crate::callback::ReadInterest).
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Dispatcher {
    pub fn dispatch(&self, event: ConnectionEvent) {
        trace!(?event, "dispatch connection event");
        if let Err(e) = self.sender.unbounded_send(event) {
            warn!(event = ?e.into_inner(), "connection dispatch loop is gone, event dropped");
        }
    }

    /// Stops the dispatch loop once queued events are delivered.
    pub fn close(&self) {
        self.sender.close_channel();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Creates a dispatch queue: the [`Dispatcher`] handed to inputs and the
/// receiver the connection drains.
pub fn dispatch_channel() -> (Dispatcher, mpsc::UnboundedReceiver<ConnectionEvent>) {
    let (sender, receiver) = mpsc::unbounded();
    (Dispatcher { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc::TryRecvError;
    use std::io;

    #[test]
    fn events_arrive_in_order() {
        let (dispatcher, mut events) = dispatch_channel();
        dispatcher.dispatch(ConnectionEvent::ReadPossible { generation: 1 });
        dispatcher.dispatch(ConnectionEvent::ReadFailed {
            generation: 2,
            cause: io::Error::from(io::ErrorKind::ConnectionReset).into(),
        });

        assert_eq!(events.try_recv().unwrap().generation(), 1);
        assert_eq!(events.try_recv().unwrap().generation(), 2);
    }

    #[test]
    fn dispatch_after_close_is_dropped() {
        let (dispatcher, mut events) = dispatch_channel();
        dispatcher.dispatch(ConnectionEvent::ReadPossible { generation: 1 });
        dispatcher.clone().close();
        assert!(dispatcher.is_closed());

        dispatcher.dispatch(ConnectionEvent::ReadPossible { generation: 2 });
        assert_eq!(events.try_recv().unwrap().generation(), 1);
        // closed and drained
        assert!(matches!(events.try_recv(), Err(TryRecvError::Closed)));
    }
}
