use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::callback::Callback;
use crate::config::InputConfig;
use crate::endpoint::{EndPoint, Fill};

/// An [`EndPoint`] over a tokio `TcpStream`.
///
/// Fills use `try_read_buf`, so they never wait. Fill interest spawns a task on
/// the given runtime that waits for the socket to become readable, bounded by
/// the configured idle timeout. [`TcpEndPoint::close`] fails any pending wait.
/// A new registration supersedes the outstanding one, whose callback is then
/// dropped without completing.
#[derive(Debug)]
pub struct TcpEndPoint {
    stream: Arc<TcpStream>,
    handle: Handle,
    input_shutdown: AtomicBool,
    closed: CancellationToken,
    wait: Mutex<Option<CancellationToken>>,
    idle_timeout: Option<Duration>,
}

impl TcpEndPoint {
    pub fn new(stream: TcpStream, handle: Handle, config: &InputConfig) -> Self {
        Self {
            stream: Arc::new(stream),
            handle,
            input_shutdown: AtomicBool::new(false),
            closed: CancellationToken::new(),
            wait: Mutex::new(None),
            idle_timeout: config.idle_timeout(),
        }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Closes the endpoint for reading. Pending and future readiness waits fail.
    pub fn close(&self) {
        debug!("close endpoint");
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl EndPoint for TcpEndPoint {
    fn fill(&self, buf: &mut BytesMut) -> io::Result<Fill> {
        if self.is_closed() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "endpoint closed"));
        }
        if self.input_shutdown.load(Ordering::Acquire) {
            return Ok(Fill::Shutdown);
        }

        loop {
            return match self.stream.try_read_buf(buf) {
                Ok(0) => {
                    debug!("input shutdown by peer");
                    self.input_shutdown.store(true, Ordering::Release);
                    Ok(Fill::Shutdown)
                }
                Ok(filled) => {
                    trace!(filled, "filled from socket");
                    Ok(Fill::Filled(filled))
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Fill::Empty),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
        }
    }

    fn is_input_shutdown(&self) -> bool {
        self.input_shutdown.load(Ordering::Acquire)
    }

    fn fill_interested(&self, callback: Arc<dyn Callback>) {
        if self.is_closed() {
            callback.failed(io::Error::new(io::ErrorKind::NotConnected, "endpoint closed").into());
            return;
        }

        let wait = self.closed.child_token();
        if let Some(superseded) = self.wait.lock().unwrap_or_else(PoisonError::into_inner).replace(wait.clone()) {
            superseded.cancel();
        }

        let stream = Arc::clone(&self.stream);
        let closed = self.closed.clone();
        let idle_timeout = self.idle_timeout;

        self.handle.spawn(async move {
            let readable = async {
                match idle_timeout {
                    Some(idle_timeout) => match tokio::time::timeout(idle_timeout, stream.readable()).await {
                        Ok(result) => result,
                        Err(_elapsed) => Err(io::Error::new(io::ErrorKind::TimedOut, "idle timeout expired while waiting for content")),
                    },
                    None => stream.readable().await,
                }
            };

            let result = tokio::select! {
                biased;
                () = wait.cancelled() => {
                    if !closed.is_cancelled() {
                        trace!("fill interest superseded");
                        return;
                    }
                    Err(io::Error::new(io::ErrorKind::ConnectionAborted, "endpoint closed while waiting for content"))
                }
                result = readable => result,
            };

            match result {
                Ok(()) => {
                    trace!("socket readable");
                    callback.succeeded();
                }
                Err(e) => {
                    debug!(cause = %e, "fill interest failed");
                    callback.failed(e.into());
                }
            }
        });
    }
}
