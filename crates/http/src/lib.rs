//! Request body ingestion for HTTP/1.x server connections
//!
//! This crate turns raw, non-blocking socket reads into a stream of parsed body
//! chunks. The same body can be consumed by a thread that blocks until data
//! arrives, or by an event-driven caller that registers a listener and is told
//! when reading may make progress again.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use std::sync::Arc;
//! use micro_http_input::config::InputConfig;
//! use micro_http_input::connection::HttpConnection;
//! use micro_http_input::endpoint::TcpEndPoint;
//! use tokio::net::TcpListener;
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let config = InputConfig::default();
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = tcp_listener.accept().await.unwrap();
//!         let endpoint = Arc::new(TcpEndPoint::new(tcp_stream, tokio::runtime::Handle::current(), &config));
//!         let connection = HttpConnection::new(endpoint, &config);
//!
//!         // blocking reads must never run on a runtime worker
//!         tokio::task::spawn_blocking(move || {
//!             while let Ok(Some(header)) = connection.read_request_header() {
//!                 let mut body = Vec::new();
//!                 match connection.input().read_to_end(&mut body) {
//!                     Ok(size) => info!(uri = %header.uri(), size, "read request body"),
//!                     Err(e) => error!(cause = %e, "failed to read request body"),
//!                 }
//!                 if !connection.complete_request() {
//!                     break;
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`input`]: the read engine [`input::HttpInput`] and its HTTP binding
//!   [`input::HttpInputOverHttp`]
//! - [`callback`]: single-shot completions, blocking and dispatched
//! - [`endpoint`]: the transport seam and a tokio TCP implementation
//! - [`codec`]: the incremental request parser feeding the engine
//! - [`connection`]: per-connection glue and the readiness dispatch loop
//! - [`protocol`]: errors, request heads and the content abstraction
//!
//! # Execution models
//!
//! The engine keeps one state machine per connection behind one lock. A
//! blocking reader suspends only inside [`callback::BlockingCallback::block`]
//! while waiting for transport readiness. An async reader arms a
//! [`callback::ReadInterest`]; when it fires, the event is queued on the
//! connection's dispatch loop and the listener runs there, never inside the
//! transport's completion context and never from within
//! [`input::HttpInput::set_read_listener`] itself.
//!
//! # Errors
//!
//! - [`protocol::ParseError`]: malformed or incomplete messages
//! - [`protocol::InputError`]: what a reader sees, transport, protocol or
//!   contract violations

pub mod callback;
pub mod codec;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod input;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;

#[cfg(test)]
pub(crate) mod test_util;
