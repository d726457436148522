//! Per-connection glue.
//!
//! - [`HttpConnection`]: owns a connection's input, reads request heads and
//!   prepares the input for the next request
//! - [`Dispatcher`] and [`ConnectionEvent`]: the queue readiness events travel
//!   through, so listener code runs on the connection's dispatch loop and never
//!   inside the endpoint's completion context

mod dispatcher;
mod http_connection;

pub use dispatcher::{ConnectionEvent, Dispatcher, dispatch_channel};
pub use http_connection::HttpConnection;
