//! Request body reading.
//!
//! - [`HttpInput`]: the read state machine, usable blocking or with a
//!   [`ReadListener`]
//! - [`ContentSource`]: where the engine gets content from
//! - [`HttpInputOverHttp`]: the source reading HTTP/1.x bodies off an
//!   [`EndPoint`](crate::endpoint::EndPoint)

mod http_input;
mod over_http;
mod state;

pub use http_input::{ContentSource, HttpInput, NextContent, ReadListener};
pub use over_http::HttpInputOverHttp;
pub use state::{InputState, ReadStatus};
