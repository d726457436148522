//! Protocol level types shared by the parser, the endpoint and the input.
//!
//! - **Content** ([`content`]): the [`Content`] capability trait implemented for
//!   `bytes::Bytes`, the representation every body chunk travels in
//! - **Messages** ([`message`]): [`PayloadItem`] and [`PayloadSize`] used by the
//!   body decoders
//! - **Request heads** ([`request`]): [`RequestHeader`]
//! - **Errors** ([`error`]):
//!   - [`ParseError`]: malformed or incomplete messages
//!   - [`InputError`]: what a body reader observes

mod content;
pub use content::Content;

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;

mod error;
pub use error::InputError;
pub use error::ParseError;
