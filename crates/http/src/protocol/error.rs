use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while parsing a request head or framing its body.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("incomplete message: {reason}")]
    IncompleteMessage { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn incomplete_message<S: ToString>(str: S) -> Self {
        Self::IncompleteMessage { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// The failure a body reader observes.
///
/// `InputError` is `Clone` because a failed input keeps its cause and hands the
/// same error to every later read until it is recycled.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    /// Filling from, or waiting on, the transport failed: reset, timeout, close.
    #[error("transport error: {source}")]
    Transport { source: Arc<io::Error> },

    /// The parser rejected the byte stream, including a message cut short by
    /// end of stream.
    #[error("protocol error: {source}")]
    Protocol { source: Arc<ParseError> },

    /// A contract between the parser, the input and its caller was broken.
    #[error("invariant violation: {reason}")]
    InvariantViolation { reason: String },
}

impl InputError {
    pub fn transport<E: Into<io::Error>>(e: E) -> Self {
        Self::Transport { source: Arc::new(e.into()) }
    }

    pub fn protocol(e: ParseError) -> Self {
        Self::Protocol { source: Arc::new(e) }
    }

    pub fn invariant_violation<S: ToString>(str: S) -> Self {
        Self::InvariantViolation { reason: str.to_string() }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    /// Whether the message ended before the parser saw all of it.
    pub fn is_incomplete_message(&self) -> bool {
        matches!(self, Self::Protocol { source } if matches!(source.as_ref(), ParseError::IncompleteMessage { .. }))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source } if source.kind() == io::ErrorKind::TimedOut)
    }
}

impl From<io::Error> for InputError {
    fn from(e: io::Error) -> Self {
        Self::transport(e)
    }
}

impl From<ParseError> for InputError {
    fn from(e: ParseError) -> Self {
        Self::protocol(e)
    }
}

impl From<InputError> for io::Error {
    fn from(e: InputError) -> Self {
        let kind = match &e {
            InputError::Transport { source } => source.kind(),
            InputError::Protocol { source } if matches!(source.as_ref(), ParseError::IncompleteMessage { .. }) => {
                io::ErrorKind::UnexpectedEof
            }
            InputError::Protocol { .. } => io::ErrorKind::InvalidData,
            InputError::InvariantViolation { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}
