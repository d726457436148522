use crate::protocol::InputError;

/// The read state machine of an [`HttpInput`](super::HttpInput).
///
/// Held content and an armed readiness wait are separate variants, so an input
/// can never be both at once. `Eof` and `Failed` are terminal until the input
/// is recycled.
#[derive(Debug)]
pub(crate) enum ReadState<C> {
    /// Nothing held, the next read asks the source for content.
    Idle,
    /// A chunk with unread bytes is held.
    HasContent(C),
    /// A listener waits for a readiness event.
    AsyncArmed,
    /// The body was read to its end.
    Eof,
    /// Reading failed, every later read sees the same cause.
    Failed(InputError),
}

impl<C> ReadState<C> {
    pub(crate) fn kind(&self) -> InputState {
        match self {
            ReadState::Idle => InputState::Idle,
            ReadState::HasContent(_) => InputState::HasContent,
            ReadState::AsyncArmed => InputState::AsyncArmed,
            ReadState::Eof => InputState::Eof,
            ReadState::Failed(_) => InputState::Failed,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, ReadState::Eof | ReadState::Failed(_))
    }
}

/// A snapshot of which state an input is in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputState {
    Idle,
    HasContent,
    AsyncArmed,
    Eof,
    Failed,
}

/// The outcome of a successful non-blocking read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// Bytes copied into the destination buffer.
    Data(usize),
    /// No content right now, nothing changed.
    WouldBlock,
    /// The body was read to its end.
    Eof,
}

impl ReadStatus {
    #[inline]
    pub fn is_would_block(&self) -> bool {
        matches!(self, ReadStatus::WouldBlock)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, ReadStatus::Eof)
    }
}
