//! The unit of body bytes handed from the parser to a reader.

use std::cmp;

use bytes::Bytes;

/// A chunk of readable body bytes with a cursor.
///
/// The input engine only needs three capabilities from a chunk: how much is
/// left, a bounded copy of the unread bytes, and advancing the cursor. Chunks
/// are created by the parser, held by the input until fully read, then dropped.
pub trait Content: Send + 'static {
    /// Number of unread bytes.
    fn remaining(&self) -> usize;

    /// Copies up to `dst.len()` unread bytes into `dst` without moving the
    /// cursor, returning the number of bytes copied.
    fn copy_to(&self, dst: &mut [u8]) -> usize;

    /// Moves the cursor forward by `len` bytes.
    fn consume(&mut self, len: usize);

    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }
}

impl Content for Bytes {
    #[inline]
    fn remaining(&self) -> usize {
        self.len()
    }

    fn copy_to(&self, dst: &mut [u8]) -> usize {
        let len = cmp::min(self.len(), dst.len());
        dst[..len].copy_from_slice(&self[..len]);
        len
    }

    #[inline]
    fn consume(&mut self, len: usize) {
        bytes::Buf::advance(self, len);
    }
}
