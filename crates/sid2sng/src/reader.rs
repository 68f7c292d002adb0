//! Bounds-checked cursor over the loaded player binary.

use crate::error::{Result, RipError};

/// Sequential reader over an immutable byte blob.
///
/// Reads are monotonic within each decoding stage; the cursor only ever
/// jumps via [`BlobReader::seek`] between stages. Reading past the end of
/// the blob is a hard error, never a silent truncation.
pub struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The whole underlying blob, for the scans that precede cursor-based
    /// reading.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor to an absolute file offset.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// True while the cursor is inside the blob.
    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(RipError::UnexpectedEof { offset: self.pos })
    }

    /// Consume and return the next byte.
    pub fn read(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_and_peek_does_not() {
        let mut r = BlobReader::new(&[1, 2, 3]);
        assert_eq!(r.peek().unwrap(), 1);
        assert_eq!(r.pos(), 0);
        assert_eq!(r.read().unwrap(), 1);
        assert_eq!(r.read().unwrap(), 2);
        assert_eq!(r.pos(), 2);
        assert!(r.has_remaining());
        assert_eq!(r.read().unwrap(), 3);
        assert!(!r.has_remaining());
    }

    #[test]
    fn read_past_end_reports_offset() {
        let mut r = BlobReader::new(&[0xaa]);
        r.read().unwrap();
        match r.read() {
            Err(RipError::UnexpectedEof { offset }) => assert_eq!(offset, 1),
            other => panic!("expected UnexpectedEof, got {other:?}"),
        }
    }
}
