// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// OutputBuffer accumulates a whole frame of ANSI bytes in memory so it can be
// handed to the terminal in a single write. This eliminates per-escape
// overhead and means a frame is never half-written when an error strikes
// mid-build: either the whole frame reaches the terminal or none of it does.

use std::io::{self, Write};

use crate::terminal::Term;

/// A byte buffer that accumulates ANSI output for a single write.
///
/// Starts at 16 KiB; an 80×24 repaint with a CUP per row fits easily.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Empty, with room for a typical frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes of the frame built so far.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Drop the contents, keep the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Hand the frame to `term` in one write, flush, and start over.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing the terminal fails. The
    /// buffer is left intact in that case.
    pub fn flush_to(&mut self, term: &mut impl Term) -> io::Result<()> {
        if !self.buf.is_empty() {
            term.write_bytes(&self.buf)?;
            term.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi;
    use crate::scripted::ScriptedTerm;
    use crate::terminal::Size;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_is_empty() {
        let out = OutputBuffer::new();
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn push_char_ascii() {
        let mut out = OutputBuffer::new();
        out.push_char('a');
        out.push_char('~');
        assert_eq!(out.as_bytes(), b"a~");
    }

    #[test]
    fn ansi_writes_land_in_buffer() {
        let mut out = OutputBuffer::new();
        ansi::cursor_to(&mut out, 1, 2).unwrap();
        assert_eq!(out.as_bytes(), b"\x1b[2;3H");
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut out = OutputBuffer::new();
        out.push_char('x');
        out.clear();
        assert!(out.is_empty());
    }

    #[test]
    fn flush_to_writes_once_and_clears() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        let mut out = OutputBuffer::new();
        out.push_char('h');
        out.push_char('i');
        out.flush_to(&mut term).unwrap();
        assert!(out.is_empty());
        assert_eq!(term.output(), b"hi");
        assert_eq!(term.writes(), 1);
    }

    #[test]
    fn flush_to_skips_empty_buffer() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        OutputBuffer::new().flush_to(&mut term).unwrap();
        assert_eq!(term.writes(), 0);
    }
}
