// SPDX-License-Identifier: MIT
//
// Scripted terminal — an in-memory `Term` for driving the editor in tests.
//
// Input is a queue of steps: byte chunks handed out by `read_partial`
// (split if the caller's buffer is smaller, exactly like a real tty), or
// I/O errors to inject. Output is captured verbatim. Mode switches are
// tracked with the same `Modes` flags the real terminal uses, so tests can
// assert that every exit path restores the terminal.

use std::collections::VecDeque;
use std::io;

use crate::terminal::{Modes, Size, Term};

/// One scripted input step.
#[derive(Debug)]
enum Step {
    Bytes(Vec<u8>),
    Error(io::ErrorKind),
}

/// In-memory terminal with scripted input and captured output.
///
/// An exhausted script reads as end of input (`Ok(0)`).
#[derive(Debug)]
pub struct ScriptedTerm {
    size: Size,
    modes: Modes,
    input: VecDeque<Step>,
    output: Vec<u8>,
    writes: usize,
    fail_writes: Option<io::ErrorKind>,
    enters: usize,
    leaves: usize,
}

impl ScriptedTerm {
    /// An empty script with the given dimensions.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            modes: Modes::empty(),
            input: VecDeque::new(),
            output: Vec::new(),
            writes: 0,
            fail_writes: None,
            enters: 0,
            leaves: 0,
        }
    }

    /// Queue one chunk, delivered by a single `read_partial` call (or
    /// several, if the reader's buffer is smaller).
    pub fn push_input(&mut self, bytes: &[u8]) -> &mut Self {
        self.input.push_back(Step::Bytes(bytes.to_vec()));
        self
    }

    /// Queue a read failure.
    pub fn push_error(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.input.push_back(Step::Error(kind));
        self
    }

    /// Make every subsequent `write_bytes` fail with `kind`.
    pub const fn fail_writes(&mut self, kind: io::ErrorKind) {
        self.fail_writes = Some(kind);
    }

    /// Everything written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Drain the captured output.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Number of successful `write_bytes` calls.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Number of `enter` calls.
    #[must_use]
    pub const fn enters(&self) -> usize {
        self.enters
    }

    /// Number of `leave` calls.
    #[must_use]
    pub const fn leaves(&self) -> usize {
        self.leaves
    }

    /// Input steps not yet consumed.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl Term for ScriptedTerm {
    fn enter(&mut self) -> io::Result<()> {
        self.enters += 1;
        self.modes = Modes::RAW | Modes::ALT_SCREEN;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        self.leaves += 1;
        self.modes = Modes::empty();
        Ok(())
    }

    fn modes(&self) -> Modes {
        self.modes
    }

    fn size(&self) -> Size {
        self.size
    }

    fn read_partial(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.input.pop_front() {
            None => Ok(0),
            Some(Step::Error(kind)) => Err(io::Error::from(kind)),
            Some(Step::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.input.push_front(Step::Bytes(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(kind) = self.fail_writes {
            return Err(io::Error::from(kind));
        }
        self.writes += 1;
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_script_reads_eof() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        let mut buf = [0u8; 8];
        assert_eq!(term.read_partial(&mut buf).unwrap(), 0);
    }

    #[test]
    fn chunk_is_delivered_whole() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        term.push_input(b"\x1b[A").push_input(b"x");
        let mut buf = [0u8; 8];
        assert_eq!(term.read_partial(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"\x1b[A");
        assert_eq!(term.read_partial(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
    }

    #[test]
    fn chunk_larger_than_buffer_is_split() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        term.push_input(b"abc");
        let mut one = [0u8; 1];
        for expected in b"abc" {
            assert_eq!(term.read_partial(&mut one).unwrap(), 1);
            assert_eq!(one[0], *expected);
        }
        assert_eq!(term.pending_input(), 0);
    }

    #[test]
    fn injected_error_surfaces() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        term.push_error(io::ErrorKind::BrokenPipe);
        let err = term.read_partial(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn enter_leave_track_modes() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        term.enter().unwrap();
        assert!(term.is_active());
        term.leave().unwrap();
        assert!(!term.is_active());
        assert_eq!((term.enters(), term.leaves()), (1, 1));
    }

    #[test]
    fn failing_writes_capture_nothing() {
        let mut term = ScriptedTerm::new(Size::DEFAULT);
        term.fail_writes(io::ErrorKind::WriteZero);
        assert!(term.write_bytes(b"x").is_err());
        assert!(term.output().is_empty());
        assert_eq!(term.writes(), 0);
    }
}
