//! Render/sync engine — projects a [`Snapshot`] onto the terminal.
//!
//! Every frame is a full repaint: clear the screen, paint every visible row
//! from column 0, then force the terminal cursor to the virtual cursor. No
//! diffing and no retained state about what the terminal shows, so the
//! display can never drift from the buffer — the cost is bytes, which an
//! editor this size can afford.
//!
//! The frame is assembled in an [`OutputBuffer`] and handed to the terminal
//! in one write, bracketed by synchronized-output markers, so the user sees
//! whole frames only.
//!
//! Cells are painted as they are, except control characters (C0, DEL, C1):
//! a stored `ESC` or `TAB` would act on the terminal instead of showing up,
//! so each one is drawn as a single [`CONTROL_PLACEHOLDER`]. The buffer
//! keeps the original character.
//!
//! flim does not scroll: rows and columns beyond the terminal's size are
//! kept in the buffer (and saved) but not painted, and the cursor is pinned
//! to the last visible cell.

use std::io;

use flim_term::ansi;
use flim_term::output::OutputBuffer;
use flim_term::query::CursorPos;
use flim_term::terminal::{Size, Term};

use crate::buffer::Snapshot;
use crate::position::Position;

/// Drawn in place of a control character.
pub const CONTROL_PLACEHOLDER: char = '?';

/// The character that represents `ch` on screen, one cell wide.
#[inline]
#[must_use]
pub fn display_char(ch: char) -> char {
    if ch.is_control() {
        CONTROL_PLACEHOLDER
    } else {
        ch
    }
}

/// Map a buffer position to the terminal cell that displays it (0-indexed),
/// pinned to the viewport.
#[must_use]
pub fn terminal_position(pos: Position, size: Size) -> CursorPos {
    let pin = |v: usize, extent: u16| -> u16 {
        u16::try_from(v)
            .unwrap_or(u16::MAX)
            .min(extent.saturating_sub(1))
    };
    CursorPos {
        row: pin(pos.line, size.rows),
        col: pin(pos.col, size.cols),
    }
}

/// Full-repaint renderer. Holds only its reusable output buffer.
#[derive(Default)]
pub struct Renderer {
    out: OutputBuffer,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: OutputBuffer::new(),
        }
    }

    /// Repaint the terminal from `snapshot` and leave the terminal cursor on
    /// the virtual cursor. Returns the terminal cell the cursor was sent to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the frame to the terminal fails.
    pub fn render(&mut self, term: &mut impl Term, snapshot: &Snapshot) -> io::Result<CursorPos> {
        let target = self.build_frame(snapshot, term.size())?;
        self.out.flush_to(term)?;
        Ok(target)
    }

    /// Re-issue the absolute move to `target` without repainting.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn place_cursor(&mut self, term: &mut impl Term, target: CursorPos) -> io::Result<()> {
        self.out.clear();
        ansi::cursor_to(&mut self.out, target.row, target.col)?;
        self.out.flush_to(term)
    }

    /// Assemble one frame into the output buffer.
    fn build_frame(&mut self, snapshot: &Snapshot, size: Size) -> io::Result<CursorPos> {
        let out = &mut self.out;
        out.clear();

        ansi::begin_sync(out)?;
        ansi::cursor_hide(out)?;
        ansi::clear_screen(out)?;

        for (row, text) in (0..size.rows).zip(&snapshot.rows) {
            ansi::cursor_to(out, row, 0)?;
            for ch in text.chars().take(usize::from(size.cols)) {
                out.push_char(display_char(ch));
            }
        }

        let target = terminal_position(snapshot.cursor, size);
        ansi::cursor_to(out, target.row, target.col)?;
        ansi::cursor_show(out)?;
        ansi::end_sync(out)?;

        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
