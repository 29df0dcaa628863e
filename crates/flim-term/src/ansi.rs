// SPDX-License-Identifier: MIT
//
// Output-side escape sequences.
//
// flim repaints the whole screen every frame, so it needs very few
// commands: absolute cursor moves, cursor visibility, clear, the DEC 2026
// sync brackets, the DEC 1049 screen switch, and the DSR 6 cursor report
// request. Each is a fixed byte string except the cursor move.
//
// Rows and columns are 0-based at this API; CUP is 1-based on the wire.
// The writers return whatever the underlying `Write` returns, which for an
// `OutputBuffer` is always `Ok`.
use std::io::{self, Write};

pub const HIDE_CURSOR: &[u8] = b"\x1b[?25l";
pub const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
pub const BEGIN_SYNC: &[u8] = b"\x1b[?2026h";
pub const END_SYNC: &[u8] = b"\x1b[?2026l";
pub const ENTER_ALT_SCREEN: &[u8] = b"\x1b[?1049h";
pub const EXIT_ALT_SCREEN: &[u8] = b"\x1b[?1049l";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// CUP to the 0-based cell `(row, col)`.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    // u32 so that u16::MAX + 1 still fits.
    write!(w, "\x1b[{};{}H", u32::from(row) + 1, u32::from(col) + 1)
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(HIDE_CURSOR)
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(SHOW_CURSOR)
}

/// DSR 6. The answer, `ESC [ row ; col R`, comes back on stdin and is read
/// by [`crate::query`].
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(REQUEST_CURSOR_POSITION)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// ED 2. Leaves the cursor where it was.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

/// Start holding output back until [`end_sync`], so a repaint appears at
/// once. Ignored by terminals that don't know mode 2026.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(BEGIN_SYNC)
}

#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(END_SYNC)
}

/// Switch to the alternate screen; the shell's screen and scrollback come
/// back untouched on [`exit_alt_screen`].
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(ENTER_ALT_SCREEN)
}

#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(EXIT_ALT_SCREEN)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
