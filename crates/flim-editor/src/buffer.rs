//! Virtual buffer — the authoritative in-memory text grid and cursor.
//!
//! A `VirtualBuffer` wraps a [`ropey::Rope`] and a cursor [`Position`]. The
//! rope stores rows joined by `'\n'`: line boundaries are structural, so a
//! row never holds the terminator as a cell, and there is no trailing
//! terminator (an empty rope is one empty row).
//!
//! # Design choices
//!
//! - **Padding on write, clamping on move.** Typing with the cursor parked
//!   past the written content pads with empty rows and spaces until the
//!   cursor is reachable, so writing never fails. Arrow keys clamp to the
//!   written content, so navigation never fabricates cells.
//!
//! - **Columns are char offsets.** Every cell is one `char`; flim only
//!   inserts visible ASCII, and width handling is out of scope.
//!
//! - ropey is built with only LF as a line break, so form feeds and stray
//!   carriage returns loaded from a file stay ordinary cells.

use std::fmt;

use flim_term::input::Direction;
use ropey::Rope;

use crate::position::Position;

/// A read-only copy of the grid and cursor, for rendering and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// One entry per row, without terminators. Never empty.
    pub rows: Vec<String>,
    pub cursor: Position,
}

/// The editor's text grid and cursor.
///
/// # Invariants
///
/// - `line_count() >= 1`
/// - after any [`move_cursor`](Self::move_cursor) or
///   [`insert_char`](Self::insert_char):
///   `cursor.line < line_count()` and `cursor.col <= line_len(cursor.line)`
pub struct VirtualBuffer {
    rope: Rope,
    cursor: Position,
    modified: bool,
}

impl VirtualBuffer {
    // -- Construction -------------------------------------------------------

    /// One empty row, cursor at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor: Position::ZERO,
            modified: false,
        }
    }

    /// Build from rows. Rows must not contain `'\n'`; an empty iterator
    /// gives one empty row.
    #[must_use]
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            debug_assert!(!row.as_ref().contains('\n'), "row contains a terminator");
            text.push_str(row.as_ref());
        }
        Self {
            rope: Rope::from_str(&text),
            cursor: Position::ZERO,
            modified: false,
        }
    }

    // -- Text access --------------------------------------------------------

    /// Number of rows. Always at least 1.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Number of cells in a row, excluding the structural terminator.
    /// `None` if the row doesn't exist.
    #[must_use]
    pub fn line_len(&self, line: usize) -> Option<usize> {
        if line >= self.line_count() {
            return None;
        }
        let slice = self.rope.line(line);
        let total = slice.len_chars();
        if total > 0 && slice.char(total - 1) == '\n' {
            Some(total - 1)
        } else {
            Some(total)
        }
    }

    /// A row's cells as a `String`, or `None` if the row doesn't exist.
    #[must_use]
    pub fn row(&self, line: usize) -> Option<String> {
        let len = self.line_len(line)?;
        let start = self.rope.line_to_char(line);
        Some(self.rope.slice(start..start + len).to_string())
    }

    /// The cell at a position, or `None` past the end of the row.
    #[must_use]
    pub fn char_at(&self, pos: Position) -> Option<char> {
        let len = self.line_len(pos.line)?;
        (pos.col < len).then(|| self.rope.char(self.rope.line_to_char(pos.line) + pos.col))
    }

    /// All rows joined by `'\n'`, without a trailing terminator.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    // -- Cursor -------------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Position {
        self.cursor
    }

    /// Move the cursor to `pos`, clamped to the written content.
    pub fn set_cursor(&mut self, pos: Position) {
        let line = pos.line.min(self.line_count() - 1);
        let col = pos.col.min(self.line_len(line).unwrap_or(0));
        self.cursor = Position::new(line, col);
    }

    /// Park the cursor anywhere, including past the written content. The
    /// next [`insert_char`](Self::insert_char) pads up to it.
    pub const fn park_cursor(&mut self, pos: Position) {
        self.cursor = pos;
    }

    /// Move the cursor one cell. Row is clamped to the existing rows and
    /// column to the current row's length; a move past a bound is a no-op.
    ///
    /// Vertical moves pull the column back onto the new row if it is
    /// shorter.
    pub fn move_cursor(&mut self, direction: Direction) {
        let last_line = self.line_count() - 1;
        let Position { line, col } = self.cursor;

        let (line, col) = match direction {
            Direction::Up if line > 0 => (line.min(last_line + 1) - 1, col),
            Direction::Down if line < last_line => (line + 1, col),
            Direction::Left if col > 0 => (line, col - 1),
            Direction::Right if col < self.line_len(line).unwrap_or(0) => (line, col + 1),
            _ => return,
        };

        let col = col.min(self.line_len(line).unwrap_or(0));
        self.cursor = Position::new(line, col);
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `ch` at the cursor and advance the cursor one column.
    ///
    /// Cells at and after the cursor shift right. If the cursor is parked
    /// past the written content, empty rows and then spaces are appended
    /// until it is reachable.
    pub fn insert_char(&mut self, ch: char) {
        debug_assert_ne!(ch, '\n', "rows never store the terminator");

        self.pad_to_cursor();
        let idx = self.rope.line_to_char(self.cursor.line) + self.cursor.col;
        self.rope.insert_char(idx, ch);
        self.cursor.col += 1;
        self.modified = true;
    }

    /// Append empty rows, then spaces, until the cursor is a valid position.
    fn pad_to_cursor(&mut self) {
        let missing_rows = (self.cursor.line + 1).saturating_sub(self.line_count());
        if missing_rows > 0 {
            let end = self.rope.len_chars();
            self.rope.insert(end, &"\n".repeat(missing_rows));
        }

        let len = self.line_len(self.cursor.line).unwrap_or(0);
        if self.cursor.col > len {
            let end_of_row = self.rope.line_to_char(self.cursor.line) + len;
            self.rope.insert(end_of_row, &" ".repeat(self.cursor.col - len));
        }
    }

    // -- Snapshot -----------------------------------------------------------

    /// Copy out every row and the cursor.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: (0..self.line_count())
                .filter_map(|line| self.row(line))
                .collect(),
            cursor: self.cursor,
        }
    }

    // -- Metadata -----------------------------------------------------------

    /// True if any cell was inserted since construction or the last
    /// [`mark_saved`](Self::mark_saved).
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[inline]
    pub const fn mark_saved(&mut self) {
        self.modified = false;
    }
}

impl Default for VirtualBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualBuffer")
            .field("lines", &self.line_count())
            .field("chars", &self.rope.len_chars())
            .field("cursor", &self.cursor)
            .field("modified", &self.modified)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(rows: &[&str]) -> VirtualBuffer {
        VirtualBuffer::from_rows(rows.iter().copied())
    }

    fn moves(buf: &mut VirtualBuffer, dirs: &[Direction]) {
        for &d in dirs {
            buf.move_cursor(d);
        }
    }

    /// Cursor invariant after every operation the event loop can apply.
    fn assert_cursor_valid(buf: &VirtualBuffer) {
        let c = buf.cursor();
        assert!(c.line < buf.line_count(), "line out of range: {c:?}");
        assert!(c.col <= buf.line_len(c.line).unwrap(), "col out of range: {c:?}");
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_buffer_has_one_empty_row() {
        let buf = VirtualBuffer::new();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_len(0), Some(0));
        assert_eq!(buf.cursor(), Position::ZERO);
        assert!(!buf.is_modified());
    }

    #[test]
    fn from_rows_keeps_rows() {
        let buf = buffer(&["abc", "", "de"]);
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.row(0).as_deref(), Some("abc"));
        assert_eq!(buf.row(1).as_deref(), Some(""));
        assert_eq!(buf.row(2).as_deref(), Some("de"));
        assert_eq!(buf.row(3), None);
    }

    #[test]
    fn from_no_rows_is_one_empty_row() {
        let buf = VirtualBuffer::from_rows(Vec::<String>::new());
        assert_eq!(buf.line_count(), 1);
    }

    #[test]
    fn control_cells_are_not_line_breaks() {
        let buf = buffer(&["a\rb\x0cc"]);
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_len(0), Some(5));
    }

    // -- Insert -------------------------------------------------------------

    #[test]
    fn insert_into_empty() {
        let mut buf = VirtualBuffer::new();
        buf.insert_char('h');
        buf.insert_char('i');
        assert_eq!(buf.contents(), "hi");
        assert_eq!(buf.cursor(), Position::new(0, 2));
        assert!(buf.is_modified());
    }

    #[test]
    fn insert_advances_by_one_and_stores_char() {
        for ch in (0x20..=0x7E_u8).map(char::from) {
            let mut buf = buffer(&["xyz"]);
            buf.set_cursor(Position::new(0, 1));
            let before = buf.cursor();
            buf.insert_char(ch);
            assert_eq!(buf.cursor().col, before.col + 1);
            assert_eq!(buf.char_at(before), Some(ch));
        }
    }

    #[test]
    fn insert_shifts_rest_of_row() {
        let mut buf = buffer(&["ac", "zz"]);
        buf.set_cursor(Position::new(0, 1));
        buf.insert_char('b');
        assert_eq!(buf.row(0).as_deref(), Some("abc"));
        assert_eq!(buf.row(1).as_deref(), Some("zz"));
    }

    #[test]
    fn insert_at_append_position() {
        let mut buf = buffer(&["ab", "c"]);
        buf.set_cursor(Position::new(0, 2));
        buf.insert_char('!');
        assert_eq!(buf.contents(), "ab!\nc");
    }

    #[test]
    fn insert_pads_row_with_spaces() {
        let mut buf = buffer(&["ab"]);
        buf.park_cursor(Position::new(0, 5));
        buf.insert_char('x');
        assert_eq!(buf.row(0).as_deref(), Some("ab   x"));
        assert_eq!(buf.cursor(), Position::new(0, 6));
    }

    #[test]
    fn insert_pads_missing_rows() {
        let mut buf = buffer(&["ab"]);
        buf.park_cursor(Position::new(3, 2));
        buf.insert_char('x');
        let snap = buf.snapshot();
        assert_eq!(snap.rows, vec!["ab", "", "", "  x"]);
        assert_cursor_valid(&buf);
    }

    // -- Movement -----------------------------------------------------------

    #[test]
    fn right_from_origin() {
        let mut buf = buffer(&["abc"]);
        buf.move_cursor(Direction::Right);
        assert_eq!(buf.cursor(), Position::new(0, 1));
    }

    #[test]
    fn left_at_column_zero_is_noop() {
        let mut buf = buffer(&["abc"]);
        moves(&mut buf, &[Direction::Left, Direction::Left]);
        assert_eq!(buf.cursor(), Position::ZERO);
    }

    #[test]
    fn up_at_row_zero_is_noop() {
        let mut buf = buffer(&["abc", "def"]);
        buf.set_cursor(Position::new(0, 2));
        moves(&mut buf, &[Direction::Up, Direction::Up, Direction::Up]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn down_never_creates_rows() {
        let mut buf = buffer(&["a", "b"]);
        moves(&mut buf, &[Direction::Down; 5]);
        assert_eq!(buf.cursor(), Position::new(1, 0));
        assert_eq!(buf.line_count(), 2);
        assert!(!buf.is_modified());
    }

    #[test]
    fn right_stops_at_append_position() {
        let mut buf = buffer(&["ab"]);
        moves(&mut buf, &[Direction::Right; 4]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn vertical_move_clamps_column_to_shorter_row() {
        let mut buf = buffer(&["abcdef", "ab"]);
        buf.set_cursor(Position::new(0, 5));
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor(), Position::new(1, 2));
    }

    #[test]
    fn arbitrary_moves_stay_in_grid() {
        let mut buf = buffer(&["hello", "", "a longer row", "x"]);
        let pattern = [
            Direction::Down,
            Direction::Right,
            Direction::Right,
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Down,
            Direction::Down,
        ];
        for step in 0..200 {
            buf.move_cursor(pattern[step % pattern.len()]);
            assert_cursor_valid(&buf);
        }
    }

    #[test]
    fn up_from_parked_cursor_lands_on_last_row() {
        let mut buf = buffer(&["a", "bc"]);
        buf.park_cursor(Position::new(9, 9));
        buf.move_cursor(Direction::Up);
        assert_eq!(buf.cursor(), Position::new(1, 2));
    }

    #[test]
    fn set_cursor_clamps() {
        let mut buf = buffer(&["abc", "d"]);
        buf.set_cursor(Position::new(7, 7));
        assert_eq!(buf.cursor(), Position::new(1, 1));
    }

    // -- Snapshot -----------------------------------------------------------

    #[test]
    fn snapshot_copies_rows_and_cursor() {
        let mut buf = buffer(&["abc", "de"]);
        buf.set_cursor(Position::new(1, 1));
        assert_eq!(
            buf.snapshot(),
            Snapshot {
                rows: vec!["abc".into(), "de".into()],
                cursor: Position::new(1, 1),
            }
        );
    }

    #[test]
    fn snapshot_is_detached() {
        let mut buf = buffer(&["a"]);
        let snap = buf.snapshot();
        buf.insert_char('z');
        assert_eq!(snap.rows, vec!["a"]);
    }

    #[test]
    fn mark_saved_clears_modified() {
        let mut buf = VirtualBuffer::new();
        buf.insert_char('a');
        buf.mark_saved();
        assert!(!buf.is_modified());
    }
}
