//! File bridge — the virtual buffer's backing file.
//!
//! The bridge opens the file once at startup (read-write, created if
//! absent), hands its rows to the virtual buffer, and writes the grid back
//! over the same handle at shutdown. It owns the handle for the whole
//! session; [`FileBridge::close`] consumes the bridge, so the handle is
//! released exactly once.
//!
//! # Layout
//!
//! Plain text, one terminated line per row. The terminator style (`\n` or
//! `\r\n`) is detected from the first line break on load and reused on
//! flush, so a CRLF file stays CRLF. A file with no line breaks is written
//! back with `\n`.
//!
//! # Encoding
//!
//! Content that is valid UTF-8 is read as UTF-8. Anything else is read as
//! Latin-1, one cell per byte, so no file is refused and every byte comes
//! back out unchanged on flush. The choice is made once on load and reused
//! for the write.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::buffer::Snapshot;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line terminator used when writing rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n` — Unix.
    #[default]
    Lf,
    /// `\r\n` — Windows, DOS.
    CrLf,
}

impl LineEnding {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the line ending from the first `\n` in `text`. Returns `Lf`
    /// if there is none.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// How file bytes map to buffer characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// One byte per character, `0x00..=0xFF` to `U+0000..=U+00FF`.
    Latin1,
}

impl Encoding {
    /// Decode `bytes`, choosing UTF-8 when it is valid and Latin-1 otherwise.
    #[must_use]
    pub fn decode(bytes: Vec<u8>) -> (String, Self) {
        match String::from_utf8(bytes) {
            Ok(text) => (text, Self::Utf8),
            Err(e) => {
                let text = e.as_bytes().iter().copied().map(char::from).collect();
                (text, Self::Latin1)
            }
        }
    }

    /// Encode `text` back to bytes. Under Latin-1, a character above
    /// `U+00FF` is written as `?`.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => text
                .chars()
                .map(|ch| u8::try_from(ch).unwrap_or(b'?'))
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Latin1 => f.write_str("Latin-1"),
        }
    }
}

/// Split file content into rows.
///
/// A trailing terminator ends the last row rather than starting a new one;
/// an empty text is one empty row. With `CrLf`, a `\r` directly before a
/// `\n` belongs to the terminator.
#[must_use]
pub fn split_rows(text: &str, ending: LineEnding) -> Vec<String> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|row| match ending {
            LineEnding::CrLf => row.strip_suffix('\r').unwrap_or(row),
            LineEnding::Lf => row,
        })
        .map(str::to_owned)
        .collect()
}

/// Serialize rows, each followed by the terminator.
#[must_use]
pub fn join_rows(rows: &[String], ending: LineEnding) -> String {
    let term = ending.as_str();
    let mut text = String::with_capacity(rows.iter().map(|r| r.len() + term.len()).sum());
    for row in rows {
        text.push_str(row);
        text.push_str(term);
    }
    text
}

// ---------------------------------------------------------------------------
// FileBridge
// ---------------------------------------------------------------------------

/// Exclusive owner of the backing file for the session's lifetime.
pub struct FileBridge {
    file: File,
    path: PathBuf,
    line_ending: LineEnding,
    encoding: Encoding,
}

impl FileBridge {
    /// Open `path` for reading and writing, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if the file can't be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::file_access(path, e))?;

        log::info!("opened {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            line_ending: LineEnding::Lf,
            encoding: Encoding::Utf8,
        })
    }

    /// Read the whole file and split it into rows.
    ///
    /// An empty (or freshly created) file gives one empty row. Also records
    /// the line ending and encoding to use on [`flush`](Self::flush).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if reading fails.
    pub fn load(&mut self) -> Result<Vec<String>> {
        let mut bytes = Vec::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_end(&mut bytes))
            .map_err(|e| Error::file_access(&self.path, e))?;

        let len = bytes.len();
        let (text, encoding) = Encoding::decode(bytes);
        self.encoding = encoding;
        self.line_ending = LineEnding::detect(&text);
        let rows = split_rows(&text, self.line_ending);
        log::info!(
            "loaded {} rows ({len} bytes, {}, {}) from {}",
            rows.len(),
            self.line_ending,
            self.encoding,
            self.path.display()
        );
        Ok(rows)
    }

    /// Overwrite the file with the snapshot's rows.
    ///
    /// Rewinds the handle, writes every row followed by the line ending,
    /// and truncates whatever older content lay beyond the new end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if any write fails.
    pub fn flush(&mut self, snapshot: &Snapshot) -> Result<()> {
        let bytes = self
            .encoding
            .encode(&join_rows(&snapshot.rows, self.line_ending));
        self.write_at_start(&bytes)
            .map_err(|e| Error::file_access(&self.path, e))?;
        log::info!(
            "flushed {} rows ({} bytes) to {}",
            snapshot.rows.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_at_start(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(bytes)?;
        self.file.set_len(bytes.len() as u64)?;
        self.file.flush()
    }

    /// Sync and release the handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if the final sync fails. The handle is
    /// released either way.
    pub fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| Error::file_access(&self.path, e))?;
        log::info!("closed {}", self.path.display());
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The terminator flush will use.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// The encoding chosen on load.
    #[inline]
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl fmt::Debug for FileBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBridge")
            .field("path", &self.path)
            .field("line_ending", &self.line_ending)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn snapshot(rows: &[&str]) -> Snapshot {
        Snapshot {
            rows: rows.iter().map(|r| (*r).to_owned()).collect(),
            cursor: Position::ZERO,
        }
    }

    // -- Line endings -------------------------------------------------------

    #[test]
    fn detect_lf() {
        assert_eq!(LineEnding::detect("a\nb\r\n"), LineEnding::Lf);
    }

    #[test]
    fn detect_crlf() {
        assert_eq!(LineEnding::detect("a\r\nb\n"), LineEnding::CrLf);
    }

    #[test]
    fn detect_none_is_lf() {
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
        assert_eq!(LineEnding::detect("abc"), LineEnding::Lf);
    }

    #[test]
    fn detect_leading_newline() {
        assert_eq!(LineEnding::detect("\nabc"), LineEnding::Lf);
    }

    // -- Splitting ----------------------------------------------------------

    #[test]
    fn split_terminated_rows() {
        assert_eq!(split_rows("abc\nde\n", LineEnding::Lf), vec!["abc", "de"]);
    }

    #[test]
    fn split_unterminated_last_row() {
        assert_eq!(split_rows("abc\nde", LineEnding::Lf), vec!["abc", "de"]);
    }

    #[test]
    fn split_empty_is_one_row() {
        assert_eq!(split_rows("", LineEnding::Lf), vec![""]);
    }

    #[test]
    fn split_keeps_blank_rows() {
        assert_eq!(split_rows("a\n\n\nb\n", LineEnding::Lf), vec!["a", "", "", "b"]);
    }

    #[test]
    fn split_crlf_strips_carriage_returns() {
        assert_eq!(split_rows("a\r\nb\r\n", LineEnding::CrLf), vec!["a", "b"]);
    }

    #[test]
    fn split_lf_keeps_stray_carriage_returns() {
        assert_eq!(split_rows("a\r\nb\n", LineEnding::Lf), vec!["a\r", "b"]);
    }

    #[test]
    fn join_terminates_every_row() {
        let rows = vec!["abc".to_owned(), "de".to_owned()];
        assert_eq!(join_rows(&rows, LineEnding::Lf), "abc\nde\n");
        assert_eq!(join_rows(&rows, LineEnding::CrLf), "abc\r\nde\r\n");
    }

    // -- Open / load --------------------------------------------------------

    #[test]
    fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        let mut bridge = FileBridge::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(bridge.load().unwrap(), vec![""]);
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/file.txt");
        let err = FileBridge::open(&path).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn load_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.txt");
        fs::write(&path, "abc\nde\n").unwrap();
        let mut bridge = FileBridge::open(&path).unwrap();
        assert_eq!(bridge.load().unwrap(), vec!["abc", "de"]);
        assert_eq!(bridge.line_ending(), LineEnding::Lf);
    }

    #[test]
    fn load_utf8_is_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utf8.txt");
        fs::write(&path, "caf\u{e9}\n").unwrap();
        let mut bridge = FileBridge::open(&path).unwrap();
        assert_eq!(bridge.load().unwrap(), vec!["caf\u{e9}"]);
        assert_eq!(bridge.encoding(), Encoding::Utf8);
    }

    #[test]
    fn load_latin1_one_cell_per_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9\n").unwrap();
        let mut bridge = FileBridge::open(&path).unwrap();
        assert_eq!(bridge.load().unwrap(), vec!["caf\u{e9}"]);
        assert_eq!(bridge.encoding(), Encoding::Latin1);
    }

    #[test]
    fn non_utf8_bytes_round_trip_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.bin");
        let original = b"caf\xe9\n\xff\xfe\x00\x80\n".to_vec();
        fs::write(&path, &original).unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        let rows = bridge.load().unwrap();
        assert_eq!(rows.len(), 2);
        bridge
            .flush(&Snapshot {
                rows,
                cursor: Position::ZERO,
            })
            .unwrap();
        bridge.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn latin1_edit_writes_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit.txt");
        fs::write(&path, b"\xe9t\xe9\n").unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        bridge.load().unwrap();
        bridge.flush(&snapshot(&["\u{e9}t\u{e9}!"])).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"\xe9t\xe9!\n");
    }

    #[test]
    fn latin1_encode_replaces_wide_characters() {
        assert_eq!(Encoding::Latin1.encode("a\u{263a}b"), b"a?b");
        assert_eq!(Encoding::Utf8.encode("a\u{263a}b"), "a\u{263a}b".as_bytes());
    }

    // -- Flush / close ------------------------------------------------------

    #[test]
    fn round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.txt");
        fs::write(&path, "abc\nde\n").unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        let rows = bridge.load().unwrap();
        bridge
            .flush(&Snapshot {
                rows,
                cursor: Position::ZERO,
            })
            .unwrap();
        bridge.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\nde\n");
    }

    #[test]
    fn round_trip_preserves_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dos.txt");
        fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        let rows = bridge.load().unwrap();
        assert_eq!(rows, vec!["one", "two"]);
        bridge.flush(&snapshot(&["one!", "two"])).unwrap();
        bridge.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one!\r\ntwo\r\n");
    }

    #[test]
    fn flush_terminates_unterminated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.txt");
        fs::write(&path, "abc").unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        let rows = bridge.load().unwrap();
        bridge
            .flush(&Snapshot {
                rows,
                cursor: Position::ZERO,
            })
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
    }

    #[test]
    fn flush_truncates_longer_old_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shrink.txt");
        fs::write(&path, "a very long first line\nand more\n").unwrap();

        let mut bridge = FileBridge::open(&path).unwrap();
        bridge.load().unwrap();
        bridge.flush(&snapshot(&["short"])).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short\n");
    }

    #[test]
    fn flush_twice_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.txt");

        let mut bridge = FileBridge::open(&path).unwrap();
        bridge.load().unwrap();
        bridge.flush(&snapshot(&["first"])).unwrap();
        bridge.flush(&snapshot(&["second", "row"])).unwrap();
        bridge.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\nrow\n");
    }

    #[test]
    fn empty_buffer_flushes_one_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        let mut bridge = FileBridge::open(&path).unwrap();
        bridge.load().unwrap();
        bridge.flush(&snapshot(&[""])).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    }

    #[test]
    fn debug_shows_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbg.txt");
        let bridge = FileBridge::open(&path).unwrap();
        assert!(format!("{bridge:?}").contains("dbg.txt"));
        assert_eq!(bridge.path(), path.as_path());
    }
}
