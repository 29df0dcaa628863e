// SPDX-License-Identifier: MIT
//
// Cursor position query (DSR 6 / CPR).
//
// The terminal is the only party that knows where its cursor really is.
// We ask with `ESC [ 6 n` and it answers `ESC [ row ; col R` on the *input*
// stream, interleaved with whatever the user is typing. So the query is a
// blocking round-trip that reads one byte at a time until the `R`, and it
// takes `&mut` on the terminal for its whole duration: nothing else can
// consume input while the answer is in flight.
//
// Keys the user types before the answer arrives are read along with it.
// They are handed back in the report so the caller can still apply them.
//
// A terminal that never answers would hang us forever on a real tty; the
// byte budget only guards against one that answers with garbage.

use std::io;
use std::sync::LazyLock;

use regex::bytes::Regex;
use thiserror::Error;

use crate::ansi;
use crate::output::OutputBuffer;
use crate::terminal::Term;

/// Default byte budget for a cursor report. `ESC[65535;65535R` is 16 bytes;
/// the slack absorbs a few keystrokes typed during the round-trip.
pub const DEFAULT_MAX_REPORT_LEN: usize = 32;

/// The report itself, anchored at the end of what we read. Anything before
/// the final `ESC [` is keyboard input that raced the answer.
static REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[(\d+);(\d+)R$").expect("cursor report pattern is valid")
});

/// A cursor position reported by the terminal, converted to 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub row: u16,
    pub col: u16,
}

/// A parsed answer to a cursor query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorReport {
    pub pos: CursorPos,
    /// Input bytes that arrived ahead of the report, in order.
    pub typed_ahead: Vec<u8>,
}

/// Why a cursor position query failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Input ended before the report terminator arrived.
    #[error("terminal input closed before the cursor report arrived")]
    Eof,

    /// No `R` within the byte budget.
    #[error("no cursor report terminator within {0} bytes")]
    Unterminated(usize),

    /// An `R` arrived but the bytes before it are not a report.
    #[error("malformed cursor report {0:?}")]
    Malformed(String),

    #[error("cursor query I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Ask the terminal where its cursor is and wait for the answer.
///
/// Blocks until the terminal replies. Reads at most `max_len` bytes.
///
/// # Errors
///
/// See [`QueryError`]. All variants are fatal for the caller: without a
/// trustworthy answer the terminal cursor can't be reconciled.
pub fn query_cursor_position(
    term: &mut impl Term,
    max_len: usize,
) -> Result<CursorReport, QueryError> {
    let mut out = OutputBuffer::new();
    ansi::request_cursor_position(&mut out)?;
    out.flush_to(term)?;

    let mut response = Vec::with_capacity(max_len.min(64));
    let mut byte = [0u8; 1];

    while response.last() != Some(&b'R') {
        if response.len() >= max_len {
            return Err(QueryError::Unterminated(max_len));
        }
        if term.read_partial(&mut byte)? == 0 {
            return Err(QueryError::Eof);
        }
        response.push(byte[0]);
    }

    parse_report(&response)
}

/// Parse `ESC [ row ; col R` (1-indexed) into a 0-indexed [`CursorPos`],
/// keeping any bytes in front of it as typed-ahead input.
///
/// # Errors
///
/// Returns [`QueryError::Malformed`] if the bytes don't end in a report or
/// a coordinate is zero or out of range.
pub fn parse_report(response: &[u8]) -> Result<CursorReport, QueryError> {
    let malformed = || QueryError::Malformed(String::from_utf8_lossy(response).into_owned());

    let caps = REPORT.captures(response).ok_or_else(malformed)?;
    let number = |i: usize| -> Option<u16> {
        std::str::from_utf8(&caps[i]).ok()?.parse::<u16>().ok()?.checked_sub(1)
    };

    let (Some(row), Some(col)) = (number(1), number(2)) else {
        return Err(malformed());
    };

    let start = caps.get(0).map_or(0, |m| m.start());
    if start > 0 {
        log::debug!("{start} input bytes arrived ahead of the cursor report");
    }

    Ok(CursorReport {
        pos: CursorPos { row, col },
        typed_ahead: response[..start].to_vec(),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
