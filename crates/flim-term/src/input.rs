// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns one raw read from stdin into exactly one event. flim understands
// a deliberately small vocabulary:
//
// - Ctrl+C (byte 3) as the interrupt that ends the session
// - visible ASCII (32..=126) as printable characters
// - the four legacy CSI arrow sequences (`ESC [ A` .. `ESC [ D`)
//
// Everything else is reported back as `Unrecognized` with the raw bytes,
// which the event loop treats as a no-op.
//
// # Chunk boundaries
//
// Decoding is stateless: each chunk is classified on its own. The decoder
// assumes one read delivers one complete key — true for keypresses on a
// local terminal. An arrow sequence split across two reads (possible over
// slow links) is lost: the first half decodes as `Unrecognized`, and the
// second half as whatever it looks like on its own. Likewise, several
// keys arriving in one read (fast typing, paste) decode as a single
// `Unrecognized`.

/// Control byte produced by Ctrl+C in raw mode (ETX).
pub const INTERRUPT: u8 = 0x03;

/// Control Sequence Introducer: `ESC [`.
pub const CSI: &[u8] = b"\x1b[";

/// Largest chunk the event loop hands to [`decode`] in one call.
pub const MAX_CHUNK: usize = 256;

// ─── Event Types ────────────────────────────────────────────────────────────

/// Cursor movement direction, one per arrow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// Map a CSI final byte to a direction (`A`/`B`/`C`/`D`).
    #[must_use]
    pub const fn from_final_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Self::Up),
            b'B' => Some(Self::Down),
            b'C' => Some(Self::Right),
            b'D' => Some(Self::Left),
            _ => None,
        }
    }
}

/// A decoded terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A single visible ASCII character.
    Printable(char),
    /// Ctrl+C — end the session.
    Interrupt,
    /// One of the four arrow keys.
    CursorMove(Direction),
    /// Anything else, carried verbatim for diagnostics.
    Unrecognized(Vec<u8>),
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Classify one raw chunk into exactly one [`InputEvent`].
///
/// # Examples
///
/// ```
/// use flim_term::input::{decode, Direction, InputEvent};
///
/// assert_eq!(decode(b"x"), InputEvent::Printable('x'));
/// assert_eq!(decode(b"\x03"), InputEvent::Interrupt);
/// assert_eq!(decode(b"\x1b[A"), InputEvent::CursorMove(Direction::Up));
/// assert!(matches!(decode(b"\x1b[Z"), InputEvent::Unrecognized(_)));
/// ```
#[must_use]
pub fn decode(chunk: &[u8]) -> InputEvent {
    match chunk {
        [INTERRUPT] => InputEvent::Interrupt,
        [b @ 0x20..=0x7E] => InputEvent::Printable(char::from(*b)),
        [_] => unrecognized(chunk),
        _ if chunk.starts_with(CSI) => decode_csi(chunk),
        _ => unrecognized(chunk),
    }
}

/// Classify a chunk that starts with `ESC [`.
///
/// Only a single final byte after the introducer is accepted: parameters
/// (`ESC [ 1 ; 5 C`) or extra trailing bytes make the chunk unrecognized.
fn decode_csi(chunk: &[u8]) -> InputEvent {
    debug_assert!(chunk.starts_with(CSI));

    match &chunk[CSI.len()..] {
        [final_byte] => Direction::from_final_byte(*final_byte)
            .map_or_else(|| unrecognized(chunk), InputEvent::CursorMove),
        _ => unrecognized(chunk),
    }
}

#[inline]
fn unrecognized(chunk: &[u8]) -> InputEvent {
    InputEvent::Unrecognized(chunk.to_vec())
}

/// Cut a run of buffered input into one slice per key, for bytes that did
/// not come from a single read (keystrokes that raced a cursor report).
///
/// A CSI sequence (introducer, parameter bytes, one final byte) stays in one
/// piece; every other byte is a key of its own. A truncated CSI at the end
/// is returned as-is.
#[must_use]
pub fn split_keys(mut bytes: &[u8]) -> Vec<&[u8]> {
    let mut keys = Vec::new();

    while !bytes.is_empty() {
        let len = if bytes.starts_with(CSI) {
            let params = bytes[CSI.len()..]
                .iter()
                .take_while(|b| (0x30..=0x3F).contains(*b))
                .count();
            (CSI.len() + params + 1).min(bytes.len())
        } else {
            1
        };
        let (key, rest) = bytes.split_at(len);
        keys.push(key);
        bytes = rest;
    }

    keys
}

// ─── Tests ───────────────────────────────────────────────────────────────────
