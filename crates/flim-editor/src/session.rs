//! Session — the event loop that ties decoder, buffer, renderer, and file
//! together.
//!
//! A `Session` owns everything an editing run needs: the terminal, the
//! virtual buffer, the backing file, the renderer, and the last known
//! terminal cursor. Nothing is global; `main` builds one and calls
//! [`run`](Session::run).
//!
//! # The loop
//!
//! ```text
//!   ┌──────────────► render snapshot ──► terminal
//!   │                      │
//!   │              read_partial (blocks)
//!   │                      │
//!   │                   decode
//!   │                      │
//!   │   Printable / CursorMove / Unrecognized   Interrupt / EOF
//!   └──────────── apply to buffer               flush, close, leave
//! ```
//!
//! One chunk, one event, one fully applied mutation and repaint. Keys that
//! arrive mixed into a cursor report are queued and applied one by one
//! before the next read. The only
//! blocking points are the raw read and, with `verify_cursor`, the cursor
//! position query.
//!
//! # Restoration
//!
//! Whatever happens inside the loop, [`run`](Session::run) calls `leave()`
//! on the terminal before returning. The real terminal also restores itself
//! on drop and from its panic hook, so the user's shell survives errors and
//! panics alike.

use std::collections::VecDeque;

use flim_term::input::{self, InputEvent};
use flim_term::query::{self, CursorPos};
use flim_term::terminal::Term;

use crate::buffer::VirtualBuffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::file::FileBridge;
use crate::render::Renderer;

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Reading and applying input.
    Running,
    /// Interrupt received: flush, close, restore.
    Terminating,
}

/// Why a session ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user pressed Ctrl+C.
    Interrupted,
    /// Input reached end of file; handled like an interrupt.
    EndOfInput,
}

/// One editing session over one file.
pub struct Session<T: Term> {
    term: T,
    config: Config,
    buffer: VirtualBuffer,
    /// `None` once closed.
    file: Option<FileBridge>,
    renderer: Renderer,
    /// Where the last frame left the terminal cursor.
    terminal_cursor: Option<CursorPos>,
    /// Keys read along with a cursor report, applied before the next read.
    typed_ahead: VecDeque<Vec<u8>>,
    state: State,
}

impl<T: Term> Session<T> {
    /// Open (or create) `path` and load it into a fresh virtual buffer.
    ///
    /// The terminal is not touched until [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if the file can't be opened or read.
    pub fn open(term: T, path: impl AsRef<std::path::Path>, config: Config) -> Result<Self> {
        let mut file = FileBridge::open(path)?;
        let rows = file.load()?;
        Ok(Self::with_parts(term, config, VirtualBuffer::from_rows(rows), Some(file)))
    }

    fn with_parts(
        term: T,
        config: Config,
        buffer: VirtualBuffer,
        file: Option<FileBridge>,
    ) -> Self {
        Self {
            term,
            config,
            buffer,
            file,
            renderer: Renderer::new(),
            terminal_cursor: None,
            typed_ahead: VecDeque::new(),
            state: State::Running,
        }
    }

    // -- Accessors ------------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &VirtualBuffer {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub const fn term(&self) -> &T {
        &self.term
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Terminal cell the cursor was last sent to, `None` before the first
    /// frame.
    #[inline]
    #[must_use]
    pub const fn terminal_cursor(&self) -> Option<CursorPos> {
        self.terminal_cursor
    }

    /// Whether the backing file is still open.
    #[inline]
    #[must_use]
    pub const fn is_file_open(&self) -> bool {
        self.file.is_some()
    }

    // -- Running --------------------------------------------------------------

    /// Take over the terminal and edit until Ctrl+C (or end of input).
    ///
    /// On a clean exit the buffer has been written back and the file closed.
    /// The terminal is restored on every path.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: terminal setup or I/O, a failed cursor
    /// query, or a file write failure.
    pub fn run(&mut self) -> Result<Exit> {
        let result = self.term.enter().map_err(Error::from).and_then(|()| {
            log::info!("session running, {} rows", self.buffer.line_count());
            self.run_inner()
        });

        if result.is_err() {
            // Save edits before giving up; an untouched file is left as it was.
            if let Err(e) = self.close_file(self.buffer.is_modified()) {
                log::warn!("could not save after error: {e}");
            }
        }

        // Always restore, even if the loop errored.
        let restored = self.term.leave();

        let exit = result?;
        restored?;
        log::info!("session ended: {exit:?}");
        Ok(exit)
    }

    /// The loop proper, separated so `run` can clean up regardless of outcome.
    fn run_inner(&mut self) -> Result<Exit> {
        let mut chunk = vec![0u8; self.config.read_chunk.max(1)];

        loop {
            self.render()?;

            let exit = match self.next_event(&mut chunk)? {
                None => Some(Exit::EndOfInput),
                Some(event) => match self.step(event) {
                    State::Running => None,
                    State::Terminating => Some(Exit::Interrupted),
                },
            };

            if let Some(exit) = exit {
                self.state = State::Terminating;
                self.close_file(true)?;
                return Ok(exit);
            }
        }
    }

    /// The next key: typed-ahead first, then one blocking read. `None` at
    /// end of input.
    fn next_event(&mut self, chunk: &mut [u8]) -> Result<Option<InputEvent>> {
        if let Some(key) = self.typed_ahead.pop_front() {
            return Ok(Some(input::decode(&key)));
        }

        let n = self.term.read_partial(chunk)?;
        Ok((n > 0).then(|| input::decode(&chunk[..n])))
    }

    /// Apply one decoded event to the buffer and report the next state.
    pub fn step(&mut self, event: InputEvent) -> State {
        log::trace!("event {event:?}");

        match event {
            InputEvent::Printable(ch) => self.buffer.insert_char(ch),
            InputEvent::CursorMove(direction) => self.buffer.move_cursor(direction),
            InputEvent::Interrupt => self.state = State::Terminating,
            InputEvent::Unrecognized(bytes) => {
                log::debug!("{}", Error::MalformedInputSequence(bytes));
            }
        }

        self.state
    }

    /// Paint the current snapshot and record where the cursor went.
    ///
    /// With `verify_cursor`, asks the terminal where its cursor actually is
    /// and re-issues the move on disagreement.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or the cursor query fails.
    pub fn render(&mut self) -> Result<()> {
        let snapshot = self.buffer.snapshot();
        let target = self.renderer.render(&mut self.term, &snapshot)?;

        if self.config.verify_cursor {
            let report =
                query::query_cursor_position(&mut self.term, self.config.max_report_len)?;
            self.typed_ahead.extend(
                input::split_keys(&report.typed_ahead)
                    .into_iter()
                    .map(<[u8]>::to_vec),
            );

            let actual = report.pos;
            if actual != target {
                log::warn!("terminal cursor at {actual:?}, expected {target:?}; resyncing");
                self.renderer.place_cursor(&mut self.term, target)?;
            }
        }

        self.terminal_cursor = Some(target);
        Ok(())
    }

    /// Close the file, writing the buffer back first if `save`. A no-op
    /// once closed.
    fn close_file(&mut self, save: bool) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            if save {
                file.flush(&self.buffer.snapshot())?;
                self.buffer.mark_saved();
            }
            file.close()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
