// SPDX-License-Identifier: MIT
//
// Terminal ownership: raw input, the alternate screen, and restoring both.
//
// Safety: termios, TIOCGWINSZ, isatty, and the raw fd read/write below are
// plain libc calls with no safe std equivalent. Unsafe blocks wrap single
// calls only.
#![allow(unsafe_code)]
//
// `Terminal` switches termios to raw mode and the screen to the alternate
// buffer, and undoes both on `leave()`, on drop, and from a panic hook. The
// hook writes a fixed byte string straight to fd 1 (no stdout lock), resets
// termios from a global copy, and only then lets the previous hook print the
// panic message onto the restored screen.
//
// The editor never talks to `Terminal` directly: it is written against the
// `Term` trait so the event loop can run over a scripted terminal in tests.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use bitflags::bitflags;

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Viewport size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width.
    pub cols: u16,
    /// Height.
    pub rows: u16,
}

impl Size {
    /// Fallback used when the OS can't tell us (pipes, CI).
    pub const DEFAULT: Self = Self { cols: 80, rows: 24 };
}

// ─── Modes ──────────────────────────────────────────────────────────────────

bitflags! {
    /// Terminal modes currently switched on by a [`Term`].
    ///
    /// Tracked individually so that a half-finished `enter()` restores
    /// exactly what it changed and nothing else.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modes: u8 {
        /// termios raw input (no echo, no line buffering, no signals).
        const RAW        = 0b0000_0001;
        /// DEC 1049 alternate screen buffer.
        const ALT_SCREEN = 0b0000_0010;
    }
}

// ─── Term ───────────────────────────────────────────────────────────────────

/// The terminal surface the editor drives.
///
/// Everything the editor needs from a terminal, and nothing more: scoped
/// mode switching, a blocking partial read, byte output, and dimensions.
pub trait Term {
    /// Switch to raw input and the alternate screen. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or terminal output fails.
    fn enter(&mut self) -> io::Result<()>;

    /// Restore the main screen and cooked input. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or terminal output fails.
    fn leave(&mut self) -> io::Result<()>;

    /// Modes currently switched on.
    fn modes(&self) -> Modes;

    /// Current dimensions.
    fn size(&self) -> Size;

    /// Block until at least one byte is available, then read up to
    /// `buf.len()` bytes. `Ok(0)` means end of input.
    ///
    /// No sequence-boundary guarantee: an escape sequence may arrive
    /// split across two calls, or two keys may arrive in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read_partial(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write raw bytes to the display.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying flush fails.
    fn flush(&mut self) -> io::Result<()>;

    /// Whether any mode is still switched on.
    #[inline]
    fn is_active(&self) -> bool {
        !self.modes().is_empty()
    }
}

// ─── OS Queries ───────────────────────────────────────────────────────────

/// Window size of stdout, via `TIOCGWINSZ`. `None` when stdout is not a
/// tty or reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a tty. Raw mode is skipped when it isn't.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Emergency Restore ──────────────────────────────────────────────────────

/// Cooked-mode termios, saved by `enter()` for the panic hook, which has no
/// access to the [`Terminal`] itself.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Put the saved termios back. Errors are ignored.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Bytes the panic hook writes: end sync, show cursor, main screen (last).
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?2026l\x1b[?25h\x1b[?1049l";

/// Guards against chaining the hook more than once.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Chain a hook that restores the terminal, then defers to the previous hook.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Raw write of [`EMERGENCY_RESTORE`] to fd 1. The stdout lock may be held
/// by the panicking thread, so it is not taken.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The process's controlling terminal, with RAII cleanup.
///
/// Nothing changes until [`enter`](Term::enter). Dropping the handle, or a
/// panic anywhere in the process, puts the terminal back.
///
/// # Example
///
/// ```no_run
/// use flim_term::terminal::{Term, Terminal};
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// term.write_bytes(b"hello")?;
/// term.flush()?;
/// // dropped here: main screen and cooked mode again
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    /// Cooked-mode settings to return to.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Size at construction time. flim does not scroll or reflow, so the
    /// initial viewport is the viewport.
    size: Size,

    modes: Modes,
}

impl Terminal {
    /// Handle on stdin/stdout, sized from the OS or 80×24. Switches no modes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(Size::DEFAULT),
            modes: Modes::empty(),
        }
    }

    // ── termios ─────────────────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // cfmakeraw equivalent. ISIG is off so Ctrl+C arrives as byte 3.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Term for Terminal {
    fn enter(&mut self) -> io::Result<()> {
        install_panic_hook();

        if !self.modes.contains(Modes::RAW) {
            self.enable_raw_mode()?;
            self.modes.insert(Modes::RAW);
        }

        if !self.modes.contains(Modes::ALT_SCREEN) {
            let mut lock = io::stdout().lock();
            ansi::enter_alt_screen(&mut lock)?;
            ansi::clear_screen(&mut lock)?;
            ansi::cursor_to(&mut lock, 0, 0)?;
            lock.flush()?;
            self.modes.insert(Modes::ALT_SCREEN);
        }

        log::debug!("terminal entered: {:?}, size {:?}", self.modes, self.size);
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        // Reverse order of `enter`: screen first, then input mode.
        if self.modes.contains(Modes::ALT_SCREEN) {
            let mut lock = io::stdout().lock();
            ansi::end_sync(&mut lock)?;
            ansi::cursor_show(&mut lock)?;
            ansi::exit_alt_screen(&mut lock)?;
            lock.flush()?;
            self.modes.remove(Modes::ALT_SCREEN);
        }

        if self.modes.contains(Modes::RAW) {
            self.disable_raw_mode()?;
            self.modes.remove(Modes::RAW);
        }

        log::debug!("terminal restored");
        Ok(())
    }

    #[inline]
    fn modes(&self) -> Modes {
        self.modes
    }

    #[inline]
    fn size(&self) -> Size {
        self.size
    }

    #[cfg(unix)]
    fn read_partial(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len())
            };
            if n >= 0 {
                #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    #[cfg(not(unix))]
    fn read_partial(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use std::io::Read;
        io::stdin().lock().read(buf)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
