//! Error type for the editor core.
//!
//! Input-level problems never show up here as failures: unrecognized bytes
//! are a no-op event, and [`Error::MalformedInputSequence`] exists only so
//! they can be described in the log. Everything else is fatal for the
//! session and reaches the user after the terminal has been restored.

use std::io;
use std::path::PathBuf;

use flim_term::query::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of command-line arguments.
    #[error("please supply exactly one filename as an argument")]
    InvalidArguments,

    /// The backing file can't be opened, created, read, or written.
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input bytes that don't form a known key. Logged, never returned.
    #[error("unrecognized input sequence {0:02x?}")]
    MalformedInputSequence(Vec<u8>),

    /// The cursor position query failed; the terminal cursor can't be
    /// trusted any more.
    #[error("terminal protocol error: {0}")]
    TerminalProtocol(#[from] QueryError),

    /// Raw mode, screen switching, or terminal I/O failed.
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}

impl Error {
    /// Wrap an I/O error on the backing file.
    pub fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
