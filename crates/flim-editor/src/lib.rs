//! # flim-editor — Editor core for flim
//!
//! Everything between the raw terminal and the file on disk:
//!
//! - **[`position`]** — `Position` (line, col), 0-indexed
//! - **[`buffer`]** — `VirtualBuffer`, the rope-backed grid of rows plus the
//!   virtual cursor, and its immutable `Snapshot`
//! - **[`file`]** — `FileBridge`, which loads the backing file once and
//!   writes it back once
//! - **[`render`]** — full-repaint projection of a snapshot onto a `Term`
//! - **[`session`]** — the read/decode/apply/render loop
//! - **[`config`]** — defaults and environment overrides
//! - **[`error`]** — the crate's `Error` type
//!
//! Terminal access goes through [`flim_term::terminal::Term`], so a session
//! runs equally against a real tty or a scripted one.

pub mod buffer;
pub mod config;
pub mod error;
pub mod file;
pub mod position;
pub mod render;
pub mod session;

pub use error::{Error, Result};
