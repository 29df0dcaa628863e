//! Session configuration.
//!
//! flim has no config file. The defaults are what the editor is designed
//! around; a couple of environment variables exist for diagnosing odd
//! terminals:
//!
//! | Variable             | Effect                                   | Default |
//! |----------------------|------------------------------------------|---------|
//! | `FLIM_READ_CHUNK`    | Max bytes per raw read (1..=256)         | 256     |
//! | `FLIM_VERIFY_CURSOR` | Query the terminal cursor after renders  | off     |
//! | `FLIM_REPORT_LEN`    | Byte budget for one cursor report        | 32      |

use flim_term::input::MAX_CHUNK;
use flim_term::query::DEFAULT_MAX_REPORT_LEN;

/// Tunables for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Size of the buffer handed to each raw read.
    pub read_chunk: usize,

    /// After every render, ask the terminal where its cursor ended up and
    /// re-issue the move if it disagrees with the virtual cursor. Keys
    /// typed while the answer is pending are kept and applied afterwards.
    pub verify_cursor: bool,

    /// Byte budget for one cursor position report.
    pub max_report_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_chunk: MAX_CHUNK,
            verify_cursor: false,
            max_report_len: DEFAULT_MAX_REPORT_LEN,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparseable values are
    /// ignored with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("FLIM_READ_CHUNK") {
            match raw.trim().parse::<usize>() {
                Ok(n) => config.read_chunk = n.clamp(1, MAX_CHUNK),
                Err(_) => log::warn!("ignoring FLIM_READ_CHUNK={raw:?}"),
            }
        }

        if let Some(raw) = lookup("FLIM_VERIFY_CURSOR") {
            match parse_flag(&raw) {
                Some(on) => config.verify_cursor = on,
                None => log::warn!("ignoring FLIM_VERIFY_CURSOR={raw:?}"),
            }
        }

        if let Some(raw) = lookup("FLIM_REPORT_LEN") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n >= 6 => config.max_report_len = n,
                _ => log::warn!("ignoring FLIM_REPORT_LEN={raw:?}"),
            }
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
