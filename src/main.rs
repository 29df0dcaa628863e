// SPDX-License-Identifier: MIT
//
// flim — a minimal terminal text editor.
//
// This is the main binary that wires the two crates together:
//
//   flim-term   → raw mode, alternate screen, escape codes, input decoding
//   flim-editor → virtual buffer, file bridge, renderer, session loop
//
// Usage: `flim <file>`. Type to insert, arrow keys to move, Ctrl+C to save
// and quit. The file is created if it doesn't exist.
//
// Exit status: 0 after a clean save, 1 on a runtime error (reported after
// the terminal is restored), 2 on bad arguments.
//
// Logging goes nowhere unless FLIM_LOG names a file; the terminal belongs to
// the editor, so stderr is never used while a session runs. The filter comes
// from RUST_LOG and defaults to `debug`.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::process;

use flim_editor::config::Config;
use flim_editor::error::Error;
use flim_editor::session::Session;
use flim_term::terminal::Terminal;

// ─── Arguments ──────────────────────────────────────────────────────────────

/// Extract the single file path from the arguments (program name excluded).
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<PathBuf, Error> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(path), None) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(Error::InvalidArguments),
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

fn init_logging() {
    let Some(target) = env::var_os("FLIM_LOG") else {
        return;
    };

    match File::create(&target) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("flim: cannot open log file {}: {e}", target.display()),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let path = parse_args(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("flim: {e}");
        eprintln!("usage: flim <file>");
        process::exit(2);
    });

    init_logging();
    let config = Config::from_env();
    log::debug!("starting on {} with {config:?}", path.display());

    let result =
        Session::open(Terminal::new(), &path, config).and_then(|mut session| session.run());

    match result {
        Ok(exit) => log::info!("clean exit ({exit:?})"),
        Err(e) => {
            log::error!("{e}");
            eprintln!("flim: {e}");
            process::exit(1);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
