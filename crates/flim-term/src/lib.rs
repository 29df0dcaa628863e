// SPDX-License-Identifier: MIT
//
// flim-term — Terminal engine for flim.
//
// Everything flim needs to own a terminal and nothing it doesn't: raw mode
// and the alternate screen with guaranteed restoration, a blocking partial
// read, single-write frame output, the handful of ANSI sequences a full
// repaint uses, the input decoder, and the cursor position query.
//
// The crate talks to the terminal directly through termios and ANSI escape
// sequences. The `Term` trait is the seam: the editor is written against
// it, and `ScriptedTerm` stands in for a real tty in tests. `ScriptedTerm`
// is compiled only for this crate's tests and under the `testing` feature,
// which dependents enable from their dev-dependencies.

pub mod ansi;
pub mod input;
pub mod output;
pub mod query;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod terminal;
