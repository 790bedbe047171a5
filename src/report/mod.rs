//! Run summary for the terminal.
//!
//! - [`terminal`] — colored summary line on stderr, plus a per-dependency table with `--verbose`.

pub mod terminal;
