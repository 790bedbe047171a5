//! Manifest line handling.
//!
//! - [`extract`] — recovers `(package, version)` from a pip or conda dependency line.
//! - [`line`] — routes each line by manifest syntax and appends the license comment.

pub mod extract;
pub mod line;

use crate::models::ProcessedLine;

/// Join processed lines back into file content, keeping a trailing newline
/// only when the input had one.
pub fn render(lines: &[ProcessedLine], trailing_newline: bool) -> String {
    let mut output = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if trailing_newline && !lines.is_empty() {
        output.push('\n');
    }

    output
}
