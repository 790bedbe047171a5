//! License string handling.
//!
//! - [`normalize`] — turns raw registry metadata into a single-line license or nothing.
//! - [`comment`] — decides the trailing `  # <license>` suffix for a manifest line.

pub mod comment;
pub mod normalize;
