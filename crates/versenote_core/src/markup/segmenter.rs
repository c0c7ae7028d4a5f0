//! Header-level segmentation of outline text.
//!
//! # Invariants
//! - `split(text, level)[0]` never contains a header of depth `level + 1`.
//! - Every child segment starts with its own header marker.
//! - Re-splitting a child segment at its own level reproduces the same
//!   deeper structure as splitting the whole text level by level.

use crate::markup::grammar::header_marker;

/// Own segment and immediate child segments of one outline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    /// Text owned by the node itself, trimmed.
    pub own: String,
    /// Child segments in document order, each starting with its header.
    pub children: Vec<String>,
}

/// Splits `text` at every header of depth `parent_level + 1`.
///
/// Returns `[own, child_1, .., child_n]`; a text without such headers yields
/// a single element.
pub fn split(text: &str, parent_level: usize) -> Vec<String> {
    let marker = header_marker(parent_level + 1);
    let boundary = format!("\n{marker}");
    // A header on the very first line also opens a child.
    let padded = format!("\n{}", text.trim_start_matches(['\n', '\r']));

    let mut pieces = padded.split(boundary.as_str());
    let own = pieces.next().unwrap_or_default().trim().to_string();
    let mut segments = vec![own];
    segments.extend(pieces.map(|piece| format!("{marker}{}", piece.trim())));
    segments
}

/// Structured form of [`split`].
pub fn segments(text: &str, parent_level: usize) -> Segments {
    let mut pieces = split(text, parent_level).into_iter();
    let own = pieces.next().unwrap_or_default();
    Segments {
        own,
        children: pieces.collect(),
    }
}
