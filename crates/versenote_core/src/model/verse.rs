//! Verse record model.
//!
//! Verse ids are opaque to the parsing core; this shape only exists so the
//! store can answer existence checks and the CLI can print verse text.

use serde::{Deserialize, Serialize};

/// One verse of one translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub translation: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl VerseRecord {
    /// Stable id in the `translation/book/chapter/verse` layout.
    pub fn id(&self) -> String {
        verse_id(&self.translation, &self.book, self.chapter, self.verse)
    }
}

/// Builds a verse id from its parts.
pub fn verse_id(translation: &str, book: &str, chapter: u32, verse: u32) -> String {
    format!("{translation}/{}", verse_location(book, chapter, verse))
}

/// Translation-independent `book/chapter/verse` location.
pub fn verse_location(book: &str, chapter: u32, verse: u32) -> String {
    format!("{book}/{chapter}/{verse}")
}

/// Cross-references of one verse location, in source order.
///
/// Locations carry no translation; callers resolve them against the
/// translation they are reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub location: String,
    pub targets: Vec<String>,
}
