//! Bible translation import from the bible-database JSON layout.
//!
//! # Responsibility
//! - Map numeric book ids to book names from the key file.
//! - Turn translation rows `[id, book, chapter, verse, text]` into verses.
//! - Turn cross-reference files (`{"v": "GEN 1 1", "r": {..}}` entries) into
//!   location-keyed references.
//!
//! # Invariants
//! - Import is all-or-nothing: a malformed row rejects the whole file.
//! - Re-importing the same translation replaces verse text in place.

use crate::model::verse::{verse_location, CrossReference, VerseRecord};
use crate::repo::verse_repo::VerseRepository;
use crate::repo::RepoError;
use log::info;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Verse import failure.
#[derive(Debug)]
pub enum VerseImportError {
    /// Input is not valid JSON of the expected shape.
    Json(serde_json::Error),
    /// A row names a book number missing from the key file.
    UnknownBook(u32),
    /// A cross-reference names a book abbreviation outside the known canon.
    UnknownBookAbbreviation(String),
    /// A cross-reference is not `ABR chapter verse`.
    MalformedReference(String),
    Repo(RepoError),
}

impl Display for VerseImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid verse json: {err}"),
            Self::UnknownBook(number) => write!(f, "unknown book number {number}"),
            Self::UnknownBookAbbreviation(abbreviation) => {
                write!(f, "unknown book abbreviation `{abbreviation}`")
            }
            Self::MalformedReference(reference) => {
                write!(f, "malformed verse reference `{reference}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VerseImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnknownBook(_)
            | Self::UnknownBookAbbreviation(_)
            | Self::MalformedReference(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for VerseImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<RepoError> for VerseImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    resultset: KeySet,
}

#[derive(Debug, Deserialize)]
struct KeySet {
    keys: Vec<BookKey>,
}

#[derive(Debug, Deserialize)]
struct BookKey {
    b: u32,
    n: String,
}

#[derive(Debug, Deserialize)]
struct RowFile {
    resultset: RowSet,
}

#[derive(Debug, Deserialize)]
struct RowSet {
    row: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    field: (u64, u32, u32, u32, String),
}

#[derive(Debug, Deserialize)]
struct CrossReferenceEntry {
    v: String,
    #[serde(default)]
    r: BTreeMap<String, String>,
}

const BOOK_ABBREVIATIONS: &[(&str, &str)] = &[
    ("GEN", "Genesis"),
    ("EXO", "Exodus"),
    ("LEV", "Leviticus"),
    ("NUM", "Numbers"),
    ("DEU", "Deuteronomy"),
    ("JOS", "Joshua"),
    ("JDG", "Judges"),
    ("RUT", "Ruth"),
    ("1SA", "1 Samuel"),
    ("2SA", "2 Samuel"),
    ("1KI", "1 Kings"),
    ("2KI", "2 Kings"),
    ("1CH", "1 Chronicles"),
    ("2CH", "2 Chronicles"),
    ("EZR", "Ezra"),
    ("NEH", "Nehemiah"),
    ("EST", "Esther"),
    ("JOB", "Job"),
    ("PSA", "Psalms"),
    ("PRO", "Proverbs"),
    ("ECC", "Ecclesiastes"),
    ("SOS", "Song of Solomon"),
    ("ISA", "Isaiah"),
    ("JER", "Jeremiah"),
    ("LAM", "Lamentations"),
    ("EZE", "Ezekiel"),
    ("DAN", "Daniel"),
    ("HOS", "Hosea"),
    ("JOE", "Joel"),
    ("AMO", "Amos"),
    ("OBA", "Obadiah"),
    ("JON", "Jonah"),
    ("MIC", "Micah"),
    ("NAH", "Nahum"),
    ("HAB", "Habakkuk"),
    ("ZEP", "Zephaniah"),
    ("HAG", "Haggai"),
    ("ZEC", "Zechariah"),
    ("MAL", "Malachi"),
    ("MAT", "Matthew"),
    ("MAR", "Mark"),
    ("LUK", "Luke"),
    ("JOH", "John"),
    ("ACT", "Acts"),
    ("ROM", "Romans"),
    ("1CO", "1 Corinthians"),
    ("2CO", "2 Corinthians"),
    ("GAL", "Galatians"),
    ("EPH", "Ephesians"),
    ("PHP", "Philippians"),
    ("COL", "Colossians"),
    ("1TH", "1 Thessalonians"),
    ("2TH", "2 Thessalonians"),
    ("1TI", "1 Timothy"),
    ("2TI", "2 Timothy"),
    ("TIT", "Titus"),
    ("PHM", "Philemon"),
    ("HEB", "Hebrews"),
    ("JAM", "James"),
    ("1PE", "1 Peter"),
    ("2PE", "2 Peter"),
    ("1JO", "1 John"),
    ("2JO", "2 John"),
    ("3JO", "3 John"),
    ("JDE", "Jude"),
    ("REV", "Revelation"),
];

/// Full book name for a three-character cross-reference abbreviation.
pub fn book_for_abbreviation(abbreviation: &str) -> Option<&'static str> {
    BOOK_ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == abbreviation)
        .map(|(_, book)| *book)
}

/// Parses one cross-reference file.
///
/// Targets keep the numeric order of their keys in the file.
pub fn parse_cross_references(json: &str) -> Result<Vec<CrossReference>, VerseImportError> {
    let entries: BTreeMap<String, CrossReferenceEntry> = serde_json::from_str(json)?;
    entries
        .into_values()
        .map(|entry| -> Result<CrossReference, VerseImportError> {
            let mut keyed: Vec<(String, String)> = entry.r.into_iter().collect();
            keyed.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));
            let targets = keyed
                .iter()
                .map(|(_, reference)| parse_reference(reference))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CrossReference {
                location: parse_reference(&entry.v)?,
                targets,
            })
        })
        .collect()
}

/// Turns `JOH 3 16` into the location `John/3/16`.
fn parse_reference(reference: &str) -> Result<String, VerseImportError> {
    let malformed = || VerseImportError::MalformedReference(reference.to_string());
    let mut parts = reference.split_whitespace();
    let (Some(abbreviation), Some(chapter), Some(verse), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    let book = book_for_abbreviation(abbreviation)
        .ok_or_else(|| VerseImportError::UnknownBookAbbreviation(abbreviation.to_string()))?;
    let chapter = chapter.parse().map_err(|_| malformed())?;
    let verse = verse.parse().map_err(|_| malformed())?;
    Ok(verse_location(book, chapter, verse))
}

/// Parses and stores one cross-reference file; returns the number of
/// source locations written.
pub fn import_cross_references<R: VerseRepository>(
    repo: &mut R,
    json: &str,
) -> Result<usize, VerseImportError> {
    let references = parse_cross_references(json)?;
    let written = repo.insert_cross_references(&references)?;
    info!("event=cross_ref_import module=service status=ok count={written}");
    Ok(written)
}

/// Parses both JSON files into verse records for `translation`.
pub fn parse_translation(
    translation: &str,
    keys_json: &str,
    rows_json: &str,
) -> Result<Vec<VerseRecord>, VerseImportError> {
    let keys: KeyFile = serde_json::from_str(keys_json)?;
    let books: HashMap<u32, String> = keys
        .resultset
        .keys
        .into_iter()
        .map(|key| (key.b, key.n))
        .collect();

    let rows: RowFile = serde_json::from_str(rows_json)?;
    rows.resultset
        .row
        .into_iter()
        .map(|row| {
            let (_, book, chapter, verse, text) = row.field;
            let book = books
                .get(&book)
                .cloned()
                .ok_or(VerseImportError::UnknownBook(book))?;
            Ok(VerseRecord {
                translation: translation.to_string(),
                book,
                chapter,
                verse,
                text,
            })
        })
        .collect()
}

/// Parses and stores one translation; returns the number of verses written.
pub fn import_translation<R: VerseRepository>(
    repo: &mut R,
    translation: &str,
    keys_json: &str,
    rows_json: &str,
) -> Result<usize, VerseImportError> {
    let verses = parse_translation(translation, keys_json, rows_json)?;
    let written = repo.insert_verses(&verses)?;
    info!("event=verse_import module=service status=ok translation={translation} count={written}");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{book_for_abbreviation, parse_cross_references, parse_translation, VerseImportError};

    const KEYS: &str = r#"{"resultset":{"keys":[{"b":43,"n":"John","t":"NT","g":5}]}}"#;

    #[test]
    fn rows_map_book_numbers_to_names() {
        let rows = r#"{"resultset":{"row":[{"field":[43001001,43,1,1,"In the beginning was the Word"]}]}}"#;
        let verses = parse_translation("asv", KEYS, rows).unwrap();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].id(), "asv/John/1/1");
    }

    #[test]
    fn unknown_book_rejects_import() {
        let rows = r#"{"resultset":{"row":[{"field":[1001001,1,1,1,"In the beginning"]}]}}"#;
        let err = parse_translation("asv", KEYS, rows).unwrap_err();
        assert!(matches!(err, VerseImportError::UnknownBook(1)));
    }

    #[test]
    fn cross_references_expand_abbreviations_in_key_order() {
        let json = r#"{"1":{"v":"JOH 3 16","r":{"10":"ROM 5 8","2":"1JO 4 9"}},"2":{"v":"GEN 1 1"}}"#;
        let references = parse_cross_references(json).unwrap();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].location, "John/3/16");
        assert_eq!(references[0].targets, vec!["1 John/4/9", "Romans/5/8"]);
        assert_eq!(references[1].location, "Genesis/1/1");
        assert!(references[1].targets.is_empty());
    }

    #[test]
    fn malformed_cross_references_are_rejected() {
        assert!(matches!(
            parse_cross_references(r#"{"1":{"v":"XYZ 1 1"}}"#).unwrap_err(),
            VerseImportError::UnknownBookAbbreviation(ref abbreviation) if abbreviation == "XYZ"
        ));
        assert!(matches!(
            parse_cross_references(r#"{"1":{"v":"JOH 3"}}"#).unwrap_err(),
            VerseImportError::MalformedReference(_)
        ));
        assert_eq!(book_for_abbreviation("SOS"), Some("Song of Solomon"));
    }
}
