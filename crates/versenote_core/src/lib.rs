//! Core of versenote: hierarchical note extraction, inheritance and
//! reconciliation against a SQLite note store.
//!
//! Outline text flows through the segmenter and field extractor into a
//! [`NoteNode`] tree; the [`Reconciler`] decides which notes changed and the
//! [`DocumentService`] persists exactly those.

pub mod db;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use logging::{default_log_level, init_logging, logging_status};
pub use markup::grammar::{parse_tag_line, TagLine, TagSet};
pub use markup::segmenter::{segments, split, Segments};
pub use model::note::{NoteAttributes, NoteId, NoteRecord, NoteValidationError};
pub use model::verse::{verse_id, verse_location, CrossReference, VerseRecord};
pub use repo::note_repo::{NoteListQuery, NoteRepository, SqliteNoteRepository};
pub use repo::verse_repo::{SqliteVerseRepository, VerseRepository};
pub use repo::{RepoError, RepoResult};
pub use service::document_service::{DocumentService, DocumentServiceError, IngestReport};
pub use service::verse_import::{
    book_for_abbreviation, import_cross_references, import_translation, parse_cross_references,
    parse_translation, VerseImportError,
};
pub use tree::ids::{IdGenerator, UuidIdGenerator};
pub use tree::inherit::inherit;
pub use tree::node::NoteNode;
pub use tree::reconcile::{Reconciler, Reconciliation, Resolved};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
