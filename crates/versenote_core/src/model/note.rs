//! Note record model and upsert-time validation.
//!
//! # Responsibility
//! - Define the persisted note shape and its derived attribute bundle.
//! - Check required fields before any store write.
//!
//! # Invariants
//! - `referenced_notes` is append-only during inheritance; only store-side
//!   cascade deletes remove entries.
//! - `date_created`/`date_updated` are assigned by the store, never by parsing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque note identifier, unique across the store.
pub type NoteId = String;

/// Attributes extracted from note text or inherited from children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAttributes {
    /// Header title; only notes below the document root carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form summary from the `@theme` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub kv_tags: BTreeMap<String, String>,
    /// Opaque verse ids, e.g. `asv/John/1/1`.
    #[serde(default)]
    pub referenced_verses: BTreeSet<String>,
    /// Every direct and indirect child id, plus historical linkage.
    #[serde(default)]
    pub referenced_notes: BTreeSet<NoteId>,
}

/// Persisted note shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    /// Contracted note text: own content plus one child-id marker per child.
    pub raw_text: String,
    #[serde(flatten)]
    pub attributes: NoteAttributes,
    /// Unix epoch milliseconds, set on first insert only.
    #[serde(default)]
    pub date_created: Option<i64>,
    /// Unix epoch milliseconds, refreshed on every upsert.
    #[serde(default)]
    pub date_updated: Option<i64>,
}

impl NoteRecord {
    /// Creates an unsaved record with empty attributes.
    pub fn new(id: impl Into<NoteId>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            attributes: NoteAttributes::default(),
            date_created: None,
            date_updated: None,
        }
    }

    /// Checks fields required for persistence.
    ///
    /// Referential checks need store access and live in the repository.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::MissingId);
        }
        if self.raw_text.trim().is_empty() {
            return Err(NoteValidationError::MissingText(self.id.clone()));
        }
        match self.attributes.theme.as_deref() {
            Some(theme) if !theme.trim().is_empty() => {}
            _ => return Err(NoteValidationError::MissingTheme(self.id.clone())),
        }
        if self.attributes.tags.is_empty() {
            return Err(NoteValidationError::MissingTags(self.id.clone()));
        }
        Ok(())
    }
}

/// Upsert rejected before any write happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    MissingId,
    MissingText(NoteId),
    MissingTheme(NoteId),
    MissingTags(NoteId),
    /// `referenced_notes` names a note absent from the store.
    UnknownNoteReference { note_id: NoteId, target: NoteId },
    /// `referenced_verses` names a verse absent from the verse store.
    UnknownVerseReference { note_id: NoteId, verse_id: String },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "note id must not be empty"),
            Self::MissingText(id) => write!(f, "note {id} has no text"),
            Self::MissingTheme(id) => write!(f, "note {id} has no theme"),
            Self::MissingTags(id) => write!(f, "note {id} has no tags"),
            Self::UnknownNoteReference { note_id, target } => {
                write!(f, "note {note_id} references non-existing note {target}")
            }
            Self::UnknownVerseReference { note_id, verse_id } => {
                write!(f, "note {note_id} references non-existing verse {verse_id}")
            }
        }
    }
}

impl Error for NoteValidationError {}
