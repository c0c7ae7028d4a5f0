//! Document ingestion use-case service.
//!
//! # Responsibility
//! - Run one reconciliation pass over an outline document.
//! - Persist exactly the changed notes, as one batch, children first.
//! - Expose note read/delete entry points for callers of the same store.
//!
//! # Invariants
//! - An unchanged document performs zero store writes.
//! - Validation failure in any note rejects the whole document.

use crate::model::note::{NoteId, NoteRecord, NoteValidationError};
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::repo::RepoError;
use crate::tree::ids::IdGenerator;
use crate::tree::node::NoteNode;
use crate::tree::reconcile::Reconciler;
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for document use-cases.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Document contains no text at all.
    EmptyDocument,
    /// A note of the document failed upsert validation.
    Validation(NoteValidationError),
    /// Store failure; the pass was aborted.
    Store(RepoError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "document is empty"),
            Self::Validation(err) => write!(f, "document rejected: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyDocument => None,
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for DocumentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Resolved tree with store timestamps filled in.
    pub root: NoteNode,
    /// Ids written in this pass, children before parents.
    pub written: Vec<NoteId>,
}

impl IngestReport {
    /// Document text with every note's self-id line in place.
    pub fn annotated_document(&self) -> String {
        self.root.render()
    }
}

/// Document service facade over a note store and an id source.
pub struct DocumentService<R: NoteRepository, G: IdGenerator> {
    repo: R,
    ids: G,
}

impl<R: NoteRepository, G: IdGenerator> DocumentService<R, G> {
    pub fn new(repo: R, ids: G) -> Self {
        Self { repo, ids }
    }

    /// Resolves `document` against the store and persists changed notes.
    pub fn ingest(&mut self, document: &str) -> Result<IngestReport, DocumentServiceError> {
        let started_at = Instant::now();
        let normalized = document.replace("\r\n", "\n");
        if normalized.trim().is_empty() {
            return Err(DocumentServiceError::EmptyDocument);
        }

        let outcome = self.ingest_normalized(&normalized);
        match &outcome {
            Ok(report) => info!(
                "event=document_ingest module=service status=ok notes={} written={} duration_ms={}",
                report.root.node_count(),
                report.written.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=document_ingest module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        outcome
    }

    fn ingest_normalized(&mut self, document: &str) -> Result<IngestReport, DocumentServiceError> {
        let reconciliation = Reconciler::new(&self.repo, &mut self.ids).reconcile(document)?;
        let mut root = reconciliation.root;
        if reconciliation.pending.is_empty() {
            return Ok(IngestReport {
                root,
                written: Vec::new(),
            });
        }

        let stored = self.repo.upsert_notes(&reconciliation.pending)?;
        let written = stored.iter().map(|record| record.id.clone()).collect();
        let by_id: BTreeMap<&str, &NoteRecord> = stored
            .iter()
            .map(|record| (record.id.as_str(), record))
            .collect();
        root.walk_post_order_mut(&mut |node: &mut NoteNode| {
            if let Some(record) = by_id.get(node.id.as_str()) {
                node.date_created = record.date_created;
                node.date_updated = record.date_updated;
            }
        });

        Ok(IngestReport { root, written })
    }

    /// Resolves without writing; useful to preview the write set.
    pub fn preview(&mut self, document: &str) -> Result<Vec<NoteId>, DocumentServiceError> {
        let normalized = document.replace("\r\n", "\n");
        let reconciliation = Reconciler::new(&self.repo, &mut self.ids).reconcile(&normalized)?;
        Ok(reconciliation
            .pending
            .into_iter()
            .map(|record| record.id)
            .collect())
    }

    pub fn get_note(&self, id: &str) -> Result<Option<NoteRecord>, DocumentServiceError> {
        Ok(self.repo.get_note(id)?)
    }

    /// Deletes one note and purges it from every other note's references.
    pub fn delete_note(&mut self, id: &str) -> Result<bool, DocumentServiceError> {
        Ok(self.repo.delete_note(id)?)
    }

    pub fn list_notes(&self, query: &NoteListQuery) -> Result<Vec<NoteRecord>, DocumentServiceError> {
        Ok(self.repo.list_notes(query)?)
    }

    /// Borrows the underlying store.
    pub fn repo(&self) -> &R {
        &self.repo
    }
}
