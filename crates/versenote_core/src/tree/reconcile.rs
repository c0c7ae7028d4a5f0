//! Reconciliation of a parsed document against the note store.
//!
//! # Responsibility
//! - Walk the outline post-order, resolving each note as unchanged (mirrors
//!   its stored record) or changed (re-derived from text plus children).
//! - Collect the minimal write set, children before parents.
//!
//! # Invariants
//! - A note is unchanged only if no child changed, every child is already
//!   linked in its stored `referenced_notes`, no linked child was updated
//!   after it, and its contracted text equals the stored text byte for byte.
//! - Stored `referenced_notes` is carried over on re-derivation, never reset.
//! - Store failures abort the pass; nothing is written here.

use crate::markup::extractor::{contract, extract_attributes, with_self_id, without_child_markers};
use crate::markup::grammar;
use crate::markup::segmenter::{segments, Segments};
use crate::model::note::{NoteId, NoteRecord};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoResult;
use crate::tree::ids::IdGenerator;
use crate::tree::inherit::inherit;
use crate::tree::node::NoteNode;
use log::{debug, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub root: NoteNode,
    /// Records to persist, children before parents.
    pub pending: Vec<NoteRecord>,
}

impl Reconciliation {
    /// True when the document matches the store exactly.
    pub fn is_unchanged(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Per-node resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Attributes copied verbatim from the stored record.
    Unchanged(NoteNode),
    /// Attributes re-derived; the node must be written.
    Changed(NoteNode),
}

impl Resolved {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn node(&self) -> &NoteNode {
        match self {
            Self::Unchanged(node) | Self::Changed(node) => node,
        }
    }

    pub fn into_node(self) -> NoteNode {
        match self {
            Self::Unchanged(node) | Self::Changed(node) => node,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeReason {
    New,
    Child,
    Linkage,
    LinkedUpdate,
    Text,
}

impl ChangeReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Child => "child",
            Self::Linkage => "linkage",
            Self::LinkedUpdate => "linked_update",
            Self::Text => "text",
        }
    }
}

/// Resolves outline text into a note tree using read-only store access.
pub struct Reconciler<'s, R: NoteRepository + ?Sized, G: IdGenerator> {
    store: &'s R,
    ids: G,
}

impl<'s, R: NoteRepository + ?Sized, G: IdGenerator> Reconciler<'s, R, G> {
    pub fn new(store: &'s R, ids: G) -> Self {
        Self { store, ids }
    }

    /// Resolves a whole document rooted at header level 0.
    pub fn reconcile(&mut self, document: &str) -> RepoResult<Reconciliation> {
        let mut pending = Vec::new();
        let root = self.resolve(document, 0, &mut pending)?.into_node();
        Ok(Reconciliation { root, pending })
    }

    /// Resolves one segment whose header depth is `level`.
    ///
    /// Changed nodes are appended to `pending` after all of their descendants.
    pub fn resolve(
        &mut self,
        text: &str,
        level: usize,
        pending: &mut Vec<NoteRecord>,
    ) -> RepoResult<Resolved> {
        let Segments { own, children } = segments(text, level);

        let mut any_child_changed = false;
        let mut child_nodes = Vec::with_capacity(children.len());
        for child_text in &children {
            let resolved = self.resolve(child_text, level + 1, pending)?;
            any_child_changed |= resolved.is_changed();
            child_nodes.push(resolved.into_node());
        }
        let inline_ids: Vec<NoteId> = child_nodes.iter().map(|child| child.id.clone()).collect();

        let (id, own, persisted) = match grammar::self_id(&own) {
            Some(id) => {
                let persisted = self.store.get_note(&id)?;
                (id, own, persisted)
            }
            None => {
                let id = self.ids.next_id();
                let own = with_self_id(&own, &id, level);
                (id, own, None)
            }
        };

        let mut linked = Vec::new();
        let mut dangling = Vec::new();
        for child_id in grammar::child_ids(&own) {
            if inline_ids.contains(&child_id) {
                continue;
            }
            match self.store.get_note(&child_id)? {
                Some(record) => linked.push(record),
                None => dangling.push(child_id),
            }
        }
        if !dangling.is_empty() {
            warn!(
                "event=note_resolve module=tree status=dangling_ref note_id={id} count={}",
                dangling.len()
            );
        }
        let own = without_child_markers(&own, &dangling);
        let raw_text = contract(&own, &inline_ids);

        let reason = match persisted.as_ref() {
            None => Some(ChangeReason::New),
            Some(_) if any_child_changed => Some(ChangeReason::Child),
            Some(record) => {
                let known = &record.attributes.referenced_notes;
                let newly_linked = inline_ids
                    .iter()
                    .chain(linked.iter().map(|child| &child.id))
                    .any(|child_id| !known.contains(child_id));
                let linked_updated = linked
                    .iter()
                    .any(|child| child.date_updated > record.date_updated);
                if newly_linked {
                    Some(ChangeReason::Linkage)
                } else if linked_updated {
                    Some(ChangeReason::LinkedUpdate)
                } else if record.raw_text != raw_text {
                    Some(ChangeReason::Text)
                } else {
                    None
                }
            }
        };

        let persisted = match (persisted, reason) {
            (Some(record), None) => {
                debug!("event=note_resolve module=tree status=unchanged note_id={id} level={level}");
                return Ok(Resolved::Unchanged(NoteNode {
                    id,
                    header_level: level,
                    own_text: own,
                    raw_text: record.raw_text,
                    attributes: record.attributes,
                    children: child_nodes,
                    date_created: record.date_created,
                    date_updated: record.date_updated,
                }));
            }
            (persisted, _) => persisted,
        };
        let reason = reason.unwrap_or(ChangeReason::New);

        // Own values first so inheritance can never override them.
        let mut attributes = extract_attributes(&own, level);
        if let Some(record) = persisted.as_ref() {
            attributes.referenced_notes = record.attributes.referenced_notes.clone();
        }
        for record in &linked {
            inherit(&mut attributes, &record.id, &record.attributes);
        }
        for child in &child_nodes {
            inherit(&mut attributes, &child.id, &child.attributes);
        }

        debug!(
            "event=note_resolve module=tree status=changed reason={} note_id={id} level={level}",
            reason.as_str()
        );
        let node = NoteNode {
            id,
            header_level: level,
            own_text: own,
            raw_text,
            attributes,
            children: child_nodes,
            date_created: persisted.as_ref().and_then(|record| record.date_created),
            date_updated: persisted.as_ref().and_then(|record| record.date_updated),
        };
        pending.push(node.to_record());
        Ok(Resolved::Changed(node))
    }
}
