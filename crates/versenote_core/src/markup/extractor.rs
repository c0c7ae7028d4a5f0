//! Field extraction from an own segment.

use crate::markup::grammar::{self, child_id_line, self_id_line};
use crate::model::note::NoteAttributes;
use std::collections::BTreeSet;

/// Derives theme, title, tags and verse references from `own`.
///
/// `referenced_notes` is left empty: linkage comes from inheritance only.
pub fn extract_attributes(own: &str, header_level: usize) -> NoteAttributes {
    let parsed_tags = grammar::tags(own);
    NoteAttributes {
        title: grammar::title(own, header_level),
        theme: grammar::theme(own),
        tags: parsed_tags.tags,
        kv_tags: parsed_tags.kv_tags,
        referenced_verses: grammar::verse_refs(own),
        referenced_notes: BTreeSet::new(),
    }
}

/// Inserts a self-id line into `own`.
///
/// The line goes right after the header line for nested notes and first for
/// the document root.
pub fn with_self_id(own: &str, id: &str, header_level: usize) -> String {
    let id_line = self_id_line(id);
    if own.is_empty() {
        return id_line;
    }
    if header_level == 0 {
        return format!("{id_line}\n{own}");
    }
    match own.split_once('\n') {
        Some((header, rest)) => format!("{header}\n{id_line}\n{rest}"),
        None => format!("{own}\n{id_line}"),
    }
}

/// Removes child-id lines naming any of `ids`.
pub fn without_child_markers(own: &str, ids: &[String]) -> String {
    if ids.is_empty() {
        return own.to_string();
    }
    let dropped: BTreeSet<String> = ids.iter().map(|id| child_id_line(id)).collect();
    own.lines()
        .filter(|line| !dropped.contains(line.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contracts a note: own text plus one child-id line per inline child.
///
/// Children already named by a marker in `own` are not repeated.
pub fn contract(own: &str, child_ids: &[String]) -> String {
    let present: BTreeSet<String> = grammar::child_ids(own).into_iter().collect();
    let markers: Vec<String> = child_ids
        .iter()
        .filter(|id| !present.contains(*id))
        .map(|id| child_id_line(id))
        .collect();

    match (own.is_empty(), markers.is_empty()) {
        (_, true) => own.to_string(),
        (true, false) => markers.join("\n"),
        (false, false) => format!("{own}\n\n{}", markers.join("\n")),
    }
}
