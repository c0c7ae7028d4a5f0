//! Child-to-parent attribute inheritance.
//!
//! # Invariants
//! - A parent's own kv value is never overwritten; among children the first
//!   one to supply a key wins.
//! - Tags and references only grow.
//! - The child is read through a shared borrow and never aliased.

use crate::model::note::NoteAttributes;

/// Merges `child` (identified by `child_id`) into `parent`.
pub fn inherit(parent: &mut NoteAttributes, child_id: &str, child: &NoteAttributes) {
    for (key, value) in &child.kv_tags {
        parent
            .kv_tags
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
    parent.tags.extend(child.tags.iter().cloned());
    parent
        .referenced_verses
        .extend(child.referenced_verses.iter().cloned());
    parent
        .referenced_notes
        .extend(child.referenced_notes.iter().cloned());
    parent.referenced_notes.insert(child_id.to_string());
}

#[cfg(test)]
mod tests {
    use super::inherit;
    use crate::model::note::NoteAttributes;

    #[test]
    fn child_without_references_is_still_linked() {
        let mut parent = NoteAttributes::default();
        inherit(&mut parent, "child", &NoteAttributes::default());
        assert!(parent.referenced_notes.contains("child"));
    }

    #[test]
    fn theme_and_title_are_not_inherited() {
        let mut parent = NoteAttributes::default();
        let child = NoteAttributes {
            title: Some("child title".to_string()),
            theme: Some("child theme".to_string()),
            ..NoteAttributes::default()
        };
        inherit(&mut parent, "child", &child);
        assert_eq!(parent.title, None);
        assert_eq!(parent.theme, None);
    }
}
