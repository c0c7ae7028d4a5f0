//! Note tree node.

use crate::model::note::{NoteAttributes, NoteId, NoteRecord};

/// One note of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteNode {
    pub id: NoteId,
    /// 0 for the document root, +1 per nesting level.
    pub header_level: usize,
    /// Own segment as written in the document, with the self-id line ensured.
    pub own_text: String,
    /// Contracted text as persisted.
    pub raw_text: String,
    pub attributes: NoteAttributes,
    /// Inline children in document order.
    pub children: Vec<NoteNode>,
    pub date_created: Option<i64>,
    pub date_updated: Option<i64>,
}

impl NoteNode {
    /// Snapshot of this node in persisted shape.
    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            id: self.id.clone(),
            raw_text: self.raw_text.clone(),
            attributes: self.attributes.clone(),
            date_created: self.date_created,
            date_updated: self.date_updated,
        }
    }

    /// Ids of direct inline children in document order.
    pub fn child_ids(&self) -> Vec<NoteId> {
        self.children.iter().map(|child| child.id.clone()).collect()
    }

    /// Finds a node by id in this subtree.
    pub fn find(&self, id: &str) -> Option<&NoteNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Visits this subtree children first.
    pub fn walk_post_order<'a>(&'a self, visit: &mut impl FnMut(&'a NoteNode)) {
        for child in &self.children {
            child.walk_post_order(visit);
        }
        visit(self);
    }

    /// Mutable post-order visit.
    pub fn walk_post_order_mut(&mut self, visit: &mut impl FnMut(&mut NoteNode)) {
        for child in &mut self.children {
            child.walk_post_order_mut(visit);
        }
        visit(self);
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NoteNode::node_count).sum::<usize>()
    }

    /// Rebuilds the full document text, including every self-id line.
    ///
    /// Writing this back to the source file makes later passes reuse the
    /// same ids instead of generating new ones.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.children.len() + 1);
        if !self.own_text.is_empty() {
            parts.push(self.own_text.clone());
        }
        parts.extend(self.children.iter().map(NoteNode::render));
        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::NoteNode;
    use crate::model::note::NoteAttributes;

    fn leaf(id: &str, level: usize, own: &str) -> NoteNode {
        NoteNode {
            id: id.to_string(),
            header_level: level,
            own_text: own.to_string(),
            raw_text: own.to_string(),
            attributes: NoteAttributes::default(),
            children: Vec::new(),
            date_created: None,
            date_updated: None,
        }
    }

    #[test]
    fn render_joins_own_text_and_children() {
        let mut root = leaf("r", 0, "@_idr@\nroot");
        root.children.push(leaf("a", 1, "# @ A\n@_ida@"));
        assert_eq!(root.render(), "@_idr@\nroot\n\n# @ A\n@_ida@");
        assert_eq!(root.node_count(), 2);
    }

    #[test]
    fn post_order_visits_children_first() {
        let mut root = leaf("r", 0, "");
        let mut a = leaf("a", 1, "");
        a.children.push(leaf("b", 2, ""));
        root.children.push(a);

        let mut order = Vec::new();
        root.walk_post_order(&mut |node: &NoteNode| order.push(node.id.clone()));
        assert_eq!(order, vec!["b", "a", "r"]);
        assert!(root.find("b").is_some());
    }
}
