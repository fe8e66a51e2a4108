#![forbid(unsafe_code)]

//! Node sets for canonicalization and transforms.
//!
//! A `NodeSet` is the XPath-style selection a reference URI produces and the
//! enveloped-signature transform narrows. Canonicalization renders only the
//! nodes it contains.

use crate::document::{Document, NodeId, NodeKind};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// Every node in the document, comments included.
    pub fn all(doc: &Document) -> Self {
        Self::tree_with_comments(doc.root(), doc)
    }

    /// Every node except comments. This is what `URI=""` selects.
    pub fn all_without_comments(doc: &Document) -> Self {
        Self::tree_without_comments(doc.root(), doc)
    }

    /// `root` and everything below it, comments excluded.
    pub fn tree_without_comments(root: NodeId, doc: &Document) -> Self {
        Self {
            nodes: doc
                .descendants(root)
                .filter(|&id| !matches!(doc.node_kind(id), Some(NodeKind::Comment(_))))
                .collect(),
        }
    }

    pub fn tree_with_comments(root: NodeId, doc: &Document) -> Self {
        Self {
            nodes: doc.descendants(root).collect(),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Drop `root` and all of its descendants.
    pub fn remove_subtree(&mut self, root: NodeId, doc: &Document) {
        for id in doc.descendants(root) {
            self.nodes.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
