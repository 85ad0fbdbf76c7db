//! Arena-backed document tree
//!
//! Nodes live in flat vectors indexed by [`NodeId`]. A child's owner is
//! recorded in a reverse index exactly once, at the moment the child is
//! attached during [`Tree::assemble`]; there is no API to mutate structure
//! afterwards.

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeKind};

/// Index of a node within a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node ID (always 0)
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An immutable, fully assembled document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    kinds: Vec<NodeKind>,
    children: Vec<Vec<NodeId>>,
    parents: Vec<Option<NodeId>>,
}

impl Tree {
    /// Flatten the top-level nodes of a document under a new root.
    ///
    /// Source order is preserved: ids are handed out in pre-order, so a
    /// node's id is always greater than its parent's.
    pub fn assemble(nodes: Vec<Node>) -> Tree {
        let mut tree = Tree {
            kinds: vec![NodeKind::Root],
            children: vec![Vec::new()],
            parents: vec![None],
        };
        for node in nodes {
            tree.attach(NodeId::ROOT, node);
        }
        tree
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.kinds.push(node.kind);
        self.children.push(Vec::new());
        self.parents.push(Some(parent));
        self.children[parent.index()].push(id);
        for child in node.children {
            self.attach(id, child);
        }
        id
    }

    /// The root node ID
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the document has no content besides the root
    pub fn is_empty(&self) -> bool {
        self.kinds.len() == 1
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.index()]
    }

    /// Ordered children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.index()]
    }

    /// Owner of a node; `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    /// Closest ancestor whose kind satisfies `predicate`
    pub fn ancestor_where(
        &self,
        id: NodeId,
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if predicate(self.kind(candidate)) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Iterate over all nodes in document order
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![NodeId::ROOT],
        }
    }

    /// Concatenated text of a node's subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.subtree(id) {
            match self.kind(node) {
                NodeKind::Text(text) | NodeKind::CodeSpan(text) | NodeKind::MathSpan(text) => {
                    out.push_str(text)
                }
                NodeKind::LineBreak => out.push(' '),
                _ => {}
            }
        }
        out
    }

    /// Iterate over a node and its descendants in document order
    pub fn subtree(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }
}

/// Depth-first, left-to-right iterator over node ids
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}
