use std::fmt;

use super::NodeKind;

/// Index of a node inside its [`super::NodeTree`] arena.
///
/// Only meaningful for the tree that produced it; ids are reassigned every
/// time a tree is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// One element of an editable tree.
///
/// Leaves carry `text` and no children; containers carry children and no
/// text. `parent` is a lookup link for navigation only, ownership runs
/// through the arena and `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) text: String,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) begin: usize,
}

impl Node {
    pub(crate) fn leaf(kind: NodeKind, text: String, begin: usize) -> Self {
        Self {
            kind,
            text,
            children: Vec::new(),
            index: 0,
            parent: None,
            begin,
        }
    }

    pub(crate) fn container(kind: NodeKind, begin: usize) -> Self {
        Self::leaf(kind, String::new(), begin)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Rendered text; empty for containers.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Raw offset in the block source where this node's content starts.
    pub fn begin(&self) -> usize {
        self.begin
    }
}
