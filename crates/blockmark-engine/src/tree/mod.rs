//! # Editable Node Tree
//!
//! One block's markdown line as a tree of editable leaves (plain text and
//! code spans) inside containers (heading, emphasis, strong, list, list
//! item). The tree round-trips: [`NodeTree::source`] re-serializes the
//! current leaf texts back into markdown.
//!
//! ## Lifecycle
//!
//! - [`NodeTree::construct`] tokenizes the line, annotates raw offsets and
//!   builds the arena.
//! - [`NodeTree::set_text`] edits a leaf in place while the user types.
//!   Nothing is reparsed, so node ids (and the focus resting on them) stay
//!   valid.
//! - On commit the owner serializes the tree and constructs a fresh one
//!   from the result, discarding the old tree wholesale.
//!
//! Nodes live in a `Vec` arena addressed by [`NodeId`]; `parent` links are
//! plain ids and never own anything.

mod error;
pub mod invariants;
pub mod kinds;
mod node;

pub use error::TreeError;
pub use kinds::NodeKind;
pub use node::{Node, NodeId};

use crate::parsing::{MappingError, TokenRecord, annotate, map_offset, tokenize, unmap_offset};

/// What to do with a line the tree cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyntaxPolicy {
    /// Fail construction with [`TreeError::Unsupported`].
    Strict,
    /// Edit the whole line as one plain text leaf.
    #[default]
    DegradeToText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    /// The source this tree was built from.
    source: String,
    degraded: bool,
}

impl NodeTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Builds the tree for one line of markdown.
    pub fn construct(source: &str) -> Result<Self, TreeError> {
        if source.contains(['\n', '\r']) {
            return Err(TreeError::MultiLine);
        }

        let mut tree = Self::bare(source);
        let mut tokens = tokenize(source);
        annotate(&mut tokens, 0);
        for token in &tokens {
            tree.build(Self::ROOT, token)?;
        }
        tree.ensure_leaf(Self::ROOT, 0);
        Ok(tree)
    }

    /// Like [`NodeTree::construct`], applying `policy` to unrepresentable syntax.
    ///
    /// Multi-line input is an error under either policy.
    pub fn construct_with(source: &str, policy: SyntaxPolicy) -> Result<Self, TreeError> {
        match Self::construct(source) {
            Err(
                err @ (TreeError::Unsupported { .. } | TreeError::LeafWithChildren { .. }),
            ) if policy == SyntaxPolicy::DegradeToText => {
                log::warn!("{err}; editing {source:?} as plain text");
                Ok(Self::plain(source))
            }
            result => result,
        }
    }

    /// A tree holding `source` verbatim in a single text leaf.
    pub fn plain(source: &str) -> Self {
        let mut tree = Self::bare(source);
        tree.attach(Self::ROOT, Node::leaf(NodeKind::Text, source.to_string(), 0));
        tree.degraded = true;
        tree
    }

    fn bare(source: &str) -> Self {
        Self {
            nodes: vec![Node::container(NodeKind::Root, 0)],
            source: source.to_string(),
            degraded: false,
        }
    }

    fn build(&mut self, parent: NodeId, token: &TokenRecord) -> Result<(), TreeError> {
        let kind = NodeKind::try_from(token.kind)?;
        let nested = token.children();

        if kind.is_leaf() {
            if !nested.is_empty() {
                return Err(TreeError::LeafWithChildren {
                    kind: token.kind.name(),
                });
            }
            let text = token.text.clone().unwrap_or_default();
            self.attach(parent, Node::leaf(kind, text, token.begin));
            return Ok(());
        }

        let id = self.attach(parent, Node::container(kind, token.begin));
        for child in nested {
            self.build(id, child)?;
        }
        self.ensure_leaf(id, token.begin);
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.index = self.nodes[parent.0].children.len();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Gives an empty container a single empty text leaf to hold a cursor.
    fn ensure_leaf(&mut self, container: NodeId, begin: usize) {
        if self.nodes[container.0].children.is_empty() {
            self.attach(container, Node::leaf(NodeKind::Text, String::new(), begin));
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    /// All node ids in arena order (the root first).
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The source this tree was constructed from. Leaf edits do not change it.
    pub fn committed_source(&self) -> &str {
        &self.source
    }

    /// True if this tree is the plain-text fallback for unsupported syntax.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    // ============ Serialization ============

    /// Markdown for the whole tree, reflecting current leaf texts.
    pub fn source(&self) -> String {
        self.render(Self::ROOT, None).0
    }

    /// Markdown for the subtree rooted at `id`.
    pub fn source_of(&self, id: NodeId) -> Result<String, TreeError> {
        self.node(id)?;
        Ok(self.render(id, None).0)
    }

    /// Markdown for the whole tree plus the raw position of a caret sitting
    /// at `offset` inside `leaf`.
    pub fn source_with_caret(
        &self,
        leaf: NodeId,
        offset: usize,
    ) -> Result<(String, usize), TreeError> {
        let node = self.node(leaf)?;
        if !node.is_leaf() {
            return Err(TreeError::NotALeaf(leaf));
        }
        let offset = floor_char_boundary(&node.text, offset);
        let (source, caret) = self.render(Self::ROOT, Some((leaf, offset)));
        let caret = caret.unwrap_or(source.len());
        Ok((source, caret))
    }

    fn render(&self, id: NodeId, caret: Option<(NodeId, usize)>) -> (String, Option<usize>) {
        let node = &self.nodes[id.0];
        let (inner, at) = if node.is_leaf() {
            let at = caret.and_then(|(leaf, offset)| (leaf == id).then_some(offset));
            (node.text.clone(), at)
        } else {
            let mut inner = String::new();
            let mut at = None;
            for &child in &node.children {
                let (rendered, child_at) = self.render(child, caret);
                if let Some(pos) = child_at {
                    at = Some(inner.len() + pos);
                }
                inner.push_str(&rendered);
            }
            (inner, at)
        };

        // Bare markers drop out with their empty content.
        if inner.is_empty() {
            return (String::new(), at.map(|_| 0));
        }
        let (open, close) = node.kind.delimiters(&inner);
        let at = at.map(|pos| open.len() + pos);
        (format!("{open}{inner}{close}"), at)
    }

    // ============ Editing ============

    /// Replaces a leaf's text. Does not reparse.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))?;
        if !node.is_leaf() {
            return Err(TreeError::NotALeaf(id));
        }
        node.text = text.into();
        Ok(())
    }

    // ============ Navigation ============

    /// The next leaf in document order, or `None` after the last leaf.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        let parent = node.parent?;
        let candidate = match self.nodes[parent.0].children.get(node.index + 1) {
            Some(&next) => next,
            None => self.right(parent)?,
        };
        Some(self.leftmost_leaf(candidate))
    }

    /// The previous leaf in document order, or `None` before the first leaf.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        let parent = node.parent?;
        let previous = node
            .index
            .checked_sub(1)
            .and_then(|i| self.nodes[parent.0].children.get(i));
        let candidate = match previous {
            Some(&prev) => prev,
            None => self.left(parent)?,
        };
        Some(self.rightmost_leaf(candidate))
    }

    pub fn first_leaf(&self) -> NodeId {
        self.leftmost_leaf(Self::ROOT)
    }

    pub fn last_leaf(&self) -> NodeId {
        self.rightmost_leaf(Self::ROOT)
    }

    /// Every leaf in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.is_leaf() {
                out.push(id);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn leftmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(&first) = self.nodes[id.0].children.first() {
            id = first;
        }
        id
    }

    fn rightmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(&last) = self.nodes[id.0].children.last() {
            id = last;
        }
        id
    }

    // ============ Offsets ============

    /// Raw offset in the committed source for `rendered_offset` inside `leaf`.
    pub fn raw_offset(&self, leaf: NodeId, rendered_offset: usize) -> Result<usize, MappingError> {
        let node = self
            .get(leaf)
            .filter(|node| node.is_leaf())
            .ok_or(MappingError::NoSuchLeaf)?;
        map_offset(&self.source, node.begin, &node.text, rendered_offset)
    }

    /// The leaf and rendered offset that best represent `raw_offset`.
    ///
    /// Positions inside syntax markers snap to the end of the preceding leaf,
    /// or the start of the first leaf when nothing precedes them.
    pub fn locate(&self, raw_offset: usize) -> (NodeId, usize) {
        let mut fallback = (self.first_leaf(), 0);
        for leaf in self.leaves() {
            let node = &self.nodes[leaf.0];
            if let Some(offset) = unmap_offset(&self.source, node.begin, &node.text, raw_offset) {
                return (leaf, offset);
            }
            if node.begin <= raw_offset {
                fallback = (leaf, node.text.len());
            }
        }
        fallback
    }

    // ============ Inspection ============

    /// One line per node, indented by depth; leaves show text and `begin`.
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        self.outline_into(Self::ROOT, 0, &mut lines);
        lines.join("\n")
    }

    fn outline_into(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        let node = &self.nodes[id.0];
        let indent = "  ".repeat(depth);
        if node.is_leaf() {
            lines.push(format!("{indent}{} {:?} @{}", node.kind, node.text, node.begin));
        } else {
            lines.push(format!("{indent}{}", node.kind));
            for &child in &node.children {
                self.outline_into(child, depth + 1, lines);
            }
        }
    }
}

/// Largest char boundary in `s` at or below `offset`.
pub(crate) fn floor_char_boundary(s: &str, offset: usize) -> usize {
    let mut offset = offset.min(s.len());
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
