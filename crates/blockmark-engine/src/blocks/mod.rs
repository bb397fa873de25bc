//! # Block List
//!
//! The document as an ordered chain of single-line blocks. Blocks live in
//! an id-keyed map and link to their neighbours by id; the list tracks
//! `head` and `tail` and is never empty.
//!
//! Structural edits replace blocks rather than mutating them in place:
//! [`BlockList::split`] retires the split block's id and hands out fresh ids
//! for every replacement, and [`BlockList::merge_with_previous`] folds a block
//! into its predecessor. Ids come from the [`IdAllocator`] handed to the list
//! at construction, so two lists never share id state.

mod id;

pub use id::{BlockId, IdAllocator};

use std::{collections::HashMap, ops::Range};

use crate::tree::{NodeTree, SyntaxPolicy, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("{0} is not in the list")]
    UnknownBlock(BlockId),
    #[error("split needs at least one replacement text")]
    EmptySplit,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// One line of the document.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    source: String,
    prev: Option<BlockId>,
    next: Option<BlockId>,
    /// Present while the block is being edited.
    tree: Option<NodeTree>,
}

impl Block {
    fn new(id: BlockId, source: String, prev: Option<BlockId>, next: Option<BlockId>) -> Self {
        Self {
            id,
            source,
            prev,
            next,
            tree: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Committed markdown source. Live leaf edits are not reflected until commit.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn prev(&self) -> Option<BlockId> {
        self.prev
    }

    pub fn next(&self) -> Option<BlockId> {
        self.next
    }

    pub fn tree(&self) -> Option<&NodeTree> {
        self.tree.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.tree.is_some()
    }
}

/// Outcome of [`BlockList::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// The source was stored and the tree rebuilt under the same id.
    Rebuilt(BlockId),
    /// The source held line breaks; the block was replaced by one block per line.
    Split(Vec<BlockId>),
}

#[derive(Debug)]
pub struct BlockList {
    blocks: HashMap<BlockId, Block>,
    head: BlockId,
    tail: BlockId,
    ids: IdAllocator,
    policy: SyntaxPolicy,
}

impl BlockList {
    /// A list holding a single empty block.
    pub fn new(ids: IdAllocator) -> Self {
        Self::from_markdown("", ids)
    }

    /// One block per line of `text`, breaking at `\n`, `\r\n` or a lone `\r`.
    pub fn from_markdown(text: &str, ids: IdAllocator) -> Self {
        let lines = lines(text);

        let mut list = Self {
            blocks: HashMap::with_capacity(lines.len()),
            head: BlockId::UNSET,
            tail: BlockId::UNSET,
            ids,
            policy: SyntaxPolicy::default(),
        };
        let created = list.chain(&lines, None, None);
        if let (Some(&head), Some(&tail)) = (created.first(), created.last()) {
            list.head = head;
            list.tail = tail;
        }
        list
    }

    /// How trees built by this list treat syntax they cannot represent.
    pub fn with_policy(mut self, policy: SyntaxPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SyntaxPolicy {
        self.policy
    }

    // ============ Lookup ============

    pub fn head(&self) -> BlockId {
        self.head
    }

    pub fn tail(&self) -> BlockId {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a list keeps at least one block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, BlockError> {
        self.get(id).ok_or(BlockError::UnknownBlock(id))
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, BlockError> {
        self.blocks.get_mut(&id).ok_or(BlockError::UnknownBlock(id))
    }

    /// Zero-based position of `id` counting from the head.
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.iter().position(|block| block.id == id)
    }

    /// Blocks from head to tail.
    pub fn iter(&self) -> Blocks<'_> {
        Blocks {
            list: self,
            next: Some(self.head),
        }
    }

    pub fn for_each(&self, visit: impl FnMut(&Block)) {
        self.iter().for_each(visit);
    }

    /// The document: block sources joined by `\n`.
    pub fn to_markdown(&self) -> String {
        self.iter()
            .map(Block::source)
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ============ Structure ============

    /// Replaces block `id` with one new block per entry of `texts`.
    ///
    /// The replaced block's id is retired; the returned ids are in order.
    pub fn split<S: AsRef<str>>(
        &mut self,
        id: BlockId,
        texts: &[S],
    ) -> Result<Vec<BlockId>, BlockError> {
        if texts.is_empty() {
            return Err(BlockError::EmptySplit);
        }
        let old = self.blocks.remove(&id).ok_or(BlockError::UnknownBlock(id))?;

        let created = self.chain(texts, old.prev, old.next);
        let (Some(&first), Some(&last)) = (created.first(), created.last()) else {
            return Err(BlockError::EmptySplit);
        };

        match old.prev {
            Some(prev) => self.block_mut(prev)?.next = Some(first),
            None => self.head = first,
        }
        match old.next {
            Some(next) => self.block_mut(next)?.prev = Some(last),
            None => self.tail = last,
        }

        log::debug!("split {id} into {} block(s)", created.len());
        Ok(created)
    }

    /// Allocates and links a run of blocks between `prev` and `next`.
    ///
    /// Only the new blocks' links are set; the neighbours are left to the caller.
    fn chain<S: AsRef<str>>(
        &mut self,
        texts: &[S],
        prev: Option<BlockId>,
        next: Option<BlockId>,
    ) -> Vec<BlockId> {
        let created: Vec<BlockId> = texts.iter().map(|_| self.ids.next_id()).collect();
        for (i, (text, &id)) in texts.iter().zip(&created).enumerate() {
            let before = if i == 0 { prev } else { Some(created[i - 1]) };
            let after = created.get(i + 1).copied().or(next);
            let block = Block::new(id, text.as_ref().to_string(), before, after);
            self.blocks.insert(id, block);
        }
        created
    }

    /// Appends block `id`'s source onto the previous block and removes `id`.
    ///
    /// Returns the block merged into, or `None` when `id` is the head.
    pub fn merge_with_previous(&mut self, id: BlockId) -> Result<Option<BlockId>, BlockError> {
        let block = self.block(id)?;
        let Some(prev_id) = block.prev else {
            return Ok(None);
        };
        let prev = self.block(prev_id)?;
        let merged = format!("{}{}", prev.source, block.source);
        let tree = match prev.tree {
            Some(_) => Some(NodeTree::construct_with(&merged, self.policy)?),
            None => None,
        };

        let removed = self.blocks.remove(&id).ok_or(BlockError::UnknownBlock(id))?;
        let prev = self.block_mut(prev_id)?;
        prev.source = merged;
        prev.next = removed.next;
        if tree.is_some() {
            prev.tree = tree;
        }
        match removed.next {
            Some(next) => self.block_mut(next)?.prev = Some(prev_id),
            None => self.tail = prev_id,
        }

        log::debug!("merged {id} into {prev_id}");
        Ok(Some(prev_id))
    }

    /// Inserts a block holding `text` before `id`; returns the new block's id.
    ///
    /// `id` itself is re-created under a fresh id.
    pub fn insert_before(&mut self, id: BlockId, text: &str) -> Result<BlockId, BlockError> {
        let old = self.block(id)?.source.clone();
        match self.split(id, &[text, old.as_str()])?.as_slice() {
            [inserted, _] => Ok(*inserted),
            _ => Err(BlockError::EmptySplit),
        }
    }

    /// Inserts a block holding `text` after `id`; returns the new block's id.
    ///
    /// `id` itself is re-created under a fresh id.
    pub fn insert_after(&mut self, id: BlockId, text: &str) -> Result<BlockId, BlockError> {
        let old = self.block(id)?.source.clone();
        match self.split(id, &[old.as_str(), text])?.as_slice() {
            [_, inserted] => Ok(*inserted),
            _ => Err(BlockError::EmptySplit),
        }
    }

    // ============ Trees ============

    /// Replaces a block's source, rebuilding its tree if it has one.
    ///
    /// `text` must be a single line.
    pub fn set_source(&mut self, id: BlockId, text: &str) -> Result<(), BlockError> {
        if text.contains(['\n', '\r']) {
            return Err(TreeError::MultiLine.into());
        }
        let policy = self.policy;
        let block = self.block_mut(id)?;
        if block.tree.is_some() {
            block.tree = Some(NodeTree::construct_with(text, policy)?);
        }
        block.source = text.to_string();
        Ok(())
    }

    /// The block's tree, built from its source if it has none yet.
    pub fn activate(&mut self, id: BlockId) -> Result<&mut NodeTree, BlockError> {
        let policy = self.policy;
        let block = self.block_mut(id)?;
        let tree = match block.tree.take() {
            Some(tree) => tree,
            None => {
                log::debug!("building tree for {id}");
                NodeTree::construct_with(&block.source, policy)?
            }
        };
        Ok(block.tree.insert(tree))
    }

    /// Drops the block's tree. Uncommitted leaf edits are discarded.
    pub fn deactivate(&mut self, id: BlockId) -> Result<(), BlockError> {
        self.block_mut(id)?.tree = None;
        Ok(())
    }

    /// Serializes the block's tree and stores the result as its source.
    ///
    /// A result spanning several lines splits the block, one block per
    /// line; otherwise the tree is rebuilt from the stored source.
    pub fn commit(&mut self, id: BlockId) -> Result<Commit, BlockError> {
        let block = self.block(id)?;
        let serialized = match &block.tree {
            Some(tree) => tree.source(),
            None => block.source.clone(),
        };

        let lines = lines(&serialized);
        if lines.len() > 1 {
            return self.split(id, &lines).map(Commit::Split);
        }

        let tree = NodeTree::construct_with(&serialized, self.policy)?;
        let block = self.block_mut(id)?;
        block.source = serialized;
        block.tree = Some(tree);
        log::debug!("committed {id}");
        Ok(Commit::Rebuilt(id))
    }
}

/// Byte ranges of the lines of `text`, breaking at `\n`, `\r\n` or a lone `\r`.
pub(crate) fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let width = match bytes[i] {
            b'\n' => 1,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            b'\r' => 1,
            _ => {
                i += 1;
                continue;
            }
        };
        ranges.push(start..i);
        i += width;
        start = i;
    }
    ranges.push(start..bytes.len());
    ranges
}

fn lines(text: &str) -> Vec<&str> {
    line_ranges(text)
        .into_iter()
        .map(|range| &text[range])
        .collect()
}

/// Head-to-tail iterator over a [`BlockList`].
pub struct Blocks<'a> {
    list: &'a BlockList,
    next: Option<BlockId>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.list.get(self.next?)?;
        self.next = block.next;
        Some(block)
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = Blocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sources(list: &BlockList) -> Vec<String> {
        list.iter().map(|b| b.source().to_string()).collect()
    }

    /// Links agree in both directions and cover every stored block.
    fn assert_linked(list: &BlockList) {
        let forward: Vec<BlockId> = list.iter().map(Block::id).collect();
        assert_eq!(forward.len(), list.len(), "unreachable blocks");
        assert_eq!(forward.first(), Some(&list.head()));
        assert_eq!(forward.last(), Some(&list.tail()));

        let mut backward = Vec::new();
        let mut at = Some(list.tail());
        while let Some(id) = at {
            backward.push(id);
            at = list.get(id).unwrap().prev();
        }
        backward.reverse();
        assert_eq!(backward, forward);
    }

    fn abc() -> BlockList {
        BlockList::from_markdown("a\nb\nc", IdAllocator::new())
    }

    #[test]
    fn new_list_holds_one_empty_block() {
        let list = BlockList::new(IdAllocator::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list.head(), list.tail());
        assert_eq!(sources(&list), vec![""]);
        assert_linked(&list);
    }

    #[rstest]
    #[case("a\nb\nc", vec!["a", "b", "c"])]
    #[case("a\r\nb", vec!["a", "b"])]
    #[case("a\rb\r", vec!["a", "b", ""])]
    #[case("trailing\n", vec!["trailing", ""])]
    #[case("", vec![""])]
    fn from_markdown_makes_one_block_per_line(
        #[case] text: &str,
        #[case] expected: Vec<&str>,
    ) {
        let list = BlockList::from_markdown(text, IdAllocator::new());
        assert_eq!(sources(&list), expected);
        assert_linked(&list);
    }

    #[test]
    fn split_single_block_into_three() {
        let mut list = BlockList::new(IdAllocator::new());
        let only = list.head();
        let created = list.split(only, &["a", "b", "c"]).unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(list.len(), 3);
        assert_eq!(list.head(), created[0]);
        assert_eq!(list.tail(), created[2]);
        assert!(!list.contains(only));
        assert_eq!(sources(&list), vec!["a", "b", "c"]);
        assert_linked(&list);
    }

    #[test]
    fn split_in_the_middle_keeps_neighbours() {
        let mut list = abc();
        let ids: Vec<BlockId> = list.iter().map(Block::id).collect();
        let &[a, b, c] = ids.as_slice() else {
            panic!("expected three blocks");
        };

        let created = list.split(b, &["b1", "b2"]).unwrap();
        assert_eq!(sources(&list), vec!["a", "b1", "b2", "c"]);
        assert_eq!(list.head(), a);
        assert_eq!(list.tail(), c);
        assert_eq!(list.get(a).unwrap().next(), Some(created[0]));
        assert_eq!(list.get(c).unwrap().prev(), Some(created[1]));
        assert_linked(&list);
    }

    #[test]
    fn split_rejects_empty_texts_and_unknown_ids() {
        let mut list = abc();
        let empty: [&str; 0] = [];
        assert_eq!(list.split(list.head(), &empty), Err(BlockError::EmptySplit));

        let retired = list.head();
        list.split(retired, &["x"]).unwrap();
        assert_eq!(
            list.split(retired, &["y"]),
            Err(BlockError::UnknownBlock(retired))
        );
        assert_eq!(sources(&list), vec!["x", "b", "c"]);
    }

    #[test]
    fn merge_undoes_a_split() {
        let mut list = BlockList::from_markdown("hello world", IdAllocator::new());
        let created = list.split(list.head(), &["hello ", "world"]).unwrap();

        let into = list.merge_with_previous(created[1]).unwrap();
        assert_eq!(into, Some(created[0]));
        assert_eq!(list.len(), 1);
        assert_eq!(list.head(), list.tail());
        assert_eq!(list.to_markdown(), "hello world");
        assert_linked(&list);
    }

    #[test]
    fn split_at_the_join_point_undoes_a_merge() {
        let mut list = BlockList::from_markdown("hello \nworld", IdAllocator::new());
        let into = list.merge_with_previous(list.tail()).unwrap().unwrap();
        assert_eq!(list.to_markdown(), "hello world");

        let merged = list.get(into).unwrap().source().to_string();
        let (left, right) = merged.split_at("hello ".len());
        list.split(into, &[left, right]).unwrap();
        assert_eq!(sources(&list), vec!["hello ", "world"]);
        assert_linked(&list);
    }

    #[test]
    fn merge_tail_moves_tail() {
        let mut list = abc();
        let b = list.get(list.tail()).unwrap().prev().unwrap();
        assert_eq!(list.merge_with_previous(list.tail()), Ok(Some(b)));
        assert_eq!(list.tail(), b);
        assert_eq!(sources(&list), vec!["a", "bc"]);
        assert_linked(&list);
    }

    #[test]
    fn merge_on_head_is_a_no_op() {
        let mut list = abc();
        assert_eq!(list.merge_with_previous(list.head()), Ok(None));
        assert_eq!(sources(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_rebuilds_an_active_previous_tree() {
        let mut list = BlockList::from_markdown("**bold**\n tail", IdAllocator::new());
        let head = list.head();
        list.activate(head).unwrap();
        list.merge_with_previous(list.tail()).unwrap();

        let tree = list.get(head).unwrap().tree().unwrap();
        assert_eq!(tree.committed_source(), "**bold** tail");
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn insert_before_and_after_return_the_inserted_block() {
        let mut list = BlockList::from_markdown("mid", IdAllocator::new());
        let before = list.insert_before(list.head(), "first").unwrap();
        assert_eq!(list.head(), before);

        let after = list.insert_after(list.tail(), "last").unwrap();
        assert_eq!(list.tail(), after);
        assert_eq!(sources(&list), vec!["first", "mid", "last"]);
        assert_eq!(list.position(after), Some(2));
        assert_linked(&list);
    }

    #[test]
    fn for_each_visits_in_order() {
        let list = abc();
        let mut seen = String::new();
        list.for_each(|block| seen.push_str(block.source()));
        assert_eq!(seen, "abc");
        assert_eq!((&list).into_iter().count(), 3);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut list = abc();
        let stranger = BlockId(999);
        assert_eq!(
            list.block(stranger).err(),
            Some(BlockError::UnknownBlock(stranger))
        );
        assert_eq!(
            list.merge_with_previous(stranger),
            Err(BlockError::UnknownBlock(stranger))
        );
        assert_eq!(
            list.insert_after(stranger, "x"),
            Err(BlockError::UnknownBlock(stranger))
        );
        assert_eq!(list.position(stranger), None);
    }

    #[test]
    fn separate_allocators_hand_out_independent_ids() {
        let first = BlockList::from_markdown("a\nb", IdAllocator::new());
        let second = BlockList::from_markdown("c", IdAllocator::new());
        assert_eq!(first.head(), second.head());
        assert_eq!(first.get(first.head()).unwrap().source(), "a");
        assert_eq!(second.get(second.head()).unwrap().source(), "c");
    }

    #[test]
    fn commit_rebuilds_after_a_leaf_edit() {
        let mut list = BlockList::from_markdown("plain", IdAllocator::new());
        let id = list.head();
        let tree = list.activate(id).unwrap();
        tree.set_text(tree.first_leaf(), "now *em*").unwrap();

        assert_eq!(list.commit(id), Ok(Commit::Rebuilt(id)));
        let block = list.get(id).unwrap();
        assert_eq!(block.source(), "now *em*");
        assert_eq!(block.tree().unwrap().leaves().len(), 2);
    }

    #[test]
    fn commit_with_a_line_break_splits() {
        let mut list = BlockList::from_markdown("# title", IdAllocator::new());
        let id = list.head();
        let tree = list.activate(id).unwrap();
        tree.set_text(tree.first_leaf(), "ti\ntle").unwrap();

        let Commit::Split(created) = list.commit(id).unwrap() else {
            panic!("expected a split");
        };
        assert_eq!(created.len(), 2);
        assert_eq!(sources(&list), vec!["# ti", "tle"]);
        assert_linked(&list);
    }

    #[test]
    fn commit_treats_a_lone_carriage_return_as_a_line_break() {
        let mut list = BlockList::from_markdown("ab\ncd", IdAllocator::new());
        let id = list.head();
        let tree = list.activate(id).unwrap();
        tree.set_text(tree.first_leaf(), "a\rb").unwrap();

        let Commit::Split(created) = list.commit(id).unwrap() else {
            panic!("expected a split");
        };
        assert_eq!(created.len(), 2);
        assert_eq!(sources(&list), vec!["a", "b", "cd"]);
        assert_linked(&list);
    }

    #[test]
    fn emptied_leaf_commits_to_empty_source() {
        let mut list = BlockList::from_markdown("**bold**", IdAllocator::new());
        let id = list.head();
        let tree = list.activate(id).unwrap();
        tree.set_text(tree.first_leaf(), "").unwrap();

        list.commit(id).unwrap();
        assert_eq!(list.to_markdown(), "");
    }

    #[test]
    fn activation_follows_the_syntax_policy() {
        let mut strict = BlockList::from_markdown("[x](y)", IdAllocator::new())
            .with_policy(SyntaxPolicy::Strict);
        let head = strict.head();
        assert_eq!(
            strict.activate(head).err(),
            Some(BlockError::Tree(TreeError::Unsupported { kind: "link" }))
        );

        let mut lenient = BlockList::from_markdown("[x](y)", IdAllocator::new());
        let head = lenient.head();
        assert!(lenient.activate(head).unwrap().is_degraded());
        lenient.deactivate(head).unwrap();
        assert!(!lenient.get(head).unwrap().is_active());
    }

    #[test]
    fn set_source_rebuilds_active_trees() {
        let mut list = abc();
        let head = list.head();
        list.activate(head).unwrap();
        list.set_source(head, "`code`").unwrap();
        let tree = list.get(head).unwrap().tree().unwrap();
        assert_eq!(tree.source(), "`code`");
        assert_eq!(
            list.set_source(head, "two\nlines"),
            Err(BlockError::Tree(TreeError::MultiLine))
        );
    }

    #[rstest]
    #[case("two\nlines")]
    #[case("carriage\rreturn")]
    fn set_source_rejects_line_breaks_on_inactive_blocks(#[case] text: &str) {
        let mut list = abc();
        let head = list.head();
        assert_eq!(
            list.set_source(head, text),
            Err(BlockError::Tree(TreeError::MultiLine))
        );
        assert_eq!(sources(&list), vec!["a", "b", "c"]);
        assert!(list.activate(head).is_ok());
    }

    #[test]
    fn line_ranges_break_at_every_line_ending() {
        assert_eq!(line_ranges("a\r\nbc\rd\n"), vec![0..1, 3..5, 6..7, 8..8]);
        assert_eq!(line_ranges(""), vec![0..0]);
    }
}
