use crossbeam_channel::Sender;

use crate::{
    blocks::{BlockError, BlockId, BlockList, Commit, line_ranges},
    tree::{NodeId, NodeTree, TreeError, floor_char_boundary},
};

use super::{Caret, Cmd, EditorEvent, Focus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("no leaf has focus")]
    NoFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// An editing session over one document.
pub struct Editor {
    blocks: BlockList,
    focus: Option<Focus>,
    /// Where the current selection started.
    anchor: Option<Caret>,
    events: Sender<EditorEvent>,
}

impl Editor {
    pub fn new(blocks: BlockList, events: Sender<EditorEvent>) -> Self {
        Self {
            blocks,
            focus: None,
            anchor: None,
            events,
        }
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    pub fn into_blocks(self) -> BlockList {
        self.blocks
    }

    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    pub fn selection_anchor(&self) -> Option<Caret> {
        self.anchor
    }

    /// Current text of the focused leaf, live edits included.
    pub fn focused_text(&self) -> Option<&str> {
        let focus = self.focus?;
        let tree = self.blocks.get(focus.block)?.tree()?;
        Some(tree.get(focus.leaf)?.text())
    }

    /// Applies one view command.
    ///
    /// Commands that cannot be placed (a click outside any leaf, movement
    /// past the document edges) are ignored. Commands that act on the focused
    /// leaf fail with [`EditorError::NoFocus`] when nothing is focused.
    pub fn apply(&mut self, cmd: Cmd) -> Result<(), EditorError> {
        log::trace!("apply {cmd:?}");
        match cmd {
            Cmd::Focus { block, raw } => self.focus_at(block, raw),
            Cmd::Click {
                block,
                leaf,
                offset,
            } => self.click(block, leaf, offset),
            Cmd::SetText { text, offset } => self.set_text(text, offset),
            Cmd::Enter { offset } => self.enter(offset),
            Cmd::Commit => match self.commit_focus()? {
                Some((_, caret)) => self.place(caret),
                None => Ok(()),
            },
            Cmd::MoveLeft => self.move_left(),
            Cmd::MoveRight => self.move_right(),
            Cmd::MoveUp => self.move_up(),
            Cmd::MoveDown => self.move_down(),
            Cmd::Backspace => self.backspace(),
            Cmd::SelectionBegin {
                block,
                leaf,
                offset,
            } => {
                if let Some(caret) = self.caret_at(block, leaf, offset)? {
                    self.anchor = Some(caret);
                }
                Ok(())
            }
            Cmd::SelectionEnd {
                block,
                leaf,
                offset,
            } => self.selection_end(block, leaf, offset),
            Cmd::ClickBelowEnd => self.click_below_end(),
        }
    }

    // ============ Focus ============

    fn emit(&self, event: EditorEvent) {
        if self.events.send(event).is_err() {
            log::trace!("no listener for editor events");
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = Some(focus);
        self.emit(EditorEvent::FocusMoved(focus));
    }

    fn focused(&self) -> Result<Focus, EditorError> {
        self.focus.ok_or(EditorError::NoFocus)
    }

    fn focused_tree(&self, focus: Focus) -> Result<&NodeTree, EditorError> {
        self.blocks
            .block(focus.block)?
            .tree()
            .ok_or(EditorError::NoFocus)
    }

    /// Focuses the leaf covering `caret`, clamped to the block's length.
    fn place(&mut self, caret: Caret) -> Result<(), EditorError> {
        let tree = self.blocks.activate(caret.block)?;
        let raw = caret.raw.min(tree.committed_source().len());
        let (leaf, offset) = tree.locate(raw);
        self.set_focus(Focus {
            block: caret.block,
            leaf,
            offset,
        });
        Ok(())
    }

    fn place_at_edge(&mut self, block: BlockId, edge: Edge) -> Result<(), EditorError> {
        let tree = self.blocks.activate(block)?;
        let focus = match edge {
            Edge::Start => Focus {
                block,
                leaf: tree.first_leaf(),
                offset: 0,
            },
            Edge::End => {
                let leaf = tree.last_leaf();
                Focus {
                    block,
                    leaf,
                    offset: tree.node(leaf)?.text().len(),
                }
            }
        };
        self.set_focus(focus);
        Ok(())
    }

    fn focus_at(&mut self, block: BlockId, raw: usize) -> Result<(), EditorError> {
        let target = match self.focus {
            Some(focus) if focus.block == block => {
                let (_, caret) = self.commit_block(block, raw)?;
                self.focus = None;
                caret
            }
            Some(_) => {
                self.commit_focus()?;
                Caret { block, raw }
            }
            None => Caret { block, raw },
        };
        self.place(target)
    }

    fn click(&mut self, block: BlockId, leaf: NodeId, offset: usize) -> Result<(), EditorError> {
        if let Some(focus) = self.focus
            && focus.block == block
        {
            let tree = self.blocks.activate(block)?;
            let valid = tree
                .get(leaf)
                .is_some_and(|node| node.is_leaf() && node.text().is_char_boundary(offset));
            if valid {
                self.set_focus(Focus {
                    block,
                    leaf,
                    offset,
                });
            } else {
                log::trace!("ignoring click at {leaf}:{offset} in {block}");
            }
            return Ok(());
        }

        let raw = match self.blocks.activate(block)?.raw_offset(leaf, offset) {
            Ok(raw) => raw,
            Err(err) => {
                log::trace!("ignoring click in {block}: {err}");
                return Ok(());
            }
        };
        self.commit_focus()?;
        self.place(Caret { block, raw })
    }

    // ============ Commit ============

    /// Commits `block`, translating `raw` (an offset into its serialized
    /// tree) into a caret on the block(s) that replace it.
    fn commit_block(&mut self, block: BlockId, raw: usize) -> Result<(Commit, Caret), EditorError> {
        let serialized = {
            let current = self.blocks.block(block)?;
            match current.tree() {
                Some(tree) => tree.source(),
                None => current.source().to_string(),
            }
        };

        let commit = self.blocks.commit(block)?;
        let caret = match &commit {
            Commit::Rebuilt(id) => {
                self.emit(EditorEvent::TreeRebuilt(*id));
                Caret { block: *id, raw }
            }
            Commit::Split(created) => {
                self.emit(EditorEvent::BlocksSplit {
                    removed: block,
                    created: created.clone(),
                });
                caret_after_split(&serialized, raw, created).ok_or(BlockError::EmptySplit)?
            }
        };
        Ok((commit, caret))
    }

    /// Commits the focused block and clears focus.
    ///
    /// A failed commit leaves focus and the live edit in place.
    fn commit_focus(&mut self) -> Result<Option<(Commit, Caret)>, EditorError> {
        let Some(focus) = self.focus else {
            return Ok(None);
        };
        let (_, raw) = self
            .focused_tree(focus)?
            .source_with_caret(focus.leaf, focus.offset)?;
        let committed = self.commit_block(focus.block, raw)?;
        self.focus = None;
        Ok(Some(committed))
    }

    // ============ Text ============

    fn set_text(&mut self, text: String, offset: usize) -> Result<(), EditorError> {
        let focus = self.focused()?;
        let offset = floor_char_boundary(&text, offset);
        let breaks = text.contains(['\n', '\r']);
        self.blocks
            .activate(focus.block)?
            .set_text(focus.leaf, text)?;
        self.focus = Some(Focus { offset, ..focus });

        if !breaks {
            return Ok(());
        }
        match self.commit_focus()? {
            Some((Commit::Split(created), _)) => match created.last() {
                Some(&last) => self.place(Caret {
                    block: last,
                    raw: 0,
                }),
                None => Ok(()),
            },
            Some((Commit::Rebuilt(_), caret)) => self.place(caret),
            None => Ok(()),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), EditorError> {
        let text = self.focused_text().ok_or(EditorError::NoFocus)?;
        let at = floor_char_boundary(text, offset);
        let mut updated = String::with_capacity(text.len() + 1);
        updated.push_str(&text[..at]);
        updated.push('\n');
        updated.push_str(&text[at..]);
        self.set_text(updated, at + 1)
    }

    fn backspace(&mut self) -> Result<(), EditorError> {
        let focus = self.focused()?;
        if focus.offset > 0 {
            return Ok(());
        }

        let left = self.focused_tree(focus)?.left(focus.leaf);
        if let Some(left) = left {
            let offset = self.focused_tree(focus)?.node(left)?.text().len();
            self.set_focus(Focus {
                leaf: left,
                offset,
                ..focus
            });
            return Ok(());
        }

        if self.blocks.block(focus.block)?.prev().is_none() {
            return Ok(());
        }
        let Some((_, caret)) = self.commit_focus()? else {
            return Ok(());
        };
        let Some(prev) = self.blocks.block(caret.block)?.prev() else {
            return self.place(caret);
        };
        let join = self.blocks.block(prev)?.source().len();
        match self.blocks.merge_with_previous(caret.block)? {
            Some(into) => {
                self.emit(EditorEvent::BlocksMerged {
                    removed: caret.block,
                    into,
                });
                self.place(Caret {
                    block: into,
                    raw: join,
                })
            }
            None => self.place(caret),
        }
    }

    // ============ Movement ============

    fn move_left(&mut self) -> Result<(), EditorError> {
        let focus = self.focused()?;
        let step = {
            let tree = self.focused_tree(focus)?;
            let before = tree.node(focus.leaf)?.text().get(..focus.offset);
            match before.and_then(|before| before.chars().next_back()) {
                Some(c) => Some(Focus {
                    offset: focus.offset - c.len_utf8(),
                    ..focus
                }),
                None => match tree.left(focus.leaf) {
                    Some(leaf) => Some(Focus {
                        leaf,
                        offset: tree.node(leaf)?.text().len(),
                        ..focus
                    }),
                    None => None,
                },
            }
        };
        if let Some(step) = step {
            self.set_focus(step);
            return Ok(());
        }

        let Some(prev) = self.blocks.block(focus.block)?.prev() else {
            return Ok(());
        };
        self.commit_focus()?;
        self.place_at_edge(prev, Edge::End)
    }

    fn move_right(&mut self) -> Result<(), EditorError> {
        let focus = self.focused()?;
        let step = {
            let tree = self.focused_tree(focus)?;
            let after = tree.node(focus.leaf)?.text().get(focus.offset..);
            match after.and_then(|after| after.chars().next()) {
                Some(c) => Some(Focus {
                    offset: focus.offset + c.len_utf8(),
                    ..focus
                }),
                None => tree.right(focus.leaf).map(|leaf| Focus {
                    leaf,
                    offset: 0,
                    ..focus
                }),
            }
        };
        if let Some(step) = step {
            self.set_focus(step);
            return Ok(());
        }

        let Some(next) = self.blocks.block(focus.block)?.next() else {
            return Ok(());
        };
        self.commit_focus()?;
        self.place_at_edge(next, Edge::Start)
    }

    fn move_up(&mut self) -> Result<(), EditorError> {
        let focus = self.focused()?;
        let Some(prev) = self.blocks.block(focus.block)?.prev() else {
            return Ok(());
        };
        self.move_to(focus, prev)
    }

    fn move_down(&mut self) -> Result<(), EditorError> {
        let focus = self.focused()?;
        let Some(next) = self.blocks.block(focus.block)?.next() else {
            return self.click_below_end();
        };
        self.move_to(focus, next)
    }

    /// Moves to the same raw column of another block.
    fn move_to(&mut self, focus: Focus, target: BlockId) -> Result<(), EditorError> {
        let (_, raw) = self
            .focused_tree(focus)?
            .source_with_caret(focus.leaf, focus.offset)?;
        self.commit_focus()?;
        self.place(Caret { block: target, raw })
    }

    fn click_below_end(&mut self) -> Result<(), EditorError> {
        self.commit_focus()?;
        let tail = self.blocks.tail();
        let source = self.blocks.block(tail)?.source().to_string();
        if source.is_empty() {
            return self.place(Caret { block: tail, raw: 0 });
        }

        let created = self.blocks.split(tail, &[source.as_str(), ""])?;
        self.emit(EditorEvent::BlocksSplit {
            removed: tail,
            created: created.clone(),
        });
        match created.last() {
            Some(&last) => self.place(Caret {
                block: last,
                raw: 0,
            }),
            None => Ok(()),
        }
    }

    // ============ Selection ============

    /// The caret for a rendered position, or `None` when it cannot be mapped.
    fn caret_at(
        &mut self,
        block: BlockId,
        leaf: NodeId,
        offset: usize,
    ) -> Result<Option<Caret>, EditorError> {
        let live = self.focus.is_some_and(|focus| focus.block == block);
        let tree = self.blocks.activate(block)?;
        let raw = if live {
            tree.source_with_caret(leaf, offset).map(|(_, raw)| raw).ok()
        } else {
            tree.raw_offset(leaf, offset)
                .inspect_err(|err| log::trace!("unmapped selection point in {block}: {err}"))
                .ok()
        };
        Ok(raw.map(|raw| Caret { block, raw }))
    }

    fn selection_end(
        &mut self,
        block: BlockId,
        leaf: NodeId,
        offset: usize,
    ) -> Result<(), EditorError> {
        let Some(end) = self.caret_at(block, leaf, offset)? else {
            return Ok(());
        };
        let Some(anchor) = self.anchor else {
            log::trace!("selection ended without a start");
            return Ok(());
        };
        let (Some(anchor_at), Some(end_at)) = (
            self.blocks.position(anchor.block),
            self.blocks.position(end.block),
        ) else {
            return Ok(());
        };

        let (start, end) = if (end_at, end.raw) < (anchor_at, anchor.raw) {
            (end, anchor)
        } else {
            (anchor, end)
        };
        self.emit(EditorEvent::SelectionChanged { start, end });
        Ok(())
    }
}

/// Finds which of the lines of `serialized` holds `raw`.
fn caret_after_split(serialized: &str, raw: usize, created: &[BlockId]) -> Option<Caret> {
    let mut lines = line_ranges(serialized).into_iter().zip(created).peekable();
    while let Some((line, &block)) = lines.next() {
        if raw <= line.end || lines.peek().is_none() {
            return Some(Caret {
                block,
                raw: raw.saturating_sub(line.start).min(line.len()),
            });
        }
    }
    None
}
