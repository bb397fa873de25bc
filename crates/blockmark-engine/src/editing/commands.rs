use crate::{blocks::BlockId, tree::NodeId};

/// Input from the view layer.
///
/// Offsets are byte offsets: `raw` into a block's markdown source, `offset`
/// into a leaf's rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Focus `block` at the leaf covering raw offset `raw`.
    Focus { block: BlockId, raw: usize },
    /// A click at `offset` inside `leaf`. Ignored when the position cannot be mapped.
    Click {
        block: BlockId,
        leaf: NodeId,
        offset: usize,
    },
    /// The focused leaf's new text, with the caret at `offset`.
    SetText { text: String, offset: usize },
    /// Line break at `offset` in the focused leaf.
    Enter { offset: usize },
    /// Blur: reparse the focused block.
    Commit,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Backspace with the caret at the start of a leaf.
    Backspace,
    SelectionBegin {
        block: BlockId,
        leaf: NodeId,
        offset: usize,
    },
    SelectionEnd {
        block: BlockId,
        leaf: NodeId,
        offset: usize,
    },
    /// A click in the empty space below the last block.
    ClickBelowEnd,
}
