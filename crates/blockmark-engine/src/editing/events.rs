use crate::{blocks::BlockId, tree::NodeId};

/// Where the caret rests: a leaf of an active block and a rendered offset in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub block: BlockId,
    pub leaf: NodeId,
    pub offset: usize,
}

/// A position that survives tree rebuilds: a block and a raw offset in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caret {
    pub block: BlockId,
    pub raw: usize,
}

/// Notifications for the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    FocusMoved(Focus),
    /// `removed` was replaced by `created`, in order.
    BlocksSplit {
        removed: BlockId,
        created: Vec<BlockId>,
    },
    BlocksMerged {
        removed: BlockId,
        into: BlockId,
    },
    /// The block's tree was rebuilt; its node ids changed.
    TreeRebuilt(BlockId),
    /// A selection in document order.
    SelectionChanged { start: Caret, end: Caret },
}
