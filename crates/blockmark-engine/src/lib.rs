pub mod blocks;
pub mod editing;
pub mod parsing;
pub mod tree;

// Re-export key types for easier usage
pub use blocks::{Block, BlockError, BlockId, BlockList, Commit, IdAllocator};
pub use editing::{Caret, Cmd, Editor, EditorError, EditorEvent, Focus};
pub use parsing::{MappingError, map_offset, unmap_offset};
pub use tree::{Node, NodeId, NodeKind, NodeTree, SyntaxPolicy, TreeError};
