/*!
 * # Editor Session
 *
 * The glue a view layer drives. An [`Editor`] owns the [`BlockList`], the
 * current [`Focus`] and the selection anchor. The view sends [`Cmd`]s and
 * listens for [`EditorEvent`]s on the channel it handed to
 * [`Editor::new`].
 *
 * ## Commit-on-blur
 *
 * Typing ([`Cmd::SetText`]) only rewrites the focused leaf. The block's
 * source and tree ids stay put, so focus stays valid while the user types.
 * The tree is re-serialized and rebuilt when focus leaves the block, on an
 * explicit [`Cmd::Commit`], or as soon as the text contains a line break
 * (the block is then split, one block per line).
 *
 * ## Carets
 *
 * Across a commit node ids are not stable, so positions are carried as a
 * [`Caret`]: a block plus a raw offset into its markdown. After the rebuild
 * the caret is resolved back to a leaf with [`NodeTree::locate`].
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockmark_engine::{BlockList, Cmd, Editor, EditorEvent, IdAllocator};
 *
 * let (tx, rx) = crossbeam_channel::unbounded();
 * let blocks = BlockList::from_markdown("# Hello", IdAllocator::new());
 * let head = blocks.head();
 * let mut editor = Editor::new(blocks, tx);
 *
 * editor.apply(Cmd::Focus { block: head, raw: 7 }).unwrap();
 * editor.apply(Cmd::Enter { offset: 5 }).unwrap();
 *
 * assert_eq!(editor.blocks().to_markdown(), "# Hello\n");
 * assert!(rx.try_iter().any(|e| matches!(e, EditorEvent::BlocksSplit { .. })));
 * ```
 *
 * [`BlockList`]: crate::blocks::BlockList
 * [`NodeTree::locate`]: crate::tree::NodeTree::locate
 */

pub mod commands;
pub mod editor;
pub mod events;

pub use commands::Cmd;
pub use editor::{Editor, EditorError};
pub use events::{Caret, EditorEvent, Focus};
