use blockmark_engine::{BlockList, Cmd, Editor, EditorEvent, IdAllocator, NodeTree};
use crossbeam_channel::{Receiver, unbounded};
use pretty_assertions::assert_eq;

fn session(markdown: &str) -> (Editor, Receiver<EditorEvent>) {
    let (tx, rx) = unbounded();
    let blocks = BlockList::from_markdown(markdown, IdAllocator::new());
    (Editor::new(blocks, tx), rx)
}

fn caret(editor: &Editor) -> (String, usize) {
    (
        editor.focused_text().unwrap().to_string(),
        editor.focus().unwrap().offset,
    )
}

#[test]
fn type_break_and_join_lines() {
    let (mut editor, rx) = session("# Title\nbody");
    let head = editor.blocks().head();

    editor.apply(Cmd::Focus { block: head, raw: 7 }).unwrap();
    assert_eq!(caret(&editor), ("Title".to_string(), 5));

    editor
        .apply(Cmd::SetText {
            text: "Title!".into(),
            offset: 6,
        })
        .unwrap();
    assert_eq!(editor.blocks().to_markdown(), "# Title\nbody");

    editor.apply(Cmd::Enter { offset: 6 }).unwrap();
    assert_eq!(editor.blocks().to_markdown(), "# Title!\n\nbody");
    assert_eq!(caret(&editor), (String::new(), 0));

    editor
        .apply(Cmd::SetText {
            text: "more".into(),
            offset: 4,
        })
        .unwrap();
    editor.apply(Cmd::Commit).unwrap();
    assert_eq!(editor.blocks().to_markdown(), "# Title!\nmore\nbody");

    let current = editor.focus().unwrap().block;
    editor.apply(Cmd::Focus { block: current, raw: 0 }).unwrap();
    editor.apply(Cmd::Backspace).unwrap();
    assert_eq!(editor.blocks().to_markdown(), "# Title!more\nbody");
    assert_eq!(caret(&editor), ("Title!more".to_string(), 6));

    let events: Vec<EditorEvent> = rx.try_iter().collect();
    let splits = events
        .iter()
        .filter(|e| matches!(e, EditorEvent::BlocksSplit { .. }))
        .count();
    let merges = events
        .iter()
        .filter(|e| matches!(e, EditorEvent::BlocksMerged { .. }))
        .count();
    assert_eq!((splits, merges), (1, 1));
    assert!(matches!(events.last(), Some(EditorEvent::FocusMoved(_))));
}

#[test]
fn walk_the_document_with_arrows() {
    let (mut editor, _rx) = session("* one\n* two\nthree");
    let head = editor.blocks().head();
    editor.apply(Cmd::Focus { block: head, raw: 4 }).unwrap();
    assert_eq!(caret(&editor), ("one".to_string(), 2));

    editor.apply(Cmd::MoveDown).unwrap();
    assert_eq!(caret(&editor), ("two".to_string(), 2));
    editor.apply(Cmd::MoveDown).unwrap();
    assert_eq!(caret(&editor), ("three".to_string(), 4));

    for _ in 0..4 {
        editor.apply(Cmd::MoveLeft).unwrap();
    }
    assert_eq!(caret(&editor), ("three".to_string(), 0));
    editor.apply(Cmd::MoveLeft).unwrap();
    assert_eq!(caret(&editor), ("two".to_string(), 3));

    editor.apply(Cmd::ClickBelowEnd).unwrap();
    assert_eq!(editor.blocks().to_markdown(), "* one\n* two\nthree\n");
    assert_eq!(caret(&editor), (String::new(), 0));
}

#[test]
fn click_into_another_block_commits_the_focused_one() {
    let (mut editor, rx) = session("first\nsecond `code`");
    let (head, tail) = (editor.blocks().head(), editor.blocks().tail());
    editor.apply(Cmd::Focus { block: head, raw: 5 }).unwrap();
    editor
        .apply(Cmd::SetText {
            text: "first **bold**".into(),
            offset: 14,
        })
        .unwrap();

    let code = NodeTree::construct("second `code`").unwrap().leaves()[1];
    editor
        .apply(Cmd::Click {
            block: tail,
            leaf: code,
            offset: 2,
        })
        .unwrap();

    assert_eq!(editor.blocks().to_markdown(), "first **bold**\nsecond `code`");
    assert_eq!(caret(&editor), ("code".to_string(), 2));
    let rebuilt: Vec<EditorEvent> = rx
        .try_iter()
        .filter(|e| matches!(e, EditorEvent::TreeRebuilt(_)))
        .collect();
    assert_eq!(rebuilt, vec![EditorEvent::TreeRebuilt(head)]);
}
