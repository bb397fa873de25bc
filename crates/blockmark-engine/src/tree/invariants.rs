use super::{NodeKind, NodeTree};

/// Validates structural invariants of a tree.
///
/// Asserts that:
/// - The root is a parentless `root` node and the only one
/// - Leaves have no children; containers have no text and at least one child
/// - Every child's `parent` and `index` agree with its position
/// - Every node is reachable from the root exactly once
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(tree: &NodeTree) {
    let root = &tree.nodes[NodeTree::ROOT.0];
    assert_eq!(root.kind, NodeKind::Root, "first node must be the root");
    assert!(root.parent.is_none(), "root must not have a parent");

    let mut seen = vec![false; tree.nodes.len()];
    seen[NodeTree::ROOT.0] = true;

    for id in tree.ids() {
        let node = &tree.nodes[id.0];
        if id != NodeTree::ROOT {
            assert_ne!(node.kind, NodeKind::Root, "{id} is a nested root");
        }
        if node.is_leaf() {
            assert!(node.children.is_empty(), "leaf {id} has children");
        } else {
            assert!(node.text.is_empty(), "container {id} has text {:?}", node.text);
            assert!(!node.children.is_empty(), "container {id} has no children");
        }

        for (position, &child) in node.children.iter().enumerate() {
            let child_node = tree
                .get(child)
                .unwrap_or_else(|| panic!("{id} links missing {child}"));
            assert_eq!(child_node.parent, Some(id), "{child} parent mismatch");
            assert_eq!(child_node.index, position, "{child} index mismatch");
            assert!(!seen[child.0], "{child} reachable twice");
            seen[child.0] = true;
        }
    }

    if let Some(orphan) = seen.iter().position(|&reached| !reached) {
        panic!("node {orphan} is unreachable from the root");
    }
}
