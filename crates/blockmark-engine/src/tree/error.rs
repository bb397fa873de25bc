use super::NodeId;

/// Tree construction and editing failures.
///
/// `MultiLine`, `Unsupported` and `LeafWithChildren` are contract
/// violations of the input; the id variants mean a caller used a node id
/// from another tree or the wrong kind of node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("unexpected multi-line input")]
    MultiLine,
    #[error("unsupported syntax: {kind}")]
    Unsupported { kind: &'static str },
    #[error("{kind} token cannot carry nested tokens")]
    LeafWithChildren { kind: &'static str },
    #[error("{0} is not a leaf")]
    NotALeaf(NodeId),
    #[error("{0} does not belong to this tree")]
    UnknownNode(NodeId),
}
