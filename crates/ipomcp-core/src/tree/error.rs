use thiserror::Error;

use crate::tree::ids::{ActionId, BranchId, NodeId};

/// Error type for search tree bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    #[error("missing node with id {}", node_id.index())]
    MissingNode { node_id: NodeId },

    /// Attempted to access a configuration branch that does not exist on a node.
    #[error("missing branch {} on node {}", branch_id.index(), node_id.index())]
    MissingBranch { node_id: NodeId, branch_id: BranchId },

    /// Attempted to access an action row that does not exist on a branch.
    #[error(
        "missing action {} on branch {} of node {}",
        action_id.index(),
        branch_id.index(),
        node_id.index()
    )]
    MissingEdge {
        node_id: NodeId,
        branch_id: BranchId,
        action_id: ActionId,
    },

    /// Tree policy could not select an action from a branch.
    #[error(
        "failed to select action on branch {} of node {}",
        branch_id.index(),
        node_id.index()
    )]
    ActionSelectionFailed { node_id: NodeId, branch_id: BranchId },

    /// A child was registered twice under the same structural key.
    #[error("node {} already has a child for this step", parent.index())]
    DuplicateChild { parent: NodeId },
}
