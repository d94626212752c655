use serde::{Deserialize, Serialize};

/// A wraper for an integer index used to index nodes in the tree arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the value of the actual node without having to access and risk overiding the internal value
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    /// Allow for explicit conversion from usize to NodeId
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Stable index of one of the planning agent's actions.
/// The same index addresses the action row of every history element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(usize);

impl ActionId {
    /// Get the value of the actual action without having to access and risk overiding the internal value
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionId {
    /// Allow for explicit conversion from usize to ActionId
    fn from(value: usize) -> Self {
        ActionId(value)
    }
}

/// Index of a history element (one per distinct configuration) inside a node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(usize);

impl BranchId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for BranchId {
    fn from(value: usize) -> Self {
        BranchId(value)
    }
}

/// One level of a node path: which branch, which action, and which
/// deduplicated observation led from the parent to the child.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub branch: BranchId,
    pub action: ActionId,
    pub observation: usize,
}

/// Structural lookup key of a child node.
/// Equal `(parent, branch, action, observation)` tuples always resolve to the same child.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChildKey {
    pub parent: NodeId,
    pub step: PathStep,
}
