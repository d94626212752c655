use std::fmt::Debug;

use serde::Serialize;

use crate::tree::{error::TreeError, search_tree::Tree};

/// Bumped whenever the serialized layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    pub schema_version: u32,
    pub root_node_id: usize,
    pub node_count: usize,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub node_id: usize,
    pub depth: usize,
    pub reward: f64,
    pub particle_count: usize,
    pub particles_offered: u64,
    pub parent_node_id: Option<usize>,
    pub parent_branch_id: Option<usize>,
    pub parent_action_id: Option<usize>,
    pub parent_observation_index: Option<usize>,
    pub branches: Vec<BranchSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchSnapshot {
    pub branch_id: usize,
    pub visits: u64,
    /// Count of every capacity entry, in layout order.
    pub configuration: Vec<u32>,
    pub actions: Vec<ActionSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionSnapshot {
    pub action_id: usize,
    pub visits: u64,
    pub q: f64,
    pub observations: Vec<ObservationSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationSnapshot {
    /// `Debug` rendering of the observation.
    pub observation: String,
    pub child_node_id: Option<usize>,
    pub count: u64,
}

impl TreeSnapshot {
    /// Serialize the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<S, O: PartialEq + Debug> Tree<S, O> {
    /// Capture the full tree for inspection or export.
    pub fn snapshot(&self) -> Result<TreeSnapshot, TreeError> {
        let nodes = self
            .nodes()
            .map(|(node_id, node)| {
                let parent = node.parent();
                NodeSnapshot {
                    node_id: node_id.index(),
                    depth: node.depth(),
                    reward: node.reward(),
                    particle_count: node.particles().len(),
                    particles_offered: node.particle_reservoir().offered(),
                    parent_node_id: parent.map(|(p, _)| p.index()),
                    parent_branch_id: parent.map(|(_, step)| step.branch.index()),
                    parent_action_id: parent.map(|(_, step)| step.action.index()),
                    parent_observation_index: parent.map(|(_, step)| step.observation),
                    branches: node
                        .branches()
                        .iter()
                        .enumerate()
                        .map(|(branch_id, branch)| BranchSnapshot {
                            branch_id,
                            visits: branch.visits(),
                            configuration: branch.fac().counts().to_vec(),
                            actions: branch
                                .edges()
                                .iter()
                                .map(|edge| ActionSnapshot {
                                    action_id: edge.action().index(),
                                    visits: edge.visits(),
                                    q: edge.q(),
                                    observations: edge
                                        .observations()
                                        .iter()
                                        .map(|link| ObservationSnapshot {
                                            observation: format!("{:?}", link.observation()),
                                            child_node_id: link.child().map(|c| c.index()),
                                            count: link.count(),
                                        })
                                        .collect(),
                                })
                                .collect(),
                        })
                        .collect(),
                }
            })
            .collect::<Vec<_>>();

        Ok(TreeSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            root_node_id: self.root_id().index(),
            node_count: self.node_count(),
            nodes,
        })
    }
}
