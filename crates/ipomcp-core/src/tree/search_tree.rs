use std::collections::HashMap;

use rand::Rng;

use crate::{
    belief::BeliefParticle,
    fac::Fac,
    tree::{
        arena::Arena,
        error::TreeError,
        history::HistoryElement,
        ids::{ActionId, BranchId, ChildKey, NodeId, PathStep},
        node::TreeNode,
    },
};

/// One edge taken during descent, with the reward observed on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEdge {
    pub node: NodeId,
    pub branch: BranchId,
    pub action: ActionId,
    pub reward: f64,
}

#[derive(Debug, Clone)]
/// owns the arena (root is always at index 0) and the structural child index.
/// The root's belief lives with the planner; the root node only carries statistics.
pub struct Tree<S, O> {
    arena: Arena<TreeNode<S, O>>,
    children: HashMap<ChildKey, NodeId>,
    particle_capacity: usize,
}

impl<S, O: PartialEq> Tree<S, O> {
    /// Create a tree with a single root node.
    /// Every later node keeps at most `particle_capacity` particles.
    pub fn new(particle_capacity: usize) -> Self {
        let mut arena = Arena::new();
        let _ = arena.allocate(TreeNode::new(None, 0, 0.0, particle_capacity));
        Tree {
            arena,
            children: HashMap::new(),
            particle_capacity,
        }
    }

    /// Return the root node id.
    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Return how many nodes exist in the tree arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Return an immutable node handle.
    pub fn node(&self, node_id: NodeId) -> Result<&TreeNode<S, O>, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Return a mutable node handle.
    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut TreeNode<S, O>, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode<S, O>)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId::from(idx), node))
    }

    pub fn branch(&self, node_id: NodeId, branch_id: BranchId) -> Result<&HistoryElement<O>, TreeError> {
        self.node(node_id)?
            .branch(branch_id)
            .ok_or(TreeError::MissingBranch { node_id, branch_id })
    }

    fn branch_mut(
        &mut self,
        node_id: NodeId,
        branch_id: BranchId,
    ) -> Result<&mut HistoryElement<O>, TreeError> {
        self.node_mut(node_id)?
            .branch_mut(branch_id)
            .ok_or(TreeError::MissingBranch { node_id, branch_id })
    }

    /// Child reached from `parent` through `step`, if it was created.
    pub fn child(&self, parent: NodeId, step: PathStep) -> Option<NodeId> {
        self.children.get(&ChildKey { parent, step }).copied()
    }

    /// Steps from the root down to `node_id`.
    pub fn path_of(&self, node_id: NodeId) -> Result<Vec<PathStep>, TreeError> {
        let mut steps = Vec::new();
        let mut current = node_id;
        while let Some((parent, step)) = self.node(current)?.parent() {
            steps.push(step);
            current = parent;
        }
        steps.reverse();
        Ok(steps)
    }

    /// Locate the branch for `fac` at `node_id`, creating it when missing.
    ///
    /// With `single_configuration` the node keeps exactly one branch whose
    /// configuration is overwritten by every new sample.
    /// Returns the branch and whether it was just created.
    pub fn find_or_create_branch(
        &mut self,
        node_id: NodeId,
        fac: &Fac,
        single_configuration: bool,
        num_actions: usize,
    ) -> Result<(BranchId, bool), TreeError> {
        let node = self.node_mut(node_id)?;

        if single_configuration {
            if let Some(branch) = node.branch_mut(BranchId::from(0)) {
                branch.overwrite_fac(fac.clone());
                return Ok((BranchId::from(0), false));
            }
        } else if let Some(branch_id) = node.find_branch(fac) {
            return Ok((branch_id, false));
        }

        let branch_id = node.push_branch(HistoryElement::new(fac.clone(), num_actions));
        Ok((branch_id, true))
    }

    /// Seed the action values of a freshly created branch.
    pub fn warm_start(
        &mut self,
        node_id: NodeId,
        branch_id: BranchId,
        values: &[f64],
    ) -> Result<(), TreeError> {
        self.branch_mut(node_id, branch_id)?.warm_start(values);
        Ok(())
    }

    /// Count `observation` under `(branch, action)` and return its dedupe index.
    pub fn record_observation(
        &mut self,
        node_id: NodeId,
        branch_id: BranchId,
        action_id: ActionId,
        observation: O,
    ) -> Result<usize, TreeError> {
        let edge = self
            .branch_mut(node_id, branch_id)?
            .edge_mut(action_id)
            .ok_or(TreeError::MissingEdge {
                node_id,
                branch_id,
                action_id,
            })?;
        Ok(edge.observations_mut().record(observation))
    }

    /// Create the child of `parent` reached through `step`, seeded with `particle`.
    pub fn insert_child<R: Rng + ?Sized>(
        &mut self,
        parent: NodeId,
        step: PathStep,
        reward: f64,
        particle: BeliefParticle<S>,
        rng: &mut R,
    ) -> Result<NodeId, TreeError> {
        let key = ChildKey { parent, step };
        if self.children.contains_key(&key) {
            return Err(TreeError::DuplicateChild { parent });
        }

        let depth = self.node(parent)?.depth() + 1;
        let mut child = TreeNode::new(Some((parent, step)), depth, reward, self.particle_capacity);
        child.add_particle(particle, rng);
        let child_id = self.arena.allocate(child);

        let linked = self
            .branch_mut(parent, step.branch)?
            .edge_mut(step.action)
            .ok_or(TreeError::MissingEdge {
                node_id: parent,
                branch_id: step.branch,
                action_id: step.action,
            })?
            .observations_mut()
            .set_child(step.observation, child_id);
        if !linked {
            return Err(TreeError::MissingEdge {
                node_id: parent,
                branch_id: step.branch,
                action_id: step.action,
            });
        }

        self.children.insert(key, child_id);
        Ok(child_id)
    }

    /// Add a particle to an existing node.
    pub fn add_particle<R: Rng + ?Sized>(
        &mut self,
        node_id: NodeId,
        particle: BeliefParticle<S>,
        rng: &mut R,
    ) -> Result<(), TreeError> {
        self.node_mut(node_id)?.add_particle(particle, rng);
        Ok(())
    }

    /// Backpropagate one simulation bottom-up.
    ///
    /// Each edge receives `reward + gamma * return_below`, starting from
    /// `leaf_value`; its branch visit is counted. Returns the root return.
    pub fn backpropagate(
        &mut self,
        path: &[PathEdge],
        leaf_value: f64,
        gamma: f64,
    ) -> Result<f64, TreeError> {
        let mut ret = leaf_value;
        for edge in path.iter().rev() {
            ret = edge.reward + gamma * ret;

            let branch = self.branch_mut(edge.node, edge.branch)?;
            branch.record_visit();
            branch
                .edge_mut(edge.action)
                .ok_or(TreeError::MissingEdge {
                    node_id: edge.node,
                    branch_id: edge.branch,
                    action_id: edge.action,
                })?
                .record(ret);
        }
        Ok(ret)
    }

    /// Visits of every root action summed over all root branches.
    pub fn root_action_visits(&self) -> Result<Vec<u64>, TreeError> {
        let root = self.node(self.root_id())?;
        let mut visits = Vec::new();
        for branch in root.branches() {
            if visits.len() < branch.edges().len() {
                visits.resize(branch.edges().len(), 0);
            }
            for (a, edge) in branch.edges().iter().enumerate() {
                visits[a] += edge.visits();
            }
        }
        Ok(visits)
    }

    /// Value estimate of every root action.
    ///
    /// With `averaged` the estimates of all branches are combined, weighted by
    /// visits (falling back to the plain mean of the warm starts for an action
    /// no branch has visited). Otherwise the most visited branch decides.
    /// `None` while the root has no branch.
    pub fn root_action_values(&self, averaged: bool) -> Result<Option<Vec<f64>>, TreeError> {
        let root = self.node(self.root_id())?;
        let branches = root.branches();
        let Some(first) = branches.first() else {
            return Ok(None);
        };

        if !averaged {
            let mut best = first;
            for branch in &branches[1..] {
                if branch.visits() > best.visits() {
                    best = branch;
                }
            }
            return Ok(Some(best.edges().iter().map(|e| e.q()).collect()));
        }

        let num_actions = first.edges().len();
        let mut values = Vec::with_capacity(num_actions);
        for a in 0..num_actions {
            let action = ActionId::from(a);
            let (mut weighted, mut visits, mut seeds) = (0.0, 0_u64, 0.0);
            for branch in branches {
                if let Some(edge) = branch.edge(action) {
                    weighted += edge.q() * edge.visits() as f64;
                    visits += edge.visits();
                    seeds += edge.q();
                }
            }
            values.push(if visits > 0 {
                weighted / visits as f64
            } else {
                seeds / branches.len() as f64
            });
        }
        Ok(Some(values))
    }

    /// Pick the root action with the highest value estimate, lowest index on ties.
    pub fn best_root_action(&self, averaged: bool) -> Result<Option<ActionId>, TreeError> {
        let Some(values) = self.root_action_values(averaged)? else {
            return Ok(None);
        };
        Ok(argmax(&values).map(ActionId::from))
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.iter().copied().enumerate() {
        match best {
            Some((_, best_value)) if best_value >= value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}
