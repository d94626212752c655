use rand::Rng;

use crate::{
    belief::{BeliefParticle, ParticleReservoir},
    fac::Fac,
    tree::{
        history::HistoryElement,
        ids::{BranchId, NodeId, PathStep},
    },
};

#[derive(Debug, Clone)]
/// represents a belief state in the search tree: the particles that reached
/// it and one history element per configuration sampled here.
pub struct TreeNode<S, O> {
    particles: ParticleReservoir<BeliefParticle<S>>,
    branches: Vec<HistoryElement<O>>,
    parent: Option<(NodeId, PathStep)>,
    depth: usize,
    reward: f64,
}

impl<S, O: PartialEq> TreeNode<S, O> {
    /// Create a new node. `reward` is the one-step reward of the transition
    /// that first led here.
    pub fn new(
        parent: Option<(NodeId, PathStep)>,
        depth: usize,
        reward: f64,
        particle_capacity: usize,
    ) -> Self {
        TreeNode {
            particles: ParticleReservoir::new(particle_capacity),
            branches: Vec::new(),
            parent,
            depth,
            reward,
        }
    }

    pub fn particles(&self) -> &[BeliefParticle<S>] {
        self.particles.items()
    }

    pub(crate) fn particle_reservoir(&self) -> &ParticleReservoir<BeliefParticle<S>> {
        &self.particles
    }

    pub(crate) fn add_particle<R: Rng + ?Sized>(&mut self, particle: BeliefParticle<S>, rng: &mut R) {
        self.particles.offer(particle, rng);
    }

    pub fn branches(&self) -> &[HistoryElement<O>] {
        &self.branches
    }

    pub fn branch(&self, branch: BranchId) -> Option<&HistoryElement<O>> {
        self.branches.get(branch.index())
    }

    pub(crate) fn branch_mut(&mut self, branch: BranchId) -> Option<&mut HistoryElement<O>> {
        self.branches.get_mut(branch.index())
    }

    /// Branch created for an identical configuration, if any.
    pub fn find_branch(&self, fac: &Fac) -> Option<BranchId> {
        self.branches
            .iter()
            .position(|branch| branch.fac() == fac)
            .map(BranchId::from)
    }

    pub(crate) fn push_branch(&mut self, branch: HistoryElement<O>) -> BranchId {
        self.branches.push(branch);
        BranchId::from(self.branches.len() - 1)
    }

    /// Total visits across every branch.
    pub fn visits(&self) -> u64 {
        self.branches.iter().map(HistoryElement::visits).sum()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Return the parent of a given node
    pub fn parent(&self) -> Option<(NodeId, PathStep)> {
        self.parent
    }
}
