pub mod bandit;
pub mod belief;
pub mod descriptor;
pub mod error;
pub mod fac;
pub mod model;
mod planner;
pub mod rollout;
pub mod sampling;
mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bandit::{Bandit, Ucb1};
pub use belief::{BeliefParticle, MentalModelPrior, ParticleReservoir, ParticleSet};
pub use descriptor::{
    AgentSpec, EnvironmentDescriptor, FrameId, FrameSpec, NeighborId, NeighborSpec, ResourceId,
};
pub use error::{DescriptorError, FacError, ModelError, PlanError};
pub use fac::{CapacityEntry, Fac, FacLayout};
pub use model::{
    Environment, NeighborPolicy, PROBABILITY_TOLERANCE, ResourceLevel, StateEnumerator,
    checked_mass, sample_categorical,
};
pub use planner::{
    ConfigError, Decision, IterationMetrics, Planner, PlannerConfig, SearchMetrics, plan_all,
};
pub use rollout::{RolloutParams, RolloutPolicy, WASTED_ACTION_WEIGHT};
pub use sampling::{FacSampler, NeighborSample, sample_size};
pub use tree::error::TreeError;
pub use tree::ids::{ActionId, BranchId, NodeId, PathStep};
pub use tree::search_tree::{PathEdge, Tree};
pub use tree::snapshot::{
    ActionSnapshot, BranchSnapshot, NodeSnapshot, ObservationSnapshot, TreeSnapshot,
};
pub use tree::{ActionEdge, FacNode, HistoryElement, ObservationLink, ObservationSet, TreeNode};
