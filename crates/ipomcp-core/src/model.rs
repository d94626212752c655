//! Interfaces the planner expects from its environment collaborators.

use std::{fmt::Debug, hash::Hash};

use rand::Rng;
use tracing::warn;

use crate::{
    descriptor::{EnvironmentDescriptor, FrameId, NeighborId},
    error::ModelError,
    fac::Fac,
    tree::ids::ActionId,
};

/// How far a distribution may drift from 1.0 before it is treated as broken.
pub const PROBABILITY_TOLERANCE: f64 = 0.01;

/// Discrete hidden resource level of an agent (for example remaining suppressant).
pub type ResourceLevel = u8;

/// Transition, observation and reward model of the environment as seen by
/// one planning agent.
///
/// `fac` arguments are joint configurations: they include the planning
/// agent's own `action`.
pub trait Environment {
    type State: Clone + Eq + Hash + Debug;
    type Observation: Clone + Eq + Hash + Debug;

    fn descriptor(&self) -> &EnvironmentDescriptor;

    /// Sample the next world state.
    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: ActionId,
        fac: &Fac,
        rng: &mut R,
    ) -> Result<Self::State, ModelError>;

    /// Sample what the planning agent observes after moving from `state` to `next_state`.
    fn sample_observation<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: ActionId,
        fac: &Fac,
        next_state: &Self::State,
        rng: &mut R,
    ) -> Result<Self::Observation, ModelError>;

    fn reward(
        &self,
        state: &Self::State,
        action: ActionId,
        fac: &Fac,
        next_state: &Self::State,
    ) -> f64;

    /// Sample a neighbor's next hidden resource level after it took `action`.
    fn sample_internal_transition<R: Rng + ?Sized>(
        &self,
        neighbor: NeighborId,
        level: ResourceLevel,
        action: &str,
        rng: &mut R,
    ) -> Result<ResourceLevel, ModelError>;

    /// Largest reward a single step can yield.
    fn max_reward(&self) -> f64;

    /// Policy used to predict the members of `frame`.
    fn neighbor_policy(&self, frame: FrameId) -> Option<&dyn NeighborPolicy<Self::State>>;

    /// Enumeration used to memoize rollout distributions.
    fn state_enumerator(&self) -> Option<&dyn StateEnumerator<Self::State>> {
        None
    }

    /// True when the planning agent has no resource left to act with.
    fn agent_depleted(&self, _state: &Self::State) -> bool {
        false
    }

    /// True when `action` targets a resource that is already exhausted or resolved.
    fn action_target_closed(&self, _state: &Self::State, _action: ActionId) -> bool {
        false
    }
}

/// Precomputed behavior of one neighbor frame.
pub trait NeighborPolicy<S> {
    /// Name of the action `neighbor` takes in `state` when its hidden level is `level`.
    fn action(&self, state: &S, neighbor: NeighborId, level: ResourceLevel) -> &str;
}

/// Dense enumeration of environment states.
pub trait StateEnumerator<S> {
    fn enumerated_id(&self, state: &S) -> Option<usize>;

    fn enumerated_states(&self) -> Vec<S>;
}

/// Check that `probabilities` form a distribution and draw one index from it.
///
/// Sums within [`PROBABILITY_TOLERANCE`] of 1.0 are renormalized in place;
/// anything further off is a [`ModelError::ProbabilityMass`].
pub fn sample_categorical<R: Rng + ?Sized>(
    probabilities: &[f64],
    context: &str,
    rng: &mut R,
) -> Result<usize, ModelError> {
    let sum = checked_mass(probabilities, context)?;

    let draw = rng.r#gen::<f64>() * sum;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (idx, p) in probabilities.iter().enumerate() {
        if *p > 0.0 {
            last_positive = idx;
        }
        cumulative += p;
        if draw < cumulative {
            return Ok(idx);
        }
    }
    Ok(last_positive)
}

/// Validate `probabilities` and return their sum.
pub fn checked_mass(probabilities: &[f64], context: &str) -> Result<f64, ModelError> {
    let mut sum = 0.0;
    for p in probabilities {
        if !p.is_finite() || *p < 0.0 {
            return Err(ModelError::InvalidProbability {
                context: context.to_string(),
                value: *p,
            });
        }
        sum += p;
    }

    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ModelError::ProbabilityMass {
            context: context.to_string(),
            sum,
            tolerance: PROBABILITY_TOLERANCE,
        });
    }
    if (sum - 1.0).abs() > 1e-9 {
        warn!(context, sum, "renormalizing distribution within tolerance");
    }
    Ok(sum)
}
