//! Default policy used below the tree frontier.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::{
    error::ModelError,
    model::{Environment, sample_categorical},
    tree::ids::ActionId,
};

/// Penalty applied to the log-weight of an action that cannot accomplish anything.
pub const WASTED_ACTION_WEIGHT: f64 = 5.0;

/// Horizon limits shared by tree descent and rollouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutParams {
    pub gamma: f64,
    pub epsilon: f64,
    pub max_horizon: usize,
}

impl RolloutParams {
    /// True when a step at `horizon` no longer contributes to the return.
    pub fn cutoff(&self, horizon: usize) -> bool {
        horizon >= self.max_horizon || self.gamma.powi(horizon as i32) < self.epsilon
    }
}

/// Softmax over the agent's actions that discourages wasted moves.
///
/// Weights only look at the planning agent's own context: a non-noop action
/// while depleted, or an action aimed at a closed target, is penalized by
/// [`WASTED_ACTION_WEIGHT`] each. Distributions of enumerable states are memoized.
#[derive(Debug, Clone, Default)]
pub struct RolloutPolicy {
    table: HashMap<usize, Vec<f64>>,
}

impl RolloutPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the table for every state the environment can enumerate.
    pub fn precompute<E: Environment>(env: &E) -> Self {
        let mut table = HashMap::new();
        if let Some(enumerator) = env.state_enumerator() {
            for state in enumerator.enumerated_states() {
                if let Some(id) = enumerator.enumerated_id(&state) {
                    table.entry(id).or_insert_with(|| action_distribution(env, &state));
                }
            }
        }
        debug!(states = table.len(), "precomputed rollout distributions");
        RolloutPolicy { table }
    }

    pub fn memoized(&self) -> usize {
        self.table.len()
    }

    /// Action distribution in `state`, memoized when the state is enumerable.
    pub fn distribution<E: Environment>(&mut self, env: &E, state: &E::State) -> Vec<f64> {
        let id = env
            .state_enumerator()
            .and_then(|enumerator| enumerator.enumerated_id(state));
        match id {
            Some(id) => self
                .table
                .entry(id)
                .or_insert_with(|| action_distribution(env, state))
                .clone(),
            None => action_distribution(env, state),
        }
    }

    pub fn choose<E: Environment, R: Rng + ?Sized>(
        &mut self,
        env: &E,
        state: &E::State,
        rng: &mut R,
    ) -> Result<ActionId, ModelError> {
        let probabilities = self.distribution(env, state);
        let idx = sample_categorical(&probabilities, "rollout policy", rng)?;
        Ok(ActionId::from(idx))
    }
}

fn action_distribution<E: Environment>(env: &E, state: &E::State) -> Vec<f64> {
    let count = env.descriptor().agent_action_count();
    let depleted = env.agent_depleted(state);

    let weights = (0..count)
        .map(|a| {
            let action = ActionId::from(a);
            let mut weight = 0.0;
            if depleted && !env.descriptor().is_noop(action) {
                weight -= WASTED_ACTION_WEIGHT;
            }
            if env.action_target_closed(state, action) {
                weight -= WASTED_ACTION_WEIGHT;
            }
            f64::exp(weight)
        })
        .collect::<Vec<_>>();

    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Run a default-policy rollout starting at `horizon`.
///
/// `step` advances the simulation by one step and returns the next sample
/// with the reward collected. Rewards are discounted relative to the start.
pub fn rollout<P, F, Err>(
    start: P,
    horizon: usize,
    params: RolloutParams,
    mut step: F,
) -> Result<f64, Err>
where
    F: FnMut(P) -> Result<(P, f64), Err>,
{
    let mut current = start;
    let mut total_return = 0.0;
    let mut discount = 1.0;
    let mut h = horizon;

    while !params.cutoff(h) {
        let (next, reward) = step(current)?;
        total_return += discount * reward;
        discount *= params.gamma;
        current = next;
        h += 1;
    }

    Ok(total_return)
}
