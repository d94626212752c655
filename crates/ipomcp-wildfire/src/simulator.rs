use std::sync::Arc;

use ipomcp_core::{
    ActionId, Environment, Fac, FacLayout, FrameId, ModelError, NeighborId, NeighborPolicy,
    ResourceLevel,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::{
    WildfireError,
    model::{FireObservation, FireState, WildfireModel},
};

#[derive(Debug, Clone, PartialEq)]
/// Result of one real step of the world.
pub struct StepOutcome {
    pub observation: FireObservation,
    pub reward: f64,
    /// Action every neighbor actually took, by neighbor index.
    pub neighbor_actions: Vec<String>,
}

#[derive(Debug, Clone)]
/// Seeded ground-truth world the planning agent acts in.
///
/// Neighbors follow their frame's tabular policy using their true suppressant.
pub struct WildfireSimulator {
    model: WildfireModel,
    rng: ChaCha8Rng,
    state: FireState,
    neighbor_levels: Vec<ResourceLevel>,
    neighbor_layout: Arc<FacLayout>,
    joint_layout: Arc<FacLayout>,
    steps: usize,
}

impl WildfireSimulator {
    /// Create a simulator at the scenario's initial state with a deterministic RNG seed.
    pub fn new(model: WildfireModel, seed: u64) -> Self {
        let descriptor = model.descriptor();
        let neighbor_layout = Arc::new(descriptor.neighbor_layout());
        let joint_layout = Arc::new(descriptor.joint_layout());
        Self {
            state: model.initial_state().clone(),
            neighbor_levels: model.initial_neighbor_levels().to_vec(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            model,
            neighbor_layout,
            joint_layout,
            steps: 0,
        }
    }

    pub fn model(&self) -> &WildfireModel {
        &self.model
    }

    pub fn state(&self) -> &FireState {
        &self.state
    }

    pub fn neighbor_levels(&self) -> &[ResourceLevel] {
        &self.neighbor_levels
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// True when no fire is burning.
    pub fn is_clear(&self) -> bool {
        self.state.intensities.iter().all(|intensity| *intensity == 0)
    }

    fn neighbor_actions(&self) -> Result<Vec<String>, WildfireError> {
        let descriptor = self.model.descriptor();
        descriptor
            .neighbors()
            .iter()
            .enumerate()
            .map(|(idx, neighbor)| -> Result<String, WildfireError> {
                let policy = self.model.policy(neighbor.frame).ok_or(ModelError::MissingPolicy {
                    frame: neighbor.frame.index(),
                })?;
                let level = self.neighbor_levels[idx];
                Ok(policy.action(&self.state, NeighborId::from(idx), level).to_string())
            })
            .collect()
    }

    /// Configuration of the neighbors' `actions` plus the agent taking `agent_action`.
    fn joint_configuration(
        &self,
        actions: &[String],
        agent_frame: FrameId,
        agent_action: &str,
    ) -> Result<Fac, WildfireError> {
        let mut fac = Fac::empty(Arc::clone(&self.neighbor_layout));
        for (neighbor, action) in self.model.descriptor().neighbors().iter().zip(actions) {
            let count = fac.count_of(neighbor.frame, action).unwrap_or(0);
            fac.put(neighbor.frame, action, count + 1)?;
        }
        Ok(fac.merge_action(&self.joint_layout, agent_frame, agent_action)?)
    }

    /// Advance the world by one step with the planning agent taking `action`.
    pub fn step(&mut self, action: ActionId) -> Result<StepOutcome, WildfireError> {
        let descriptor = self.model.descriptor();
        let agent_action = descriptor
            .agent_action_name(action)
            .ok_or(WildfireError::UnknownAgentAction {
                action: action.index(),
            })?
            .to_string();
        let agent_frame = descriptor.agent().frame;

        let neighbor_actions = self.neighbor_actions()?;
        let fac = self.joint_configuration(&neighbor_actions, agent_frame, &agent_action)?;

        let next = self
            .model
            .sample_next_state(&self.state, action, &fac, &mut self.rng)?;
        let observation = self
            .model
            .sample_observation(&self.state, action, &fac, &next, &mut self.rng)?;
        let reward = self.model.reward(&self.state, action, &fac, &next);

        for (idx, neighbor_action) in neighbor_actions.iter().enumerate() {
            self.neighbor_levels[idx] = self.model.sample_internal_transition(
                NeighborId::from(idx),
                self.neighbor_levels[idx],
                neighbor_action,
                &mut self.rng,
            )?;
        }

        trace!(
            step = self.steps,
            action = %agent_action,
            reward,
            intensities = ?next.intensities,
            "world step"
        );
        self.state = next;
        self.steps += 1;

        Ok(StepOutcome {
            observation,
            reward,
            neighbor_actions,
        })
    }
}
