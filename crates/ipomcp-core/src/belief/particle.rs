use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    model::{ResourceLevel, sample_categorical},
};

/// One hypothesis of the world: a state sample plus the believed hidden
/// level of every modeled neighbor.
///
/// `mental_models[i]` and `sampled_actions[i]` refer to the i-th modeled
/// neighbor of the planner's neighbor sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeliefParticle<S> {
    state: S,
    mental_models: Vec<ResourceLevel>,
    sampled_actions: Vec<Option<usize>>,
}

impl<S> BeliefParticle<S> {
    pub fn new(state: S, mental_models: Vec<ResourceLevel>) -> Self {
        let sampled_actions = vec![None; mental_models.len()];
        BeliefParticle {
            state,
            mental_models,
            sampled_actions,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn mental_models(&self) -> &[ResourceLevel] {
        &self.mental_models
    }

    /// FAC entry index of the action each modeled neighbor was last sampled to take.
    pub fn sampled_actions(&self) -> &[Option<usize>] {
        &self.sampled_actions
    }

    pub(crate) fn set_sampled_action(&mut self, slot: usize, entry: usize) {
        if let Some(action) = self.sampled_actions.get_mut(slot) {
            *action = Some(entry);
        }
    }
}

/// Prior over the hidden level of a modeled neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MentalModelPrior {
    /// Every neighbor starts at the same level.
    Fixed { level: ResourceLevel },
    /// Levels are drawn independently; `probabilities[l]` is the chance of level `l`.
    Categorical { probabilities: Vec<f64> },
}

impl Default for MentalModelPrior {
    fn default() -> Self {
        MentalModelPrior::Fixed { level: 1 }
    }
}

impl MentalModelPrior {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ResourceLevel, ModelError> {
        match self {
            MentalModelPrior::Fixed { level } => Ok(*level),
            MentalModelPrior::Categorical { probabilities } => {
                let idx = sample_categorical(probabilities, "mental model prior", rng)?;
                Ok(idx as ResourceLevel)
            }
        }
    }

    /// Draw one level per modeled neighbor.
    pub fn draw_many<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<ResourceLevel>, ModelError> {
        (0..count).map(|_| self.draw(rng)).collect()
    }
}
