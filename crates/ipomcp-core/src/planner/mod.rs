//! Anytime I-POMCP planner: search, action choice and belief update.

pub mod config;
mod metrics;
mod parallel;
mod search;


use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::{
    bandit::Ucb1,
    belief::{BeliefParticle, ParticleReservoir, ParticleSet},
    error::PlanError,
    fac::FacLayout,
    model::Environment,
    rollout::RolloutPolicy,
    sampling::{FacSampler, NeighborSample},
    tree::{
        ids::ActionId,
        search_tree::{Tree, argmax},
        snapshot::TreeSnapshot,
    },
};

pub use config::{ConfigError, PlannerConfig};
pub use metrics::{IterationMetrics, SearchMetrics};
pub use parallel::plan_all;

type PosteriorCache<S, O> = HashMap<(ActionId, O), ParticleReservoir<BeliefParticle<S>>>;

/// Outcome of one decision epoch.
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: ActionId,
    pub action_name: String,
    /// Root value estimate per action, indexed by `ActionId`.
    pub values: Vec<f64>,
    /// Root visits per action, summed over root branches.
    pub visits: Vec<u64>,
    pub metrics: SearchMetrics,
}

/// Online planner for one agent.
///
/// Owns its belief, its search tree and its random stream; two planners
/// built with the same environment, config and seed make identical choices.
pub struct Planner<E: Environment> {
    env: E,
    config: PlannerConfig,
    rng: ChaCha8Rng,
    joint_layout: Arc<FacLayout>,
    fac_sampler: FacSampler,
    rollout_policy: RolloutPolicy,
    bandit: Ucb1,
    belief: ParticleSet<E::State>,
    tree: Tree<E::State, E::Observation>,
    posteriors: PosteriorCache<E::State, E::Observation>,
    last_decision: Option<ActionId>,
    epoch: usize,
}

impl<E: Environment> Planner<E> {
    /// Build a planner whose initial belief sits on `initial_state`, with
    /// neighbor levels drawn from the configured prior.
    pub fn new(env: E, config: PlannerConfig, initial_state: E::State) -> Result<Self, PlanError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let descriptor = env.descriptor();
        let sample = NeighborSample::draw(
            descriptor,
            config.confidence_alpha,
            config.sampling_error_bound,
            &mut rng,
        );
        let belief = ParticleSet::from_prior(
            &initial_state,
            sample.len(),
            &config.mental_model_prior,
            config.particle_count,
            &mut rng,
        )?;
        let joint_layout = Arc::new(descriptor.joint_layout());
        let fac_sampler = FacSampler::new(descriptor, sample);
        let rollout_policy = RolloutPolicy::precompute(&env);

        info!(
            neighbors = descriptor.neighbors().len(),
            modeled = fac_sampler.sample().len(),
            particles = belief.len(),
            "planner initialized"
        );

        Ok(Planner {
            bandit: Ucb1::new(config.exploration_constant),
            tree: Tree::new(config.particle_count),
            env,
            config,
            rng,
            joint_layout,
            fac_sampler,
            rollout_policy,
            belief,
            posteriors: HashMap::new(),
            last_decision: None,
            epoch: 0,
        })
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn belief(&self) -> &ParticleSet<E::State> {
        &self.belief
    }

    /// Tree of the most recent search.
    pub fn tree(&self) -> &Tree<E::State, E::Observation> {
        &self.tree
    }

    pub fn neighbor_sample(&self) -> &NeighborSample {
        self.fac_sampler.sample()
    }

    pub fn last_decision(&self) -> Option<ActionId> {
        self.last_decision
    }

    /// Number of belief updates applied so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Particles the last search collected under `(action, observation)` at the root.
    pub fn posterior(
        &self,
        action: ActionId,
        observation: &E::Observation,
    ) -> Option<&[BeliefParticle<E::State>]> {
        self.posteriors
            .get(&(action, observation.clone()))
            .map(|reservoir| reservoir.items())
    }

    pub fn snapshot(&self) -> Result<TreeSnapshot, PlanError> {
        Ok(self.tree.snapshot()?)
    }

    /// Search from the current belief until the time budget (or iteration cap)
    /// runs out and return the best root action.
    pub fn choose_action(&mut self) -> Result<Decision, PlanError> {
        self.choose_action_with_hook(|_| {})
    }

    /// Same as [`Planner::choose_action`], invoking `on_iteration` after every simulation.
    pub fn choose_action_with_hook<F>(&mut self, mut on_iteration: F) -> Result<Decision, PlanError>
    where
        F: FnMut(&IterationMetrics),
    {
        if self.belief.is_empty() {
            return Err(PlanError::EmptyBelief);
        }

        self.belief.resize(&mut self.rng);
        self.tree = Tree::new(self.config.particle_count);
        self.posteriors.clear();

        let started = Instant::now();
        let budget = Duration::from_millis(self.config.time_bound_ms);
        let mut metrics = SearchMetrics::default();

        // at least one iteration always runs, and a started one always completes
        loop {
            let particle = self
                .belief
                .sample(&mut self.rng)
                .cloned()
                .ok_or(PlanError::EmptyBelief)?;
            let iteration = self.run_iteration(particle, metrics.iterations)?;
            trace!(
                iteration = iteration.iteration,
                path_len = iteration.path_len,
                created = iteration.created_node,
                root_return = iteration.root_return,
                "simulation finished"
            );
            on_iteration(&iteration);
            metrics.record(&iteration);

            if self
                .config
                .max_iterations
                .is_some_and(|cap| metrics.iterations >= cap)
            {
                break;
            }
            if self.config.time_bound_ms > 0 && started.elapsed() >= budget {
                break;
            }
        }

        let num_actions = self.env.descriptor().agent_action_count();
        let values = match self
            .tree
            .root_action_values(self.config.averaged_q_action_selection)?
        {
            Some(values) => values,
            None => self.heuristic_values()?,
        };
        let mut visits = self.tree.root_action_visits()?;
        visits.resize(num_actions, 0);

        let action = argmax(&values)
            .map(ActionId::from)
            .ok_or(PlanError::UnknownAction { action: 0 })?;
        let action_name = self
            .env
            .descriptor()
            .agent_action_name(action)
            .ok_or(PlanError::UnknownAction {
                action: action.index(),
            })?
            .to_string();

        metrics.elapsed_ms = started.elapsed().as_millis();
        metrics.node_count = self.tree.node_count();
        metrics.root_branches = self.tree.node(self.tree.root_id())?.branches().len();

        debug!(
            iterations = metrics.iterations,
            elapsed_ms = metrics.elapsed_ms as u64,
            nodes = metrics.node_count,
            action = %action_name,
            "search finished"
        );

        self.last_decision = Some(action);
        Ok(Decision {
            action,
            action_name,
            values,
            visits,
            metrics,
        })
    }

    /// Replace the belief with the particles the last search collected under
    /// `(action, observation)` and drop the tree.
    pub fn update_belief(
        &mut self,
        action: ActionId,
        observation: &E::Observation,
    ) -> Result<(), PlanError> {
        if action.index() >= self.env.descriptor().agent_action_count() {
            return Err(PlanError::UnknownAction {
                action: action.index(),
            });
        }

        let posterior = self
            .posteriors
            .remove(&(action, observation.clone()))
            .filter(|reservoir| !reservoir.is_empty())
            .ok_or_else(|| PlanError::UnobservedObservation {
                action: action.index(),
                observation: format!("{observation:?}"),
            })?;

        let offered = posterior.offered();
        self.belief.replace(posterior.into_items());
        self.posteriors.clear();
        self.tree = Tree::new(self.config.particle_count);
        self.epoch += 1;

        info!(
            epoch = self.epoch,
            action = action.index(),
            observation = ?observation,
            particles = self.belief.len(),
            offered,
            "belief updated"
        );
        Ok(())
    }

    /// Root values when the search could not open a single branch:
    /// the rollout distribution of one belief particle.
    fn heuristic_values(&mut self) -> Result<Vec<f64>, PlanError> {
        let particle = self
            .belief
            .sample(&mut self.rng)
            .ok_or(PlanError::EmptyBelief)?;
        Ok(self.rollout_policy.distribution(&self.env, particle.state()))
    }
}
