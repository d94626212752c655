use std::sync::Arc;

use rand::Rng;

use crate::{
    bandit::Bandit,
    belief::{BeliefParticle, ParticleReservoir},
    error::{ModelError, PlanError},
    fac::{Fac, FacLayout},
    model::Environment,
    planner::{IterationMetrics, Planner},
    rollout::rollout,
    sampling::FacSampler,
    tree::{
        error::TreeError,
        ids::{ActionId, NodeId, PathStep},
        search_tree::PathEdge,
    },
};

/// Read-only models needed to advance one particle by one step.
struct Dynamics<'a, E: Environment> {
    env: &'a E,
    joint_layout: &'a Arc<FacLayout>,
    sampler: &'a FacSampler,
}

impl<E: Environment> Dynamics<'_, E> {
    fn joint(&self, fac: &Fac, action: ActionId) -> Result<Fac, PlanError> {
        let descriptor = self.env.descriptor();
        let name = descriptor
            .agent_action_name(action)
            .ok_or(PlanError::UnknownAction {
                action: action.index(),
            })?;
        Ok(fac.merge_action(self.joint_layout, descriptor.agent().frame, name)?)
    }

    /// One-step reward of `action` against the neighbor configuration `fac`.
    fn immediate_reward<R: Rng + ?Sized>(
        &self,
        particle: &BeliefParticle<E::State>,
        fac: &Fac,
        action: ActionId,
        rng: &mut R,
    ) -> Result<f64, PlanError> {
        let joint = self.joint(fac, action)?;
        let next = self
            .env
            .sample_next_state(particle.state(), action, &joint, rng)?;
        Ok(self.env.reward(particle.state(), action, &joint, &next))
    }

    /// Advance world state and mental models. Each modeled neighbor's level
    /// moves according to the action it was sampled to take for `fac`.
    fn transition<R: Rng + ?Sized>(
        &self,
        particle: &BeliefParticle<E::State>,
        fac: &Fac,
        action: ActionId,
        rng: &mut R,
    ) -> Result<(BeliefParticle<E::State>, Fac, f64), PlanError> {
        let joint = self.joint(fac, action)?;
        let next_state = self
            .env
            .sample_next_state(particle.state(), action, &joint, rng)?;
        let reward = self.env.reward(particle.state(), action, &joint, &next_state);

        let noop = self.env.descriptor().noop();
        let modeled = self.sampler.sample().modeled();
        let mut levels = Vec::with_capacity(modeled.len());
        for (slot, neighbor) in modeled.iter().enumerate() {
            let level = particle
                .mental_models()
                .get(slot)
                .copied()
                .ok_or(ModelError::UnknownNeighbor {
                    neighbor: neighbor.index(),
                })?;
            let taken = particle
                .sampled_actions()
                .get(slot)
                .copied()
                .flatten()
                .and_then(|entry| self.sampler.layout().entry(entry))
                .map_or(noop, |entry| entry.action.as_str());
            levels.push(
                self.env
                    .sample_internal_transition(*neighbor, level, taken, rng)?,
            );
        }

        Ok((BeliefParticle::new(next_state, levels), joint, reward))
    }
}

impl<E: Environment> Planner<E> {
    /// Run one simulation from `node` at depth `horizon` and return its
    /// discounted return.
    ///
    /// Beyond the horizon cutoff the value is 0 and no model is queried.
    pub fn simulate(
        &mut self,
        node: NodeId,
        particle: BeliefParticle<E::State>,
        horizon: usize,
    ) -> Result<f64, PlanError> {
        Ok(self.descend(node, particle, horizon, 0)?.root_return)
    }

    pub(crate) fn run_iteration(
        &mut self,
        particle: BeliefParticle<E::State>,
        iteration: usize,
    ) -> Result<IterationMetrics, PlanError> {
        let root = self.tree.root_id();
        self.descend(root, particle, 0, iteration)
    }

    fn descend(
        &mut self,
        start: NodeId,
        particle: BeliefParticle<E::State>,
        horizon: usize,
        iteration: usize,
    ) -> Result<IterationMetrics, PlanError> {
        let Planner {
            env,
            config,
            rng,
            joint_layout,
            fac_sampler,
            rollout_policy,
            bandit,
            tree,
            posteriors,
            ..
        } = self;
        let dynamics = Dynamics {
            env: &*env,
            joint_layout: &*joint_layout,
            sampler: &*fac_sampler,
        };
        let params = config.rollout_params();
        let num_actions = dynamics.env.descriptor().agent_action_count();
        let root = tree.root_id();

        let mut path: Vec<PathEdge> = Vec::new();
        let mut node = start;
        let mut particle = particle;
        let mut h = horizon;
        let mut created_node = false;

        let leaf_value = loop {
            if params.cutoff(h) {
                break 0.0;
            }

            let fac = dynamics.sampler.sample_fac(dynamics.env, &mut particle, rng)?;
            let (branch, is_new) = tree.find_or_create_branch(
                node,
                &fac,
                config.single_configuration_mode,
                num_actions,
            )?;
            if is_new {
                let values = (0..num_actions)
                    .map(|a| dynamics.immediate_reward(&particle, &fac, ActionId::from(a), rng))
                    .collect::<Result<Vec<_>, _>>()?;
                tree.warm_start(node, branch, &values)?;
            }

            let action = bandit
                .select(tree.branch(node, branch)?)
                .ok_or(TreeError::ActionSelectionFailed {
                    node_id: node,
                    branch_id: branch,
                })?;

            let (next, joint, reward) = dynamics.transition(&particle, &fac, action, rng)?;
            let observation = dynamics.env.sample_observation(
                particle.state(),
                action,
                &joint,
                next.state(),
                rng,
            )?;

            if node == root {
                posteriors
                    .entry((action, observation.clone()))
                    .or_insert_with(|| ParticleReservoir::new(config.particle_count))
                    .offer(next.clone(), rng);
            }

            let observation_index = tree.record_observation(node, branch, action, observation)?;
            path.push(PathEdge {
                node,
                branch,
                action,
                reward,
            });

            if params.cutoff(h + 1) {
                break 0.0;
            }

            let step = PathStep {
                branch,
                action,
                observation: observation_index,
            };
            match tree.child(node, step) {
                Some(child) => {
                    tree.add_particle(child, next.clone(), rng)?;
                    node = child;
                    particle = next;
                    h += 1;
                }
                None => {
                    node = tree.insert_child(node, step, reward, next.clone(), rng)?;
                    created_node = true;
                    break rollout(next, h + 1, params, |mut current| {
                        let fac = dynamics.sampler.sample_fac(dynamics.env, &mut current, rng)?;
                        let action = rollout_policy.choose(dynamics.env, current.state(), rng)?;
                        let (next, _, reward) = dynamics.transition(&current, &fac, action, rng)?;
                        Ok::<_, PlanError>((next, reward))
                    })?;
                }
            }
        };

        let root_return = tree.backpropagate(&path, leaf_value, config.gamma)?;

        Ok(IterationMetrics {
            iteration,
            leaf: node,
            path_len: path.len(),
            created_node,
            leaf_value,
            root_return,
        })
    }
}
