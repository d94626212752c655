use std::collections::HashMap;

use ipomcp_core::{
    ActionId, AgentSpec, Environment, EnvironmentDescriptor, Fac, FrameId, FrameSpec, ModelError,
    NeighborId, NeighborPolicy, NeighborSpec, ResourceId, ResourceLevel, StateEnumerator,
    sample_categorical,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    WildfireError, WildfireSpec,
    policy::{NOOP, PolicyAction, PolicyRule, TabularPolicy, fight_action, fight_target},
    spec::{RewardSpec, SuppressantSpec},
};

/// Hidden world state seen from the planning agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FireState {
    pub intensities: Vec<u8>,
    /// The planning agent's own suppressant level.
    pub suppressant: u8,
}

/// What the planning agent perceives after a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FireObservation {
    pub intensities: Vec<u8>,
    pub suppressant: u8,
}

#[derive(Debug, Clone)]
struct FireDynamics {
    levels: u8,
    ignition: f64,
    spread: f64,
    reduction_rate: f64,
    burn_out: bool,
}

impl FireDynamics {
    fn top(&self) -> u8 {
        self.levels - 1
    }

    fn burned_out(&self, intensity: u8) -> bool {
        self.burn_out && intensity == self.top()
    }
}

/// Mixed-radix enumeration over every fire intensity and the agent's suppressant.
#[derive(Debug, Clone)]
pub struct FireEnumerator {
    radices: Vec<usize>,
    suppressant_levels: usize,
}

impl FireEnumerator {
    pub fn state_count(&self) -> usize {
        self.radices.iter().product::<usize>() * self.suppressant_levels
    }
}

impl StateEnumerator<FireState> for FireEnumerator {
    fn enumerated_id(&self, state: &FireState) -> Option<usize> {
        if state.intensities.len() != self.radices.len()
            || usize::from(state.suppressant) >= self.suppressant_levels
        {
            return None;
        }
        let mut id = usize::from(state.suppressant);
        let mut scale = self.suppressant_levels;
        for (intensity, radix) in state.intensities.iter().zip(&self.radices) {
            let intensity = usize::from(*intensity);
            if intensity >= *radix {
                return None;
            }
            id += intensity * scale;
            scale *= radix;
        }
        Some(id)
    }

    fn enumerated_states(&self) -> Vec<FireState> {
        (0..self.state_count())
            .map(|mut id| {
                let suppressant = (id % self.suppressant_levels) as u8;
                id /= self.suppressant_levels;
                let intensities = self
                    .radices
                    .iter()
                    .map(|radix| {
                        let intensity = (id % radix) as u8;
                        id /= radix;
                        intensity
                    })
                    .collect();
                FireState {
                    intensities,
                    suppressant,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
/// Compiled wildfire scenario, ready to be planned over.
pub struct WildfireModel {
    descriptor: EnvironmentDescriptor,
    frame_names: Vec<String>,
    frame_power: Vec<f64>,
    fires: Vec<FireDynamics>,
    fight_names: Vec<String>,
    suppressant: SuppressantSpec,
    rewards: RewardSpec,
    observation_noise: f64,
    /// Fire targeted by each agent action, `None` for noop.
    agent_targets: Vec<Option<usize>>,
    policies: Vec<Option<TabularPolicy>>,
    enumerator: FireEnumerator,
    initial_state: FireState,
    neighbor_levels: Vec<ResourceLevel>,
}

fn dedup_fires(fires: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(fires.len());
    for fire in fires {
        if !out.contains(fire) {
            out.push(*fire);
        }
    }
    out
}

fn actions_for(fires: &[usize]) -> Vec<String> {
    let mut actions = vec![NOOP.to_string()];
    actions.extend(fires.iter().map(|fire| fight_action(*fire)));
    actions
}

impl WildfireModel {
    /// Validate `spec` and compile it.
    pub fn from_spec(spec: &WildfireSpec) -> Result<Self, WildfireError> {
        spec.validate()?;

        let fire_count = spec.fires.len();
        let frame_index: HashMap<&str, usize> = spec
            .frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| (frame.name.as_str(), idx))
            .collect();
        let frame_of = |name: &str| {
            frame_index
                .get(name)
                .copied()
                .ok_or_else(|| WildfireError::UnknownFrame {
                    owner: "scenario".to_string(),
                    frame: name.to_string(),
                })
        };

        let all_fires: Vec<usize> = (0..fire_count).collect();
        let frames = spec
            .frames
            .iter()
            .map(|frame| FrameSpec {
                name: frame.name.clone(),
                actions: actions_for(&all_fires),
            })
            .collect();

        let agent_fires = dedup_fires(&spec.agent.fires);
        let agent = AgentSpec {
            frame: FrameId::from(frame_of(spec.agent.frame.as_str())?),
            actions: actions_for(&agent_fires),
        };
        let mut agent_targets = vec![None];
        agent_targets.extend(agent_fires.iter().copied().map(Some));

        let mut neighbor_frames = Vec::with_capacity(spec.neighbors.len());
        let mut neighbors = Vec::with_capacity(spec.neighbors.len());
        let mut reach = Vec::with_capacity(spec.neighbors.len());
        for placement in &spec.neighbors {
            let frame = frame_of(placement.frame.as_str())?;
            let fires = dedup_fires(&placement.fires);
            neighbors.push(NeighborSpec {
                frame: FrameId::from(frame),
                actions: actions_for(&fires),
                resources: fires.iter().copied().map(ResourceId::from).collect(),
            });
            neighbor_frames.push(frame);
            reach.push(fires);
        }

        let descriptor = EnvironmentDescriptor::new(frames, neighbors, agent, fire_count, NOOP)?;

        let fires: Vec<FireDynamics> = spec
            .fires
            .iter()
            .map(|fire| FireDynamics {
                levels: fire.levels,
                ignition: fire.ignition,
                spread: fire.spread,
                reduction_rate: fire.reduction_rate,
                burn_out: fire.burn_out,
            })
            .collect();
        let burned_out: Vec<Option<u8>> = fires
            .iter()
            .map(|fire| fire.burn_out.then(|| fire.top()))
            .collect();

        let mut policies = vec![None; spec.frames.len()];
        for policy in &spec.policies {
            let frame = frame_of(policy.frame.as_str())?;
            let parse = |action: &str| {
                PolicyAction::parse(action, fire_count).ok_or_else(|| {
                    WildfireError::UnknownPolicyAction {
                        frame: policy.frame.clone(),
                        action: action.to_string(),
                    }
                })
            };
            let rules = policy
                .rules
                .iter()
                .map(|rule| -> Result<PolicyRule, WildfireError> {
                    Ok(PolicyRule {
                        suppressant: rule.suppressant,
                        intensities: rule.intensities.clone(),
                        action: parse(rule.action.as_str())?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let frame_reach = reach
                .iter()
                .zip(&neighbor_frames)
                .map(|(fires, f)| if *f == frame { fires.clone() } else { Vec::new() })
                .collect();
            policies[frame] = Some(TabularPolicy::new(
                rules,
                parse(policy.default.as_str())?,
                frame_reach,
                burned_out.clone(),
            ));
        }

        let enumerator = FireEnumerator {
            radices: fires.iter().map(|fire| usize::from(fire.levels)).collect(),
            suppressant_levels: usize::from(spec.suppressant.levels),
        };
        let initial_state = FireState {
            intensities: spec.fires.iter().map(|fire| fire.initial).collect(),
            suppressant: spec.agent.suppressant.unwrap_or(spec.suppressant.initial),
        };
        let neighbor_levels = spec
            .neighbors
            .iter()
            .map(|n| n.suppressant.unwrap_or(spec.suppressant.initial))
            .collect();

        debug!(
            fires = fire_count,
            frames = spec.frames.len(),
            neighbors = spec.neighbors.len(),
            states = enumerator.state_count(),
            "compiled wildfire scenario"
        );

        Ok(WildfireModel {
            descriptor,
            frame_names: spec.frames.iter().map(|f| f.name.clone()).collect(),
            frame_power: spec.frames.iter().map(|f| f.power).collect(),
            fight_names: all_fires.iter().map(|fire| fight_action(*fire)).collect(),
            fires,
            suppressant: spec.suppressant.clone(),
            rewards: spec.rewards.clone(),
            observation_noise: spec.observation_noise,
            agent_targets,
            policies,
            enumerator,
            initial_state,
            neighbor_levels,
        })
    }

    /// True world state at the start of the scenario.
    pub fn initial_state(&self) -> &FireState {
        &self.initial_state
    }

    /// True starting suppressant of every neighbor, by neighbor index.
    pub fn initial_neighbor_levels(&self) -> &[ResourceLevel] {
        &self.neighbor_levels
    }

    pub fn fire_count(&self) -> usize {
        self.fires.len()
    }

    pub fn frame_name(&self, frame: FrameId) -> Option<&str> {
        self.frame_names.get(frame.index()).map(String::as_str)
    }

    pub fn enumerator(&self) -> &FireEnumerator {
        &self.enumerator
    }

    pub fn policy(&self, frame: FrameId) -> Option<&TabularPolicy> {
        self.policies.get(frame.index())?.as_ref()
    }

    /// Fire targeted by agent action `action`, `None` for noop or unknown actions.
    pub fn agent_target(&self, action: ActionId) -> Option<usize> {
        self.agent_targets.get(action.index()).copied().flatten()
    }

    pub fn is_burned_out(&self, state: &FireState, fire: usize) -> bool {
        match (self.fires.get(fire), state.intensities.get(fire)) {
            (Some(dynamics), Some(intensity)) => dynamics.burned_out(*intensity),
            _ => false,
        }
    }

    /// Suppression power applied to `fire` by the configuration `fac`.
    fn suppression(&self, fac: &Fac, fire: usize) -> f64 {
        self.frame_power
            .iter()
            .enumerate()
            .map(|(f, power)| {
                let crews = fac.count_of(FrameId::from(f), &self.fight_names[fire]).unwrap_or(0);
                f64::from(crews) * power
            })
            .sum()
    }

    fn next_intensity<R: Rng + ?Sized>(
        &self,
        fire: usize,
        intensity: u8,
        power: f64,
        rng: &mut R,
    ) -> Result<u8, ModelError> {
        let dynamics = &self.fires[fire];
        if intensity == 0 {
            let ignite = sample_categorical(
                &[dynamics.ignition, 1.0 - dynamics.ignition],
                "fire ignition",
                rng,
            )?;
            return Ok(if ignite == 0 { 1 } else { 0 });
        }
        if dynamics.burned_out(intensity) {
            return Ok(intensity);
        }

        let p_down = (dynamics.reduction_rate * power).min(1.0);
        let p_up = if intensity < dynamics.top() {
            (1.0 - p_down) * dynamics.spread
        } else {
            0.0
        };
        let outcome = sample_categorical(
            &[p_down, 1.0 - p_down - p_up, p_up],
            "fire intensity",
            rng,
        )?;
        Ok(match outcome {
            0 => intensity - 1,
            1 => intensity,
            _ => intensity + 1,
        })
    }

    /// Suppressant level after one step. Fighting may use up a level; an
    /// empty tank may be refilled to the top.
    pub(crate) fn next_suppressant<R: Rng + ?Sized>(
        &self,
        level: ResourceLevel,
        fought: bool,
        rng: &mut R,
    ) -> Result<ResourceLevel, ModelError> {
        let SuppressantSpec {
            levels,
            depletion,
            recharge,
            ..
        } = self.suppressant;
        if level == 0 {
            let refill = sample_categorical(&[recharge, 1.0 - recharge], "suppressant recharge", rng)?;
            return Ok(if refill == 0 { levels - 1 } else { 0 });
        }
        if !fought {
            return Ok(level);
        }
        let spent = sample_categorical(&[depletion, 1.0 - depletion], "suppressant depletion", rng)?;
        Ok(if spent == 0 { level - 1 } else { level })
    }

    fn observe_intensity<R: Rng + ?Sized>(
        &self,
        fire: usize,
        intensity: u8,
        rng: &mut R,
    ) -> Result<u8, ModelError> {
        if self.observation_noise == 0.0 {
            return Ok(intensity);
        }
        let half = self.observation_noise / 2.0;
        let down = if intensity > 0 { half } else { 0.0 };
        let up = if intensity < self.fires[fire].top() { half } else { 0.0 };
        let outcome = sample_categorical(&[down, 1.0 - down - up, up], "observation noise", rng)?;
        Ok(match outcome {
            0 => intensity - 1,
            1 => intensity,
            _ => intensity + 1,
        })
    }
}

impl Environment for WildfireModel {
    type State = FireState;
    type Observation = FireObservation;

    fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: &FireState,
        action: ActionId,
        fac: &Fac,
        rng: &mut R,
    ) -> Result<FireState, ModelError> {
        if action.index() >= self.agent_targets.len() {
            return Err(ModelError::UnknownAction {
                action: action.index().to_string(),
            });
        }
        let target = self.agent_target(action);
        let agent_power = self
            .frame_power
            .get(self.descriptor.agent().frame.index())
            .copied()
            .unwrap_or(0.0);

        let mut intensities = Vec::with_capacity(state.intensities.len());
        for (fire, intensity) in state.intensities.iter().copied().enumerate() {
            let mut power = self.suppression(fac, fire);
            if target == Some(fire) && state.suppressant == 0 {
                power = (power - agent_power).max(0.0);
            }
            intensities.push(self.next_intensity(fire, intensity, power, rng)?);
        }

        let suppressant = self.next_suppressant(state.suppressant, target.is_some(), rng)?;
        Ok(FireState {
            intensities,
            suppressant,
        })
    }

    fn sample_observation<R: Rng + ?Sized>(
        &self,
        _state: &FireState,
        _action: ActionId,
        _fac: &Fac,
        next_state: &FireState,
        rng: &mut R,
    ) -> Result<FireObservation, ModelError> {
        let intensities = next_state
            .intensities
            .iter()
            .enumerate()
            .map(|(fire, intensity)| self.observe_intensity(fire, *intensity, rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FireObservation {
            intensities,
            suppressant: next_state.suppressant,
        })
    }

    fn reward(&self, state: &FireState, _action: ActionId, _fac: &Fac, next_state: &FireState) -> f64 {
        state
            .intensities
            .iter()
            .zip(&next_state.intensities)
            .zip(&self.fires)
            .map(|((before, after), dynamics)| {
                let mut reward = -self.rewards.intensity_cost * f64::from(*after);
                if *before > 0 && *after == 0 {
                    reward += self.rewards.extinguish;
                }
                if dynamics.burned_out(*after) && !dynamics.burned_out(*before) {
                    reward -= self.rewards.burn_out;
                }
                reward
            })
            .sum()
    }

    fn sample_internal_transition<R: Rng + ?Sized>(
        &self,
        neighbor: NeighborId,
        level: ResourceLevel,
        action: &str,
        rng: &mut R,
    ) -> Result<ResourceLevel, ModelError> {
        if self.descriptor.neighbor(neighbor).is_none() {
            return Err(ModelError::UnknownNeighbor {
                neighbor: neighbor.index(),
            });
        }
        let fought = fight_target(action).is_some();
        self.next_suppressant(level, fought, rng)
    }

    fn max_reward(&self) -> f64 {
        self.rewards.extinguish * self.fires.len() as f64
    }

    fn neighbor_policy(&self, frame: FrameId) -> Option<&dyn NeighborPolicy<FireState>> {
        self.policy(frame).map(|p| p as &dyn NeighborPolicy<FireState>)
    }

    fn state_enumerator(&self) -> Option<&dyn StateEnumerator<FireState>> {
        Some(&self.enumerator)
    }

    fn agent_depleted(&self, state: &FireState) -> bool {
        state.suppressant == 0
    }

    fn action_target_closed(&self, state: &FireState, action: ActionId) -> bool {
        self.agent_target(action).is_some_and(|fire| {
            state.intensities.get(fire) == Some(&0) || self.is_burned_out(state, fire)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::spec::{CrewSpec, FireSpec, PlacementSpec, PolicySpec};

    fn scenario() -> WildfireSpec {
        WildfireSpec {
            version: Some(1),
            fires: vec![
                FireSpec {
                    levels: 3,
                    initial: 1,
                    ignition: 0.0,
                    spread: 0.0,
                    reduction_rate: 1.0,
                    burn_out: false,
                },
                FireSpec {
                    levels: 3,
                    initial: 2,
                    ignition: 0.0,
                    spread: 0.0,
                    reduction_rate: 0.0,
                    burn_out: true,
                },
            ],
            suppressant: SuppressantSpec {
                levels: 3,
                initial: 2,
                depletion: 0.0,
                recharge: 0.0,
            },
            frames: vec![CrewSpec {
                name: "ground".into(),
                power: 1.0,
            }],
            agent: PlacementSpec {
                frame: "ground".into(),
                fires: vec![0, 1],
                suppressant: None,
            },
            neighbors: vec![PlacementSpec {
                frame: "ground".into(),
                fires: vec![0],
                suppressant: None,
            }],
            rewards: RewardSpec::default(),
            observation_noise: 0.0,
            policies: vec![PolicySpec {
                frame: "ground".into(),
                default: "fight_0".into(),
                rules: Vec::new(),
            }],
        }
    }

    fn joint(model: &WildfireModel, neighbor_action: &str, agent_action: &str) -> Fac {
        let descriptor = model.descriptor();
        let neighbors = Arc::new(descriptor.neighbor_layout());
        let joint = Arc::new(descriptor.joint_layout());
        let mut fac = Fac::empty(neighbors);
        fac.put(FrameId::from(0), neighbor_action, 1).unwrap();
        fac.merge_action(&joint, FrameId::from(0), agent_action).unwrap()
    }

    #[test]
    fn compiled_actions_follow_reach() {
        let model = scenario().compile().unwrap();
        let descriptor = model.descriptor();
        assert_eq!(descriptor.agent().actions, vec!["noop", "fight_0", "fight_1"]);
        assert_eq!(descriptor.neighbors()[0].actions, vec!["noop", "fight_0"]);
        assert_eq!(model.agent_target(ActionId::from(2)), Some(1));
        assert_eq!(model.agent_target(ActionId::from(0)), None);
        assert_eq!(model.max_reward(), 40.0);
    }

    #[test]
    fn a_fought_fire_goes_out_and_pays_the_extinguish_reward() {
        let model = scenario().compile().unwrap();
        let state = model.initial_state().clone();
        let fac = joint(&model, "fight_0", "noop");
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let next = model
            .sample_next_state(&state, ActionId::from(0), &fac, &mut rng)
            .unwrap();
        assert_eq!(next.intensities, vec![0, 2]);
        assert_eq!(next.suppressant, 2);
        // +20 for fire 0, -2 for the burned-out fire 1
        let reward = model.reward(&state, ActionId::from(0), &fac, &next);
        assert!((reward - 18.0).abs() < 1e-9);
    }

    #[test]
    fn a_depleted_agent_adds_no_power() {
        let mut spec = scenario();
        spec.fires[0].reduction_rate = 0.5;
        spec.neighbors.clear();
        spec.policies.clear();
        let model = spec.compile().unwrap();
        let state = FireState {
            intensities: vec![1, 0],
            suppressant: 0,
        };
        let joint_layout = Arc::new(model.descriptor().joint_layout());
        let fac = Fac::empty(Arc::new(model.descriptor().neighbor_layout()))
            .merge_action(&joint_layout, FrameId::from(0), "fight_0")
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..32 {
            let next = model
                .sample_next_state(&state, ActionId::from(1), &fac, &mut rng)
                .unwrap();
            assert_eq!(next.intensities[0], 1);
        }
        assert!(model.agent_depleted(&state));
    }

    #[test]
    fn closed_targets_are_reported() {
        let model = scenario().compile().unwrap();
        let state = FireState {
            intensities: vec![0, 2],
            suppressant: 1,
        };
        assert!(model.action_target_closed(&state, ActionId::from(1)));
        assert!(model.action_target_closed(&state, ActionId::from(2)));
        assert!(!model.action_target_closed(&state, ActionId::from(0)));
    }

    #[test]
    fn enumeration_is_dense_and_invertible() {
        let model = scenario().compile().unwrap();
        let enumerator = model.enumerator();
        let states = enumerator.enumerated_states();
        assert_eq!(states.len(), 27);
        for (idx, state) in states.iter().enumerate() {
            assert_eq!(enumerator.enumerated_id(state), Some(idx));
        }
        let outside = FireState {
            intensities: vec![3, 0],
            suppressant: 0,
        };
        assert_eq!(enumerator.enumerated_id(&outside), None);
    }

    #[test]
    fn empty_tanks_refill_only_through_recharge() {
        let mut spec = scenario();
        spec.suppressant.recharge = 1.0;
        spec.suppressant.depletion = 1.0;
        let model = spec.compile().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let neighbor = NeighborId::from(0);
        assert_eq!(model.sample_internal_transition(neighbor, 0, "noop", &mut rng).unwrap(), 2);
        assert_eq!(model.sample_internal_transition(neighbor, 2, "fight_0", &mut rng).unwrap(), 1);
        assert_eq!(model.sample_internal_transition(neighbor, 2, "noop", &mut rng).unwrap(), 2);
        assert!(
            model
                .sample_internal_transition(NeighborId::from(4), 1, "noop", &mut rng)
                .is_err()
        );
    }
}
