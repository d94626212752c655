//! Small deterministic fire model shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::{
    descriptor::{AgentSpec, EnvironmentDescriptor, FrameId, FrameSpec, NeighborId, NeighborSpec, ResourceId},
    error::ModelError,
    fac::Fac,
    model::{Environment, NeighborPolicy, ResourceLevel, StateEnumerator, sample_categorical},
    tree::ids::ActionId,
};

pub(crate) const EXTINGUISH_REWARD: f64 = 10.0;
pub(crate) const SUPPLY_LEVELS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ToyState {
    pub intensities: Vec<u8>,
    pub supply: u8,
}

pub(crate) struct FixedPolicy {
    active: String,
    idle: String,
}

impl NeighborPolicy<ToyState> for FixedPolicy {
    fn action(&self, _state: &ToyState, _neighbor: NeighborId, level: ResourceLevel) -> &str {
        if level > 0 { &self.active } else { &self.idle }
    }
}

pub(crate) struct ToyEnumerator {
    fires: usize,
    max_intensity: u8,
}

impl StateEnumerator<ToyState> for ToyEnumerator {
    fn enumerated_id(&self, state: &ToyState) -> Option<usize> {
        let radix = self.max_intensity as usize + 1;
        let mut id = state.supply as usize;
        let mut scale = SUPPLY_LEVELS as usize;
        for i in &state.intensities {
            id += *i as usize * scale;
            scale *= radix;
        }
        Some(id)
    }

    fn enumerated_states(&self) -> Vec<ToyState> {
        let radix = self.max_intensity as usize + 1;
        let combos = radix.pow(self.fires as u32);
        let mut states = Vec::new();
        for combo in 0..combos {
            let mut rest = combo;
            let intensities = (0..self.fires)
                .map(|_| {
                    let level = (rest % radix) as u8;
                    rest /= radix;
                    level
                })
                .collect::<Vec<_>>();
            for supply in 0..SUPPLY_LEVELS {
                states.push(ToyState {
                    intensities: intensities.clone(),
                    supply,
                });
            }
        }
        states
    }
}

/// One frame ("crew"), `fires` fires, every agent can fight every fire.
/// A fire drops one level with probability `min(1, crews * reduction_rate)`.
pub(crate) struct ToyFire {
    descriptor: EnvironmentDescriptor,
    reduction_rate: f64,
    policy: FixedPolicy,
    enumerator: ToyEnumerator,
    calls: AtomicUsize,
}

impl ToyFire {
    pub fn new(neighbors: usize, fires: usize, max_intensity: u8, neighbor_action: &str) -> Self {
        let mut actions = vec!["noop".to_string()];
        actions.extend((0..fires).map(|r| format!("fight_{r}")));

        let descriptor = EnvironmentDescriptor::new(
            vec![FrameSpec {
                name: "crew".into(),
                actions: actions.clone(),
            }],
            (0..neighbors)
                .map(|_| NeighborSpec {
                    frame: FrameId::from(0),
                    actions: actions.clone(),
                    resources: (0..fires).map(ResourceId::from).collect(),
                })
                .collect(),
            AgentSpec {
                frame: FrameId::from(0),
                actions,
            },
            fires,
            "noop",
        )
        .expect("toy descriptor is valid");

        ToyFire {
            descriptor,
            reduction_rate: 1.0,
            policy: FixedPolicy {
                active: neighbor_action.to_string(),
                idle: "noop".to_string(),
            },
            enumerator: ToyEnumerator {
                fires,
                max_intensity,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_reduction_rate(mut self, rate: f64) -> Self {
        self.reduction_rate = rate;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Environment for ToyFire {
    type State = ToyState;
    type Observation = Vec<u8>;

    fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: &ToyState,
        action: ActionId,
        fac: &Fac,
        rng: &mut R,
    ) -> Result<ToyState, ModelError> {
        self.touch();
        let crew = FrameId::from(0);
        let own = self.descriptor.agent_action_name(action).unwrap_or("noop");

        let mut intensities = Vec::with_capacity(state.intensities.len());
        for (r, intensity) in state.intensities.iter().copied().enumerate() {
            if intensity == 0 {
                intensities.push(0);
                continue;
            }
            let target = format!("fight_{r}");
            let mut crews = fac.count_of(crew, &target).unwrap_or(0);
            if own == target && state.supply == 0 {
                crews = crews.saturating_sub(1);
            }
            let p_down = (f64::from(crews) * self.reduction_rate).min(1.0);
            let outcome = sample_categorical(&[p_down, 1.0 - p_down], "toy fire", rng)?;
            intensities.push(if outcome == 0 { intensity - 1 } else { intensity });
        }

        Ok(ToyState {
            intensities,
            supply: state.supply,
        })
    }

    fn sample_observation<R: Rng + ?Sized>(
        &self,
        _state: &ToyState,
        _action: ActionId,
        _fac: &Fac,
        next_state: &ToyState,
        _rng: &mut R,
    ) -> Result<Vec<u8>, ModelError> {
        self.touch();
        Ok(next_state.intensities.clone())
    }

    fn reward(&self, state: &ToyState, _action: ActionId, _fac: &Fac, next: &ToyState) -> f64 {
        self.touch();
        state
            .intensities
            .iter()
            .zip(next.intensities.iter())
            .map(|(before, after)| {
                let bonus = if *before > 0 && *after == 0 {
                    EXTINGUISH_REWARD
                } else {
                    0.0
                };
                bonus - f64::from(*after)
            })
            .sum()
    }

    fn sample_internal_transition<R: Rng + ?Sized>(
        &self,
        _neighbor: NeighborId,
        level: ResourceLevel,
        _action: &str,
        _rng: &mut R,
    ) -> Result<ResourceLevel, ModelError> {
        self.touch();
        Ok(level)
    }

    fn max_reward(&self) -> f64 {
        EXTINGUISH_REWARD * self.descriptor.resource_count() as f64
    }

    fn neighbor_policy(&self, _frame: FrameId) -> Option<&dyn NeighborPolicy<ToyState>> {
        Some(&self.policy)
    }

    fn state_enumerator(&self) -> Option<&dyn StateEnumerator<ToyState>> {
        Some(&self.enumerator)
    }

    fn agent_depleted(&self, state: &ToyState) -> bool {
        state.supply == 0
    }

    fn action_target_closed(&self, state: &ToyState, action: ActionId) -> bool {
        let Some(name) = self.descriptor.agent_action_name(action) else {
            return false;
        };
        name.strip_prefix("fight_")
            .and_then(|r| r.parse::<usize>().ok())
            .and_then(|r| state.intensities.get(r))
            .is_some_and(|intensity| *intensity == 0)
    }
}
