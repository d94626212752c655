use crate::{
    WildfireError, WildfireModel, WildfireSpec,
    spec::{
        CrewSpec, FireSpec, PlacementSpec, PolicyRuleSpec, PolicySpec, RewardSpec, SuppressantSpec,
    },
};

#[derive(Debug, Clone, Default)]
/// Struct to build wildfire scenarios in code
pub struct WildfireBuilder {
    fires: Vec<FireSpec>,
    suppressant: SuppressantSpec,
    frames: Vec<CrewSpec>,
    agent: Option<PlacementSpec>,
    neighbors: Vec<PlacementSpec>,
    rewards: RewardSpec,
    observation_noise: f64,
    policies: Vec<PolicySpec>,
}

impl WildfireBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fire with `levels` intensity levels starting at `initial`.
    /// It is fought down at `reduction_rate` per unit of power and never spreads.
    pub fn add_fire(&mut self, levels: u8, initial: u8, reduction_rate: f64) -> &mut Self {
        self.fires.push(FireSpec {
            levels,
            initial,
            ignition: 0.0,
            spread: 0.0,
            reduction_rate,
            burn_out: false,
        });
        self
    }

    /// Set how the fire at index `fire` evolves when left alone.
    pub fn set_fire_dynamics(
        &mut self,
        fire: usize,
        ignition: f64,
        spread: f64,
        burn_out: bool,
    ) -> Result<&mut Self, WildfireError> {
        let spec = self
            .fires
            .get_mut(fire)
            .ok_or_else(|| WildfireError::UnknownFire {
                owner: "builder".to_string(),
                fire,
            })?;
        spec.ignition = ignition;
        spec.spread = spread;
        spec.burn_out = burn_out;
        Ok(self)
    }

    /// Add an agent type whose members each contribute `power`.
    pub fn add_frame(&mut self, name: impl Into<String>, power: f64) -> &mut Self {
        self.frames.push(CrewSpec {
            name: name.into(),
            power,
        });
        self
    }

    fn known_frame(&self, frame: &str) -> Result<(), WildfireError> {
        if self.frames.iter().any(|f| f.name == frame) {
            Ok(())
        } else {
            Err(WildfireError::BuilderUnknownFrame {
                frame: frame.to_string(),
            })
        }
    }

    /// Place the planning agent.
    pub fn set_agent(
        &mut self,
        frame: impl Into<String>,
        fires: impl IntoIterator<Item = usize>,
    ) -> Result<&mut Self, WildfireError> {
        let frame = frame.into();
        self.known_frame(&frame)?;
        self.agent = Some(PlacementSpec {
            frame,
            fires: fires.into_iter().collect(),
            suppressant: None,
        });
        Ok(self)
    }

    pub fn add_neighbor(
        &mut self,
        frame: impl Into<String>,
        fires: impl IntoIterator<Item = usize>,
    ) -> Result<&mut Self, WildfireError> {
        let frame = frame.into();
        self.known_frame(&frame)?;
        self.neighbors.push(PlacementSpec {
            frame,
            fires: fires.into_iter().collect(),
            suppressant: None,
        });
        Ok(self)
    }

    pub fn set_suppressant(
        &mut self,
        levels: u8,
        initial: u8,
        depletion: f64,
        recharge: f64,
    ) -> &mut Self {
        self.suppressant = SuppressantSpec {
            levels,
            initial,
            depletion,
            recharge,
        };
        self
    }

    pub fn set_rewards(&mut self, extinguish: f64, intensity_cost: f64, burn_out: f64) -> &mut Self {
        self.rewards = RewardSpec {
            extinguish,
            intensity_cost,
            burn_out,
        };
        self
    }

    pub fn set_observation_noise(&mut self, noise: f64) -> &mut Self {
        self.observation_noise = noise;
        self
    }

    fn policy_mut(&mut self, frame: &str) -> Result<&mut PolicySpec, WildfireError> {
        self.known_frame(frame)?;
        let idx = match self.policies.iter().position(|p| p.frame == frame) {
            Some(idx) => idx,
            None => {
                self.policies.push(PolicySpec {
                    frame: frame.to_string(),
                    default: "noop".to_string(),
                    rules: Vec::new(),
                });
                self.policies.len() - 1
            }
        };
        Ok(&mut self.policies[idx])
    }

    /// Action members of `frame` take when no rule matches.
    pub fn set_policy_default(
        &mut self,
        frame: impl AsRef<str>,
        action: impl Into<String>,
    ) -> Result<&mut Self, WildfireError> {
        self.policy_mut(frame.as_ref())?.default = action.into();
        Ok(self)
    }

    /// Append a policy rule for `frame`. `None` matches anything.
    pub fn add_policy_rule(
        &mut self,
        frame: impl AsRef<str>,
        suppressant: Option<u8>,
        intensities: Option<Vec<u8>>,
        action: impl Into<String>,
    ) -> Result<&mut Self, WildfireError> {
        self.policy_mut(frame.as_ref())?.rules.push(PolicyRuleSpec {
            suppressant,
            intensities,
            action: action.into(),
        });
        Ok(self)
    }

    pub fn build_spec(self) -> Result<WildfireSpec, WildfireError> {
        let agent = self.agent.ok_or(WildfireError::BuilderMissingAgent)?;
        let spec = WildfireSpec {
            version: Some(1),
            fires: self.fires,
            suppressant: self.suppressant,
            frames: self.frames,
            agent,
            neighbors: self.neighbors,
            rewards: self.rewards,
            observation_noise: self.observation_noise,
            policies: self.policies,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn compile(self) -> Result<WildfireModel, WildfireError> {
        let spec = self.build_spec()?;
        spec.compile()
    }
}
