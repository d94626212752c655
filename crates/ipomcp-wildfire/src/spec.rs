use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{WildfireError, WildfireModel, policy::PolicyAction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Serializable wildfire scenario used for YAML IO and validation.
pub struct WildfireSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub fires: Vec<FireSpec>,
    #[serde(default)]
    pub suppressant: SuppressantSpec,
    /// Agent types and the suppression power each member contributes.
    pub frames: Vec<CrewSpec>,
    pub agent: PlacementSpec,
    #[serde(default)]
    pub neighbors: Vec<PlacementSpec>,
    #[serde(default)]
    pub rewards: RewardSpec,
    /// Chance that an observed fire intensity is off by one level.
    #[serde(default)]
    pub observation_noise: f64,
    #[serde(default)]
    pub policies: Vec<PolicySpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One fire. Intensity 0 means no fire, `levels - 1` is the most intense.
pub struct FireSpec {
    pub levels: u8,
    #[serde(default = "default_initial_intensity")]
    pub initial: u8,
    /// Chance that an extinguished fire reignites each step.
    #[serde(default)]
    pub ignition: f64,
    /// Chance that an unsuppressed fire grows by one level each step.
    #[serde(default)]
    pub spread: f64,
    /// Chance of dropping one level per unit of suppression power.
    pub reduction_rate: f64,
    /// When set, the top level is absorbing: the fire has burned out.
    #[serde(default)]
    pub burn_out: bool,
}

fn default_initial_intensity() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Suppressant carried by every agent. Level 0 means empty.
pub struct SuppressantSpec {
    pub levels: u8,
    pub initial: u8,
    /// Chance of losing one level after fighting.
    pub depletion: f64,
    /// Chance that an empty agent refills to the top level.
    pub recharge: f64,
}

impl Default for SuppressantSpec {
    fn default() -> Self {
        SuppressantSpec {
            levels: 3,
            initial: 2,
            depletion: 0.3,
            recharge: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    #[serde(default = "default_power")]
    pub power: f64,
}

fn default_power() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Where an agent works: its frame and the fires it can reach.
pub struct PlacementSpec {
    pub frame: String,
    pub fires: Vec<usize>,
    /// True starting suppressant; defaults to `suppressant.initial`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressant: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSpec {
    pub extinguish: f64,
    /// Cost per intensity level still burning after a step.
    pub intensity_cost: f64,
    /// Penalty when a fire burns out.
    pub burn_out: f64,
}

impl Default for RewardSpec {
    fn default() -> Self {
        RewardSpec {
            extinguish: 20.0,
            intensity_cost: 1.0,
            burn_out: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Tabular policy shared by every neighbor of one frame.
/// Rules are tried in order; the first match wins.
pub struct PolicySpec {
    pub frame: String,
    pub default: String,
    #[serde(default)]
    pub rules: Vec<PolicyRuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// `action` is `noop`, `fight_<fire>` or `fight_hottest`.
pub struct PolicyRuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressant: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensities: Option<Vec<u8>>,
    pub action: String,
}

fn check_probability(context: impl Into<String>, value: f64) -> Result<(), WildfireError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(WildfireError::InvalidProbability {
            context: context.into(),
            value,
        });
    }
    Ok(())
}

fn check_non_negative(context: impl Into<String>, value: f64) -> Result<(), WildfireError> {
    if !value.is_finite() || value < 0.0 {
        return Err(WildfireError::InvalidValue {
            context: context.into(),
            value,
        });
    }
    Ok(())
}

impl WildfireSpec {
    /// Validate ids, ranges, probabilities and policies.
    pub fn validate(&self) -> Result<(), WildfireError> {
        if self.fires.is_empty() {
            return Err(WildfireError::NoFires);
        }
        for (idx, fire) in self.fires.iter().enumerate() {
            if fire.levels < 2 {
                return Err(WildfireError::TooFewLevels {
                    fire: idx,
                    levels: fire.levels,
                });
            }
            if fire.initial >= fire.levels {
                return Err(WildfireError::InitialIntensityOutOfRange {
                    fire: idx,
                    initial: fire.initial,
                    levels: fire.levels,
                });
            }
            check_probability(format!("fire {idx} ignition"), fire.ignition)?;
            check_probability(format!("fire {idx} spread"), fire.spread)?;
            check_non_negative(format!("fire {idx} reduction_rate"), fire.reduction_rate)?;
        }

        let suppressant = &self.suppressant;
        if suppressant.levels == 0 || suppressant.initial >= suppressant.levels {
            return Err(WildfireError::InvalidSuppressant {
                initial: suppressant.initial,
                levels: suppressant.levels,
            });
        }
        check_probability("suppressant depletion", suppressant.depletion)?;
        check_probability("suppressant recharge", suppressant.recharge)?;

        if self.frames.is_empty() {
            return Err(WildfireError::NoFrames);
        }
        let mut names = HashSet::with_capacity(self.frames.len());
        for frame in &self.frames {
            if !names.insert(frame.name.as_str()) {
                return Err(WildfireError::DuplicateFrame {
                    frame: frame.name.clone(),
                });
            }
            check_non_negative(format!("frame '{}' power", frame.name), frame.power)?;
        }

        self.validate_placement("agent", &self.agent)?;
        for (idx, neighbor) in self.neighbors.iter().enumerate() {
            self.validate_placement(&format!("neighbor {idx}"), neighbor)?;
        }

        check_non_negative("extinguish reward", self.rewards.extinguish)?;
        check_non_negative("intensity cost", self.rewards.intensity_cost)?;
        check_non_negative("burn-out penalty", self.rewards.burn_out)?;
        check_probability("observation noise", self.observation_noise)?;

        let mut with_policy = HashSet::new();
        for policy in &self.policies {
            if !names.contains(policy.frame.as_str()) {
                return Err(WildfireError::UnknownFrame {
                    owner: "policy".to_string(),
                    frame: policy.frame.clone(),
                });
            }
            if !with_policy.insert(policy.frame.as_str()) {
                return Err(WildfireError::DuplicatePolicy {
                    frame: policy.frame.clone(),
                });
            }
            self.check_policy_action(&policy.frame, &policy.default)?;
            for rule in &policy.rules {
                self.check_policy_action(&policy.frame, &rule.action)?;
                if let Some(intensities) = &rule.intensities {
                    if intensities.len() != self.fires.len() {
                        return Err(WildfireError::RuleArity {
                            frame: policy.frame.clone(),
                            expected: self.fires.len(),
                            got: intensities.len(),
                        });
                    }
                }
            }
        }
        for neighbor in &self.neighbors {
            if !with_policy.contains(neighbor.frame.as_str()) {
                return Err(WildfireError::MissingPolicy {
                    frame: neighbor.frame.clone(),
                });
            }
        }

        Ok(())
    }

    fn validate_placement(&self, owner: &str, placement: &PlacementSpec) -> Result<(), WildfireError> {
        if !self.frames.iter().any(|f| f.name == placement.frame) {
            return Err(WildfireError::UnknownFrame {
                owner: owner.to_string(),
                frame: placement.frame.clone(),
            });
        }
        if placement.fires.is_empty() {
            return Err(WildfireError::NoReachableFire {
                owner: owner.to_string(),
            });
        }
        if let Some(fire) = placement.fires.iter().find(|f| **f >= self.fires.len()) {
            return Err(WildfireError::UnknownFire {
                owner: owner.to_string(),
                fire: *fire,
            });
        }
        if let Some(level) = placement.suppressant {
            if level >= self.suppressant.levels {
                return Err(WildfireError::InvalidSuppressant {
                    initial: level,
                    levels: self.suppressant.levels,
                });
            }
        }
        Ok(())
    }

    fn check_policy_action(&self, frame: &str, action: &str) -> Result<(), WildfireError> {
        PolicyAction::parse(action, self.fires.len())
            .map(|_| ())
            .ok_or_else(|| WildfireError::UnknownPolicyAction {
                frame: frame.to_string(),
                action: action.to_string(),
            })
    }

    /// Compile this spec into the runtime model.
    pub fn compile(&self) -> Result<WildfireModel, WildfireError> {
        WildfireModel::from_spec(self)
    }
}
