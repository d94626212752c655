use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{belief::MentalModelPrior, model::checked_mass, rollout::RolloutParams};

const DEFAULT_PLANNER_CONFIG_YAML: &str = include_str!("../../config/planner.default.yaml");

/// Construction parameters of a [`Planner`](crate::Planner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Discounted contributions below this are cut off.
    pub epsilon: f64,
    pub gamma: f64,
    pub exploration_constant: f64,
    pub max_horizon: usize,
    /// Wall-clock budget of one decision.
    pub time_bound_ms: u64,
    /// Optional iteration cap, checked alongside the time budget.
    pub max_iterations: Option<usize>,
    pub particle_count: usize,
    pub confidence_alpha: f64,
    pub sampling_error_bound: f64,
    pub single_configuration_mode: bool,
    pub averaged_q_action_selection: bool,
    pub seed: u64,
    pub mental_model_prior: MentalModelPrior,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            epsilon: 0.01,
            gamma: 0.9,
            exploration_constant: 10.0,
            max_horizon: 10,
            time_bound_ms: 1_000,
            max_iterations: None,
            particle_count: 1_000,
            confidence_alpha: 0.05,
            sampling_error_bound: 0.1,
            single_configuration_mode: false,
            averaged_q_action_selection: true,
            seed: 0,
            mental_model_prior: MentalModelPrior::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse a planner config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a planner config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_PLANNER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, ConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 || self.gamma > 1.0 {
            return Err(ConfigError::Invalid("gamma must be in (0, 1]".to_string()));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigError::Invalid(
                "epsilon must be finite and >= 0".to_string(),
            ));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::Invalid(
                "exploration_constant must be finite and >= 0".to_string(),
            ));
        }
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid(
                "particle_count must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.confidence_alpha) {
            return Err(ConfigError::Invalid(
                "confidence_alpha must be in [0, 1)".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.sampling_error_bound) {
            return Err(ConfigError::Invalid(
                "sampling_error_bound must be in [0, 1)".to_string(),
            ));
        }
        if self.time_bound_ms == 0 && self.max_iterations.is_none() {
            return Err(ConfigError::Invalid(
                "time_bound_ms must be greater than 0 unless max_iterations is set".to_string(),
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::Invalid(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if let MentalModelPrior::Categorical { probabilities } = &self.mental_model_prior {
            checked_mass(probabilities, "mental model prior")
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        Ok(())
    }

    pub(crate) fn rollout_params(&self) -> RolloutParams {
        RolloutParams {
            gamma: self.gamma,
            epsilon: self.epsilon,
            max_horizon: self.max_horizon,
        }
    }
}

/// Error type for loading and validating `PlannerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid planner config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_matches_the_rust_default() {
        let parsed = PlannerConfig::from_default_yaml().expect("default yaml parses");
        assert_eq!(parsed, PlannerConfig::default());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = PlannerConfig::from_yaml_str(
            "gamma: 0.5\nmax_iterations: 200\nmental_model_prior:\n  kind: categorical\n  probabilities: [0.25, 0.75]\n",
        )
        .unwrap();
        assert_eq!(config.gamma, 0.5);
        assert_eq!(config.max_iterations, Some(200));
        assert_eq!(config.particle_count, 1_000);
        assert_eq!(
            config.mental_model_prior,
            MentalModelPrior::Categorical {
                probabilities: vec![0.25, 0.75]
            }
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        for yaml in [
            "gamma: 0.0",
            "gamma: 1.5",
            "particle_count: 0",
            "confidence_alpha: 1.0",
            "time_bound_ms: 0",
            "max_iterations: 0",
            "mental_model_prior:\n  kind: categorical\n  probabilities: [0.5, 0.2]",
        ] {
            let err = PlannerConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}: {err}");
        }
        assert!(matches!(
            PlannerConfig::from_yaml_str("gamma: [1").unwrap_err(),
            ConfigError::Yaml(_)
        ));
    }

    #[test]
    fn yaml_round_trips() {
        let config = PlannerConfig {
            seed: 7,
            single_configuration_mode: true,
            ..PlannerConfig::default()
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(PlannerConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
