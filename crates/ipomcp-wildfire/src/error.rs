use ipomcp_core::{DescriptorError, FacError, ModelError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for wildfire loading, validation, compilation, builder and simulator operations.
pub enum WildfireError {
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("scenario declares no fires")]
    NoFires,

    #[error("scenario declares no frames")]
    NoFrames,

    #[error("fire {fire} needs at least 2 intensity levels, got {levels}")]
    TooFewLevels { fire: usize, levels: u8 },

    #[error("fire {fire} starts at intensity {initial} but only has {levels} levels")]
    InitialIntensityOutOfRange { fire: usize, initial: u8, levels: u8 },

    #[error("suppressant needs at least 1 level, and the initial level {initial} must be below {levels}")]
    InvalidSuppressant { initial: u8, levels: u8 },

    #[error("invalid probability for {context}: {value}")]
    InvalidProbability { context: String, value: f64 },

    #[error("invalid value for {context}: {value}")]
    InvalidValue { context: String, value: f64 },

    #[error("duplicate frame '{frame}'")]
    DuplicateFrame { frame: String },

    #[error("{owner} references unknown frame '{frame}'")]
    UnknownFrame { owner: String, frame: String },

    #[error("{owner} references unknown fire {fire}")]
    UnknownFire { owner: String, fire: usize },

    #[error("{owner} cannot reach any fire")]
    NoReachableFire { owner: String },

    #[error("frame '{frame}' declares more than one policy")]
    DuplicatePolicy { frame: String },

    #[error("frame '{frame}' has no policy but has neighbors")]
    MissingPolicy { frame: String },

    #[error("policy of frame '{frame}' uses unknown action '{action}'")]
    UnknownPolicyAction { frame: String, action: String },

    #[error("policy rule of frame '{frame}' matches {got} intensities, the scenario has {expected} fires")]
    RuleArity {
        frame: String,
        expected: usize,
        got: usize,
    },

    #[error("builder is missing the planning agent")]
    BuilderMissingAgent,

    #[error("builder referenced unknown frame '{frame}'")]
    BuilderUnknownFrame { frame: String },

    #[error("agent action {action} is not available")]
    UnknownAgentAction { action: usize },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Fac(#[from] FacError),
}
