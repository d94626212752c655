use thiserror::Error;

use crate::{planner::config::ConfigError, tree::error::TreeError};

/// Error type for environment descriptor validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor declares no frames")]
    NoFrames,

    #[error("unknown frame index {frame}")]
    UnknownFrame { frame: usize },

    #[error("frame '{frame}' declares action '{action}' twice")]
    DuplicateAction { frame: String, action: String },

    #[error("frame '{frame}' does not declare the noop action '{noop}'")]
    MissingNoop { frame: String, noop: String },

    #[error("action '{action}' is not declared by frame '{frame}'")]
    UnknownAction { frame: String, action: String },

    #[error("neighbor {neighbor} cannot take the noop action")]
    NeighborWithoutNoop { neighbor: usize },

    #[error("neighbor {neighbor} references unknown resource {resource}")]
    UnknownResource { neighbor: usize, resource: usize },

    #[error("the planning agent has no actions")]
    NoAgentActions,
}

/// Error type for FAC construction, filling and extrapolation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacError {
    #[error("no capacity entry for action '{action}' of frame {frame}")]
    UnknownEntry { frame: usize, action: String },

    #[error("no capacity entry at index {index}")]
    UnknownIndex { index: usize },

    #[error("count {count} for action '{action}' of frame {frame} exceeds capacity {max_count}")]
    CapacityExceeded {
        frame: usize,
        action: String,
        count: u32,
        max_count: u32,
    },

    #[error("frame {frame} would hold {total} agents but its population is {population}")]
    PopulationExceeded {
        frame: usize,
        total: u32,
        population: u32,
    },

    #[error("frame {frame} holds {total} agents but its population is {population}")]
    NotFilled {
        frame: usize,
        total: u32,
        population: u32,
    },

    #[error(
        "capacity exhausted for frame {frame} after placing {placed} of {population} agents"
    )]
    CapacityExhausted {
        frame: usize,
        placed: u32,
        population: u32,
    },

    #[error("layout has {actual} entries, expected {expected}")]
    LayoutMismatch { expected: usize, actual: usize },
}

/// Error type raised by environment models and the sampling helpers they use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("probabilities for {context} sum to {sum}, outside {tolerance} of 1.0")]
    ProbabilityMass {
        context: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("invalid probability {value} in {context}")]
    InvalidProbability { context: String, value: f64 },

    #[error("no neighbor policy for frame {frame}")]
    MissingPolicy { frame: usize },

    #[error("unknown neighbor {neighbor}")]
    UnknownNeighbor { neighbor: usize },

    #[error("unknown action '{action}'")]
    UnknownAction { action: String },

    #[error("{0}")]
    Invalid(String),
}

/// Error surfaced by the planner's public entry points.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("planning failed: invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("planning failed: invalid environment descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("planning failed: configuration sampling: {0}")]
    Fac(#[from] FacError),

    #[error("planning failed: environment model: {0}")]
    Model(#[from] ModelError),

    #[error("planning failed: search tree: {0}")]
    Tree(#[from] TreeError),

    #[error("planning failed: the belief holds no particles")]
    EmptyBelief,

    #[error("planning failed: action {action} is not available to the agent")]
    UnknownAction { action: usize },

    #[error("planning failed: observation {observation} was never branched under action {action}")]
    UnobservedObservation { action: usize, observation: String },
}
