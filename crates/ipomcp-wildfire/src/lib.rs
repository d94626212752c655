//! Wildfire suppression environment for the I-POMCP planner.
//!
//! Agents of several frames fight a shared set of fires. Each agent carries a
//! suppressant tank; neighbors follow per-frame tabular policies.

mod builder;
mod error;
mod io;
mod model;
mod policy;
mod simulator;
mod spec;

pub use builder::WildfireBuilder;
pub use error::WildfireError;
pub use io::{compile_yaml, load_yaml, save_yaml};
pub use model::{FireEnumerator, FireObservation, FireState, WildfireModel};
pub use policy::{PolicyAction, TabularPolicy, fight_action, fight_target};
pub use simulator::{StepOutcome, WildfireSimulator};
pub use spec::{
    CrewSpec, FireSpec, PlacementSpec, PolicyRuleSpec, PolicySpec, RewardSpec, SuppressantSpec,
    WildfireSpec,
};
