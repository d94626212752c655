use rayon::prelude::*;

use crate::{
    error::PlanError,
    model::Environment,
    planner::{Decision, Planner},
};

/// Run one decision for every planner on the rayon pool.
///
/// Planners share no state. Results keep the input order.
pub fn plan_all<E>(planners: &mut [Planner<E>]) -> Vec<Result<Decision, PlanError>>
where
    E: Environment + Send,
    E::State: Send,
    E::Observation: Send,
{
    planners
        .par_iter_mut()
        .map(|planner| planner.choose_action())
        .collect()
}
