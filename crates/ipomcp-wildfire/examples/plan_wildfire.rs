use std::path::PathBuf;

use ipomcp_core::{PlanError, Planner, PlannerConfig};
use ipomcp_wildfire::{FireState, WildfireSimulator, compile_yaml};

const EPOCHS: usize = 10;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/ipomcp-wildfire/scenarios/ridge.wildfire.yaml"));

    let model = compile_yaml(&path).expect("failed to compile wildfire YAML");
    let config = PlannerConfig {
        time_bound_ms: 200,
        particle_count: 500,
        max_horizon: 6,
        ..PlannerConfig::from_default_yaml().expect("default config is valid")
    };

    let mut world = WildfireSimulator::new(model.clone(), 12345);
    let mut planner = Planner::new(model.clone(), config.clone(), world.state().clone())
        .expect("planner construction failed");

    let mut total = 0.0;
    for epoch in 0..EPOCHS {
        let decision = planner.choose_action().expect("search failed");
        let outcome = world.step(decision.action).expect("world step failed");
        total += outcome.reward;

        println!(
            "epoch={epoch} action={} iterations={} nodes={} reward={:.2} observed={:?} neighbors={:?}",
            decision.action_name,
            decision.metrics.iterations,
            decision.metrics.node_count,
            outcome.reward,
            outcome.observation.intensities,
            outcome.neighbor_actions,
        );

        match planner.update_belief(decision.action, &outcome.observation) {
            Ok(()) => {}
            Err(PlanError::UnobservedObservation { .. }) => {
                // The search never produced this observation; restart from what was seen.
                let observed = FireState {
                    intensities: outcome.observation.intensities.clone(),
                    suppressant: outcome.observation.suppressant,
                };
                planner = Planner::new(model.clone(), config.clone(), observed)
                    .expect("planner construction failed");
                println!("epoch={epoch} belief reset from observation");
            }
            Err(err) => panic!("belief update failed: {err}"),
        }

        if world.is_clear() {
            break;
        }
    }

    println!("steps={} total_reward={total:.2}", world.steps());
}
