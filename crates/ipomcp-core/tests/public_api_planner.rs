use ipomcp_core::{
    ActionId, AgentSpec, Environment, EnvironmentDescriptor, Fac, FrameId, FrameSpec, ModelError,
    NeighborId, NeighborPolicy, NeighborSpec, PlanError, Planner, PlannerConfig, ResourceId,
    ResourceLevel, sample_categorical,
};
use rand::Rng;

/// A single machine that breaks down; enough crews repairing it fix it.
struct Workshop {
    descriptor: EnvironmentDescriptor,
    policy: Repairer,
}

struct Repairer;

impl NeighborPolicy<bool> for Repairer {
    fn action(&self, broken: &bool, _neighbor: NeighborId, level: ResourceLevel) -> &str {
        if *broken && level > 0 { "repair" } else { "noop" }
    }
}

impl Workshop {
    fn new(neighbors: usize) -> Self {
        let actions = vec!["noop".to_string(), "repair".to_string()];
        let descriptor = EnvironmentDescriptor::new(
            vec![FrameSpec {
                name: "crew".into(),
                actions: actions.clone(),
            }],
            (0..neighbors)
                .map(|_| NeighborSpec {
                    frame: FrameId::from(0),
                    actions: actions.clone(),
                    resources: vec![ResourceId::from(0)],
                })
                .collect(),
            AgentSpec {
                frame: FrameId::from(0),
                actions,
            },
            1,
            "noop",
        )
        .expect("workshop descriptor is valid");
        Workshop {
            descriptor,
            policy: Repairer,
        }
    }
}

impl Environment for Workshop {
    type State = bool;
    type Observation = bool;

    fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        broken: &bool,
        _action: ActionId,
        fac: &Fac,
        rng: &mut R,
    ) -> Result<bool, ModelError> {
        let crews = fac.count_of(FrameId::from(0), "repair").unwrap_or(0);
        let p_fixed = if *broken { (0.5 * f64::from(crews)).min(1.0) } else { 0.9 };
        Ok(sample_categorical(&[p_fixed, 1.0 - p_fixed], "workshop", rng)? == 1)
    }

    fn sample_observation<R: Rng + ?Sized>(
        &self,
        _state: &bool,
        _action: ActionId,
        _fac: &Fac,
        next: &bool,
        _rng: &mut R,
    ) -> Result<bool, ModelError> {
        Ok(*next)
    }

    fn reward(&self, _state: &bool, action: ActionId, _fac: &Fac, next: &bool) -> f64 {
        let effort = if action.index() == 1 { 0.2 } else { 0.0 };
        if *next { -1.0 - effort } else { 1.0 - effort }
    }

    fn sample_internal_transition<R: Rng + ?Sized>(
        &self,
        _neighbor: NeighborId,
        level: ResourceLevel,
        action: &str,
        _rng: &mut R,
    ) -> Result<ResourceLevel, ModelError> {
        Ok(if action == "repair" { level.saturating_sub(1) } else { level })
    }

    fn max_reward(&self) -> f64 {
        1.0
    }

    fn neighbor_policy(&self, _frame: FrameId) -> Option<&dyn NeighborPolicy<bool>> {
        Some(&self.policy)
    }
}

fn config() -> PlannerConfig {
    PlannerConfig {
        max_iterations: Some(300),
        time_bound_ms: 60_000,
        particle_count: 100,
        max_horizon: 4,
        seed: 11,
        ..PlannerConfig::default()
    }
}

#[test]
fn public_planner_repairs_a_broken_machine() {
    let mut planner = Planner::new(Workshop::new(1), config(), true).expect("planner builds");
    let decision = planner.choose_action().expect("search succeeds");

    assert_eq!(decision.values.len(), 2);
    assert!(decision.values[1] > decision.values[0]);
    assert_eq!(decision.visits.iter().sum::<u64>(), 300);
    assert_eq!(decision.action_name, "repair");
}

#[test]
fn public_planning_loop_alternates_search_and_update() {
    let mut planner = Planner::new(Workshop::new(2), config(), true).expect("planner builds");

    for epoch in 0..3 {
        let decision = planner.choose_action().expect("search succeeds");
        let observation = [true, false]
            .into_iter()
            .find(|obs| planner.posterior(decision.action, obs).is_some())
            .expect("some observation was simulated");
        planner
            .update_belief(decision.action, &observation)
            .expect("update succeeds");
        assert_eq!(planner.epoch(), epoch + 1);
        assert!(planner.belief().particles().iter().all(|p| *p.state() == observation));
    }
}

#[test]
fn public_update_without_search_is_a_planning_failure() {
    let mut planner = Planner::new(Workshop::new(1), config(), true).expect("planner builds");
    let err = planner
        .update_belief(ActionId::from(0), &false)
        .expect_err("nothing was searched yet");
    assert!(matches!(err, PlanError::UnobservedObservation { .. }));
}

#[test]
fn public_config_loads_from_a_yaml_file() {
    let path = std::env::temp_dir().join(format!("ipomcp-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "particle_count: 12\nmax_iterations: 30\nseed: 4\n").expect("write config");
    let loaded = PlannerConfig::from_yaml_path(&path).expect("config loads");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.particle_count, 12);
    let mut planner = Planner::new(Workshop::new(2), loaded, false).expect("planner builds");
    assert_eq!(planner.belief().len(), 12);
    let decision = planner.choose_action().expect("search succeeds");
    assert_eq!(decision.metrics.iterations, 30);
}
