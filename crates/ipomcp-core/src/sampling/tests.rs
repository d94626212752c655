use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    belief::BeliefParticle,
    descriptor::FrameId,
    error::{FacError, PlanError},
    fixtures::{ToyFire, ToyState},
    model::Environment,
    sampling::{FacSampler, NeighborSample},
};

fn burning(fires: usize) -> ToyState {
    ToyState {
        intensities: vec![1; fires],
        supply: 2,
    }
}

#[test]
fn fully_modeled_neighbors_are_counted_exactly() {
    let env = ToyFire::new(3, 1, 1, "fight_0");
    let sampler = FacSampler::new(env.descriptor(), NeighborSample::everyone(env.descriptor()));
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let mut particle = BeliefParticle::new(burning(1), vec![1, 0, 1]);
    let fac = sampler.sample_fac(&env, &mut particle, &mut rng).unwrap();

    assert_eq!(fac.count_of(FrameId::from(0), "fight_0"), Some(2));
    assert_eq!(fac.count_of(FrameId::from(0), "noop"), Some(1));
    let fight = fac.search(FrameId::from(0), "fight_0");
    let noop = fac.search(FrameId::from(0), "noop");
    assert_eq!(particle.sampled_actions(), &[fight, noop, fight]);
}

#[test]
fn extrapolation_fills_the_whole_population() {
    let env = ToyFire::new(40, 2, 1, "fight_1");
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let sample = NeighborSample::draw(env.descriptor(), 0.05, 0.1, &mut rng);
    assert!(sample.len() < 40);
    let sampler = FacSampler::new(env.descriptor(), sample.clone());

    let mut particle = BeliefParticle::new(burning(2), vec![1; sample.len()]);
    let fac = sampler.sample_fac(&env, &mut particle, &mut rng).unwrap();

    assert!(fac.is_filled());
    assert_eq!(fac.count_of(FrameId::from(0), "fight_1"), Some(40));
}

#[test]
fn missing_mental_models_surface_as_errors() {
    let env = ToyFire::new(2, 1, 1, "fight_0");
    let sampler = FacSampler::new(env.descriptor(), NeighborSample::everyone(env.descriptor()));
    let mut particle = BeliefParticle::new(burning(1), vec![1]);
    let err = sampler
        .sample_fac(&env, &mut particle, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, PlanError::Model(_)));
}

#[test]
fn empty_sample_reports_capacity_exhaustion() {
    let env = ToyFire::new(3, 1, 1, "fight_0");
    let empty = NeighborSample::everyone(ToyFire::new(0, 1, 1, "noop").descriptor());
    let sampler = FacSampler::new(env.descriptor(), empty);
    let mut particle = BeliefParticle::new(burning(1), vec![]);

    let err = sampler
        .sample_fac(&env, &mut particle, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(
        err,
        PlanError::Fac(FacError::CapacityExhausted { placed: 0, population: 3, .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sampled_configurations_respect_capacity_and_population(
        neighbors in 1usize..60,
        seed in 0u64..1_000,
        levels in proptest::collection::vec(0u8..3, 60),
    ) {
        let env = ToyFire::new(neighbors, 2, 2, "fight_0");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sample = NeighborSample::draw(env.descriptor(), 0.05, 0.1, &mut rng);
        let sampler = FacSampler::new(env.descriptor(), sample.clone());
        let mut particle = BeliefParticle::new(burning(2), levels[..sample.len()].to_vec());

        let fac = sampler.sample_fac(&env, &mut particle, &mut rng).unwrap();
        let layout = sampler.layout();
        for f in 0..layout.frame_count() {
            let frame = FrameId::from(f);
            prop_assert_eq!(fac.frame_total(frame), layout.population(frame));
        }
        for (entry, count) in fac.iter() {
            prop_assert!(count <= entry.max_count);
        }
    }
}
