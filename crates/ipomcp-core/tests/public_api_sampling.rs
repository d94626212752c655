use std::sync::Arc;

use ipomcp_core::{
    AgentSpec, CapacityEntry, EnvironmentDescriptor, Fac, FacError, FacLayout, FrameId, FrameSpec,
    NeighborSample, NeighborSpec, ResourceId, sample_size,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn public_sample_size_matches_the_reference_cases() {
    let n = sample_size(50, 0.05, 0.1);
    assert!((2..50).contains(&n), "n = {n}");
    assert_eq!(sample_size(50, 0.0, 0.0), 50);
    assert_eq!(sample_size(50, 0.05, 0.0), 50);
    assert_eq!(sample_size(1, 0.05, 0.1), 1);
    assert_eq!(sample_size(0, 0.05, 0.1), 0);
}

#[test]
fn public_fac_put_then_search_returns_the_same_index() {
    let layout = Arc::new(FacLayout::from_parts(
        vec![3, 1],
        vec![
            CapacityEntry {
                frame: FrameId::from(1),
                action: "noop".into(),
                max_count: 1,
            },
            CapacityEntry {
                frame: FrameId::from(0),
                action: "noop".into(),
                max_count: 3,
            },
            CapacityEntry {
                frame: FrameId::from(0),
                action: "dig".into(),
                max_count: 2,
            },
        ],
    ));
    let mut fac = Fac::empty(layout);

    let idx = fac.put(FrameId::from(0), "dig", 2).expect("within capacity");
    assert_eq!(fac.search(FrameId::from(0), "dig"), Some(idx));
    assert_eq!(fac.count(idx), 2);
    assert_eq!(fac.search(FrameId::from(1), "dig"), None);

    assert!(matches!(
        fac.put(FrameId::from(0), "dig", 3),
        Err(FacError::CapacityExceeded { .. })
    ));
    assert!(matches!(
        fac.put(FrameId::from(0), "noop", 2),
        Err(FacError::PopulationExceeded { .. })
    ));
    assert!(!fac.is_filled());
}

#[test]
fn public_neighbor_sample_covers_every_populated_frame() {
    let frames = vec![
        FrameSpec {
            name: "ground".into(),
            actions: vec!["noop".into(), "dig".into()],
        },
        FrameSpec {
            name: "air".into(),
            actions: vec!["noop".into(), "drop".into()],
        },
    ];
    let mut neighbors = Vec::new();
    for i in 0..60 {
        neighbors.push(NeighborSpec {
            frame: FrameId::from(0),
            actions: vec!["noop".into(), "dig".into()],
            resources: vec![ResourceId::from(i % 2)],
        });
    }
    neighbors.push(NeighborSpec {
        frame: FrameId::from(1),
        actions: vec!["noop".into(), "drop".into()],
        resources: vec![ResourceId::from(0)],
    });
    let descriptor = EnvironmentDescriptor::new(
        frames,
        neighbors,
        AgentSpec {
            frame: FrameId::from(0),
            actions: vec!["noop".into(), "dig".into()],
        },
        2,
        "noop",
    )
    .expect("descriptor is valid");

    let sample = NeighborSample::draw(&descriptor, 0.05, 0.1, &mut ChaCha8Rng::seed_from_u64(2));
    assert!(sample.len() < 61);
    let frames_covered = sample
        .modeled()
        .iter()
        .map(|n| descriptor.neighbor(*n).expect("known neighbor").frame)
        .collect::<std::collections::HashSet<_>>();
    assert_eq!(frames_covered.len(), 2);
}
