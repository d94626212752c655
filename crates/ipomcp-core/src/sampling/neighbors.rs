use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::{
    descriptor::{EnvironmentDescriptor, FrameId, NeighborId},
    sampling::stats::two_sided_critical_value,
};

/// `p (1 - p)` at `p = 0.5`, the most conservative proportion variance.
const WORST_CASE_VARIANCE: f64 = 0.25;

/// Smallest number of neighbors to model out of `population` so that an
/// estimated action proportion stays within `error_bound` at confidence
/// `1 - alpha`, with finite-population correction.
///
/// Returns `population` when `alpha` or `error_bound` is zero.
pub fn sample_size(population: usize, alpha: f64, error_bound: f64) -> usize {
    if population <= 1 || alpha <= 0.0 || error_bound <= 0.0 {
        return population;
    }

    let total = population as f64;
    for n in 2..=population {
        let t = two_sided_critical_value(alpha, (n - 1) as f64);
        let n0 = t * t * WORST_CASE_VARIANCE / (error_bound * error_bound);
        let required = (total * n0 / (total - 1.0 + n0)).ceil() as usize;
        if n >= required {
            return n;
        }
    }
    population
}

/// The neighbors whose hidden levels the planner tracks explicitly.
/// Slot `i` of every particle's mental models belongs to `modeled()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSample {
    modeled: Vec<NeighborId>,
}

impl NeighborSample {
    /// Model every neighbor; no extrapolation happens.
    pub fn everyone(descriptor: &EnvironmentDescriptor) -> Self {
        NeighborSample {
            modeled: (0..descriptor.neighbors().len())
                .map(NeighborId::from)
                .collect(),
        }
    }

    /// Draw a representative subset of neighbors.
    ///
    /// Resource groups are visited from largest to smallest. Neighbors already
    /// modeled for an earlier group count toward later groups, so the subset
    /// is reused wherever groups overlap. Every populated frame ends up with
    /// at least one modeled member so its behavior can be extrapolated.
    pub fn draw<R: Rng + ?Sized>(
        descriptor: &EnvironmentDescriptor,
        alpha: f64,
        error_bound: f64,
        rng: &mut R,
    ) -> Self {
        if alpha <= 0.0 || error_bound <= 0.0 {
            return Self::everyone(descriptor);
        }

        let mut groups = descriptor.resource_groups();
        groups.sort_by_key(|group| std::cmp::Reverse(group.len()));

        let mut chosen: BTreeSet<NeighborId> = BTreeSet::new();
        for group in &groups {
            let target = sample_size(group.len(), alpha, error_bound);
            let already = group.iter().filter(|n| chosen.contains(n)).count();
            if already >= target {
                continue;
            }
            let candidates: Vec<NeighborId> = group
                .iter()
                .copied()
                .filter(|n| !chosen.contains(n))
                .collect();
            chosen.extend(candidates.choose_multiple(rng, target - already).copied());
        }

        for f in 0..descriptor.frames().len() {
            let frame = FrameId::from(f);
            let members: Vec<NeighborId> = descriptor
                .neighbors()
                .iter()
                .enumerate()
                .filter(|(_, n)| n.frame == frame)
                .map(|(idx, _)| NeighborId::from(idx))
                .collect();
            if !members.is_empty() && !members.iter().any(|n| chosen.contains(n)) {
                if let Some(pick) = members.choose(rng) {
                    chosen.insert(*pick);
                }
            }
        }

        debug!(
            neighbors = descriptor.neighbors().len(),
            modeled = chosen.len(),
            "drew neighbor sample"
        );

        NeighborSample {
            modeled: chosen.into_iter().collect(),
        }
    }

    pub fn modeled(&self) -> &[NeighborId] {
        &self.modeled
    }

    pub fn len(&self) -> usize {
        self.modeled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modeled.is_empty()
    }

    /// Slot of `neighbor` in the mental-model vector, if it is modeled.
    pub fn slot_of(&self, neighbor: NeighborId) -> Option<usize> {
        self.modeled.binary_search(&neighbor).ok()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::descriptor::{AgentSpec, FrameSpec, NeighborSpec, ResourceId};

    fn crowd(size: usize) -> EnvironmentDescriptor {
        let frames = vec![
            FrameSpec {
                name: "ground".into(),
                actions: vec!["noop".into(), "fight_0".into(), "fight_1".into()],
            },
            FrameSpec {
                name: "air".into(),
                actions: vec!["noop".into(), "fight_0".into(), "fight_1".into()],
            },
        ];
        let neighbors = (0..size)
            .map(|i| NeighborSpec {
                frame: FrameId::from(i % 2),
                actions: vec!["noop".into(), format!("fight_{}", i % 3 % 2)],
                resources: vec![ResourceId::from(i % 3 % 2)],
            })
            .collect();
        EnvironmentDescriptor::new(
            frames,
            neighbors,
            AgentSpec {
                frame: FrameId::from(0),
                actions: vec!["noop".into(), "fight_0".into()],
            },
            2,
            "noop",
        )
        .unwrap()
    }

    #[test]
    fn fifty_neighbors_need_fewer_than_fifty_samples() {
        let n = sample_size(50, 0.05, 0.1);
        assert!(n < 50, "got {n}");
        assert!(n >= 2, "got {n}");
    }

    #[test]
    fn zero_alpha_or_bound_disables_extrapolation() {
        assert_eq!(sample_size(50, 0.0, 0.0), 50);
        assert_eq!(sample_size(50, 0.0, 0.1), 50);
        assert_eq!(sample_size(50, 0.05, 0.0), 50);
    }

    #[test]
    fn tiny_populations_are_modeled_fully() {
        assert_eq!(sample_size(0, 0.05, 0.1), 0);
        assert_eq!(sample_size(1, 0.05, 0.1), 1);
        assert_eq!(sample_size(2, 0.05, 0.1), 2);
    }

    #[test]
    fn drawn_sample_covers_groups_and_frames() {
        let descriptor = crowd(60);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let sample = NeighborSample::draw(&descriptor, 0.05, 0.1, &mut rng);

        assert!(sample.len() < 60);
        for group in descriptor.resource_groups() {
            let modeled = group.iter().filter(|n| sample.slot_of(**n).is_some()).count();
            assert!(modeled >= sample_size(group.len(), 0.05, 0.1));
        }
        for f in 0..2 {
            assert!(sample.modeled().iter().any(|n| {
                descriptor.neighbor(*n).map(|spec| spec.frame) == Some(FrameId::from(f))
            }));
        }
    }

    #[test]
    fn disabled_sampling_models_everyone() {
        let descriptor = crowd(12);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let sample = NeighborSample::draw(&descriptor, 0.0, 0.0, &mut rng);
        assert_eq!(sample, NeighborSample::everyone(&descriptor));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sample_size_stays_within_population(
            population in 0usize..200,
            alpha in 0.01f64..0.2,
            bound in 0.02f64..0.3,
        ) {
            let n = sample_size(population, alpha, bound);
            prop_assert!(n <= population);
            if population >= 2 {
                prop_assert!(n >= 2);
            }
        }
    }
}
