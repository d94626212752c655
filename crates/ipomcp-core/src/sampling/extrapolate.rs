use std::sync::Arc;

use rand::{
    Rng,
    distributions::{Distribution, WeightedIndex},
};

use crate::{
    belief::BeliefParticle,
    descriptor::{EnvironmentDescriptor, FrameId},
    error::{FacError, ModelError, PlanError},
    fac::{Fac, FacLayout},
    model::Environment,
    sampling::neighbors::NeighborSample,
};

/// Turns one belief particle into a filled neighbor configuration.
#[derive(Debug, Clone)]
pub struct FacSampler {
    layout: Arc<FacLayout>,
    sample: NeighborSample,
}

impl FacSampler {
    pub fn new(descriptor: &EnvironmentDescriptor, sample: NeighborSample) -> Self {
        FacSampler {
            layout: Arc::new(descriptor.neighbor_layout()),
            sample,
        }
    }

    pub fn layout(&self) -> &Arc<FacLayout> {
        &self.layout
    }

    pub fn sample(&self) -> &NeighborSample {
        &self.sample
    }

    /// Sample the configuration of all neighbors for `particle`.
    ///
    /// Modeled neighbors act according to their frame's policy given the
    /// particle state and their mental model; the chosen entry is cached on
    /// the particle. The rest of each frame's population is drawn from the
    /// modeled members' empirical action distribution, skipping actions
    /// whose capacity is used up.
    pub fn sample_fac<E, R>(
        &self,
        env: &E,
        particle: &mut BeliefParticle<E::State>,
        rng: &mut R,
    ) -> Result<Fac, PlanError>
    where
        E: Environment,
        R: Rng + ?Sized,
    {
        let descriptor = env.descriptor();
        let mut counts = vec![0_u32; self.layout.len()];
        let mut modeled_per_frame = vec![0_u32; self.layout.frame_count()];

        for (slot, neighbor) in self.sample.modeled().iter().enumerate() {
            let spec = descriptor
                .neighbor(*neighbor)
                .ok_or(ModelError::UnknownNeighbor {
                    neighbor: neighbor.index(),
                })?;
            let policy = env
                .neighbor_policy(spec.frame)
                .ok_or(ModelError::MissingPolicy {
                    frame: spec.frame.index(),
                })?;
            let level = particle.mental_models().get(slot).copied().ok_or(
                ModelError::UnknownNeighbor {
                    neighbor: neighbor.index(),
                },
            )?;

            let action = policy.action(particle.state(), *neighbor, level);
            if !spec.actions.iter().any(|a| a == action) {
                return Err(ModelError::UnknownAction {
                    action: action.to_string(),
                }
                .into());
            }
            let entry =
                self.layout
                    .search(spec.frame, action)
                    .ok_or_else(|| FacError::UnknownEntry {
                        frame: spec.frame.index(),
                        action: action.to_string(),
                    })?;

            particle.set_sampled_action(slot, entry);
            counts[entry] += 1;
            modeled_per_frame[spec.frame.index()] += 1;
        }

        for (f, modeled) in modeled_per_frame.iter().copied().enumerate() {
            self.extrapolate_frame(FrameId::from(f), modeled, &mut counts, rng)?;
        }

        let mut fac = Fac::empty(Arc::clone(&self.layout));
        for (idx, count) in counts.into_iter().enumerate() {
            fac.put_index(idx, count)?;
        }
        fac.ensure_filled()?;
        Ok(fac)
    }

    /// Place the unmodeled members of `frame` by drawing from the modeled
    /// members' action frequencies.
    fn extrapolate_frame<R: Rng + ?Sized>(
        &self,
        frame: FrameId,
        modeled: u32,
        counts: &mut [u32],
        rng: &mut R,
    ) -> Result<(), FacError> {
        let population = self.layout.population(frame);
        if modeled >= population {
            return Ok(());
        }
        let range = self.layout.entries_for(frame);
        let frequencies: Vec<f64> = counts[range.clone()]
            .iter()
            .map(|c| f64::from(*c) / f64::from(modeled.max(1)))
            .collect();

        let mut placed = modeled;
        while placed < population {
            let eligible: Vec<f64> = range
                .clone()
                .zip(frequencies.iter())
                .map(|(idx, freq)| {
                    let capacity = self
                        .layout
                        .entry(idx)
                        .map(|entry| entry.max_count)
                        .unwrap_or(0);
                    if counts[idx] < capacity { *freq } else { 0.0 }
                })
                .collect();

            let dist =
                WeightedIndex::new(&eligible).map_err(|_| FacError::CapacityExhausted {
                    frame: frame.index(),
                    placed,
                    population,
                })?;
            counts[range.start + dist.sample(rng)] += 1;
            placed += 1;
        }
        Ok(())
    }
}
