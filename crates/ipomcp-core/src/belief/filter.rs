use rand::{Rng, seq::SliceRandom};

use crate::{
    belief::particle::{BeliefParticle, MentalModelPrior},
    error::ModelError,
};

/// Unweighted particle belief of fixed target size.
#[derive(Debug, Clone)]
pub struct ParticleSet<S> {
    particles: Vec<BeliefParticle<S>>,
    target: usize,
}

impl<S: Clone> ParticleSet<S> {
    /// Draw `target` particles around a known state, with neighbor levels from `prior`.
    pub fn from_prior<R: Rng + ?Sized>(
        state: &S,
        modeled_neighbors: usize,
        prior: &MentalModelPrior,
        target: usize,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let particles = (0..target)
            .map(|_| {
                prior
                    .draw_many(modeled_neighbors, rng)
                    .map(|levels| BeliefParticle::new(state.clone(), levels))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParticleSet { particles, target })
    }

    pub fn from_particles(particles: Vec<BeliefParticle<S>>, target: usize) -> Self {
        ParticleSet { particles, target }
    }

    pub fn particles(&self) -> &[BeliefParticle<S>] {
        &self.particles
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Pick one particle uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&BeliefParticle<S>> {
        self.particles.choose(rng)
    }

    /// Replace the whole belief with a new particle list.
    pub fn replace(&mut self, particles: Vec<BeliefParticle<S>>) {
        self.particles = particles;
    }

    /// Bring the set to exactly `target` particles.
    ///
    /// Surplus particles are dropped uniformly at random; a short set is
    /// padded with uniform copies of its own particles. An empty set stays empty.
    pub fn resize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.particles.len() > self.target {
            self.particles.shuffle(rng);
            self.particles.truncate(self.target);
            return;
        }

        let retained = self.particles.len();
        if retained == 0 {
            return;
        }
        while self.particles.len() < self.target {
            let idx = rng.gen_range(0..retained);
            let copy = self.particles[idx].clone();
            self.particles.push(copy);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn prior_particles_share_the_state_and_model_every_neighbor() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let prior = MentalModelPrior::Categorical {
            probabilities: vec![0.0, 0.5, 0.5],
        };
        let set = ParticleSet::from_prior(&7_u32, 3, &prior, 20, &mut rng).unwrap();

        assert_eq!(set.len(), 20);
        for particle in set.particles() {
            assert_eq!(*particle.state(), 7);
            assert_eq!(particle.mental_models().len(), 3);
            assert!(particle.mental_models().iter().all(|l| *l == 1 || *l == 2));
        }
    }

    #[test]
    fn resize_converges_to_target_both_ways() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let many = (0..30).map(|i| BeliefParticle::new(i, vec![])).collect();
        let mut set = ParticleSet::from_particles(many, 10);
        set.resize(&mut rng);
        assert_eq!(set.len(), 10);

        let few = (0..3).map(|i| BeliefParticle::new(i, vec![])).collect();
        let mut set = ParticleSet::from_particles(few, 10);
        set.resize(&mut rng);
        assert_eq!(set.len(), 10);
        assert!(set.particles().iter().all(|p| *p.state() < 3));
    }

    #[test]
    fn broken_prior_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let prior = MentalModelPrior::Categorical {
            probabilities: vec![0.2, 0.2],
        };
        assert!(ParticleSet::from_prior(&0_u8, 2, &prior, 4, &mut rng).is_err());
    }
}
