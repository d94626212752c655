use rand::Rng;

/// Bounded, uniformly subsampled collection of particles.
///
/// Keeps every offered item until `capacity` is reached, then replaces
/// stored items so that each offered item is retained with equal probability.
#[derive(Debug, Clone)]
pub struct ParticleReservoir<P> {
    items: Vec<P>,
    offered: u64,
    capacity: usize,
}

impl<P> ParticleReservoir<P> {
    pub fn new(capacity: usize) -> Self {
        ParticleReservoir {
            items: Vec::new(),
            offered: 0,
            capacity,
        }
    }

    pub fn offer<R: Rng + ?Sized>(&mut self, item: P, rng: &mut R) {
        self.offered += 1;
        if self.items.len() < self.capacity {
            self.items.push(item);
            return;
        }
        let slot = rng.gen_range(0..self.offered);
        if (slot as usize) < self.capacity {
            self.items[slot as usize] = item;
        }
    }

    pub fn items(&self) -> &[P] {
        &self.items
    }

    pub fn into_items(self) -> Vec<P> {
        self.items
    }

    /// How many items were offered in total, retained or not.
    pub fn offered(&self) -> u64 {
        self.offered
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn reservoir_never_exceeds_capacity() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut reservoir = ParticleReservoir::new(4);
        for i in 0..100 {
            reservoir.offer(i, &mut rng);
        }
        assert_eq!(reservoir.len(), 4);
        assert_eq!(reservoir.offered(), 100);
        assert!(reservoir.items().iter().all(|i| *i < 100));
    }

    #[test]
    fn reservoir_below_capacity_keeps_everything_in_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut reservoir = ParticleReservoir::new(8);
        for i in 0..5 {
            reservoir.offer(i, &mut rng);
        }
        assert_eq!(reservoir.into_items(), vec![0, 1, 2, 3, 4]);
    }
}
