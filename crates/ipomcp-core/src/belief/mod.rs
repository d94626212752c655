mod filter;
mod particle;
mod reservoir;

pub use filter::ParticleSet;
pub use particle::{BeliefParticle, MentalModelPrior};
pub use reservoir::ParticleReservoir;
