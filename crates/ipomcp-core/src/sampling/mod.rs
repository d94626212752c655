mod extrapolate;
mod neighbors;
pub mod stats;

pub use extrapolate::FacSampler;
pub use neighbors::{NeighborSample, sample_size};

#[cfg(test)]
mod tests;
