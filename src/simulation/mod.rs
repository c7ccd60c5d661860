//! Synthetic ground truth and noisy position measurements used to exercise the filter.
pub mod driver;
pub mod noise;

pub use driver::{Sample, SimulationDriver};
pub use noise::{GaussianNoise, ProcessNoiseSampling};
