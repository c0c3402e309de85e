//! Orbital mechanics: J2 propagation and Keplerian element derivation.

pub mod elements;
pub mod propagator;

pub use elements::KeplerianElements;
pub use propagator::{j2_acceleration, propagate, rk4_step, OrbitState, Sample, Trajectory};
