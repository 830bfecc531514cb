//! Utility modules for the HTM library.
//!
//! Seeded random number generation and topology helpers shared by the
//! algorithms.

mod random;
mod topology;

pub use random::Random;
pub use topology::{Neighborhood, Topology, WrappingMode};
