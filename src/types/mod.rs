//! Core types for the HTM library.
//!
//! Primitive handle/permanence aliases and the SDR container exchanged between
//! the encoder, the spatial pooler and the temporal memory.

mod primitives;
mod sdr;

pub use primitives::*;
pub use sdr::*;
