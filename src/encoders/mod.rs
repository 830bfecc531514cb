//! Encoders turn raw values into SDRs.
//!
//! - [`RandomDistributedScalarEncoder`]: numeric values to hash-placed bits,
//!   with no fixed input range
//!
//! # Example
//!
//! ```rust
//! use cortical::encoders::{Encoder, Rdse, RdseParams};
//!
//! let encoder = Rdse::new(RdseParams {
//!     size: 100,
//!     sparsity: 0.1,
//!     radius: 10.0,
//!     seed: 42,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let a = encoder.encode_to_sdr(5.0).unwrap();
//! let b = encoder.encode_to_sdr(5.0).unwrap();
//! assert_eq!(a.get_sparse(), b.get_sparse());
//! assert_eq!(a.get_sum(), 10);
//! ```

mod base;
mod rdse;

pub use base::Encoder;
pub use rdse::{RandomDistributedScalarEncoder, Rdse, RdseParams};
