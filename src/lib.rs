//! # Cortical - an online HTM core in Rust
//!
//! Cortical implements the three Hierarchical Temporal Memory primitives a
//! per-timestep scalar forecasting loop needs, plus the container they
//! exchange:
//!
//! - **Sparse Distributed Representations (SDR)**: fixed-size bit vectors with
//!   lazily synchronized dense and sparse views
//! - **Random Distributed Scalar Encoder (RDSE)**: scalar to reproducible
//!   sparse pattern, nearby values sharing bits
//! - **Spatial Pooler**: input SDR to a stable, sparse set of active columns
//! - **Temporal Memory**: active columns to active, winner and predictive
//!   cells, learning high-order sequences online
//!
//! The [`pipeline`] module wires the three stages together the way a
//! forecasting driver sequences them.
//!
//! ## Quick Start
//!
//! ```rust
//! use cortical::prelude::*;
//!
//! let mut encoder = RandomDistributedScalarEncoder::new(RdseParams {
//!     size: 100,
//!     sparsity: 0.1,
//!     radius: 10.0,
//!     seed: 42,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut sp = SpatialPooler::new(SpatialPoolerParams {
//!     input_dimensions: vec![100],
//!     column_dimensions: vec![256],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut tm = TemporalMemory::new(TemporalMemoryParams {
//!     column_dimensions: vec![256],
//!     cells_per_column: 8,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut input = Sdr::new(&[100]);
//! let mut columns = Sdr::new(&[256]);
//!
//! encoder.encode(5.0, &mut input).unwrap();
//! sp.compute(&input, true, &mut columns).unwrap();
//! tm.compute(&columns, true).unwrap();
//!
//! assert!(!tm.active_cells().is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of every component via `bincode` and
//!   `serde_json`, and JSON pipeline configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod algorithms;
pub mod encoders;
pub mod pipeline;
pub mod types;
pub mod utils;

#[cfg(feature = "serde")]
pub mod serialization;

/// Re-export of commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::algorithms::{
        Connections, SpatialPooler, SpatialPoolerParams, TemporalMemory, TemporalMemoryParams,
    };
    pub use crate::encoders::{Encoder, RandomDistributedScalarEncoder, RdseParams};
    pub use crate::pipeline::{HtmPipeline, PipelineConfig};
    pub use crate::types::{
        CellIdx, Permanence, Real, Sdr, SdrDense, SdrSparse, Segment, SegmentIdx, Synapse,
        SynapseIdx, UInt,
    };
    pub use crate::utils::{Random, Topology};
    pub use crate::{CorticalError, Result};

    #[cfg(feature = "serde")]
    pub use crate::serialization::{Serializable, SerializableFormat};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library.
pub mod error {
    use thiserror::Error;

    /// Main error type for cortical operations.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum CorticalError {
        /// Invalid configuration value. Raised once, at construction.
        #[error("Invalid parameter '{name}': {message}")]
        InvalidParameter {
            /// Name of the invalid parameter.
            name: &'static str,
            /// Description of the error.
            message: String,
        },

        /// Shape or size of an argument does not match the component.
        #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
        DimensionMismatch {
            /// Expected dimensions.
            expected: Vec<u32>,
            /// Actual dimensions.
            actual: Vec<u32>,
        },

        /// Index outside of the valid range.
        #[error("Index {index} out of bounds (size: {size})")]
        IndexOutOfBounds {
            /// The invalid index.
            index: usize,
            /// The valid size.
            size: usize,
        },

        /// SDR data is invalid (e.g. duplicate sparse indices).
        #[error("Invalid SDR data: {0}")]
        InvalidSdrData(String),

        /// Serialization error.
        #[cfg(feature = "serde")]
        #[error("Serialization error: {message}")]
        SerializationError {
            /// Description of the serialization error.
            message: String,
        },

        /// I/O error.
        #[error("I/O error: {message}")]
        IoError {
            /// Description of the I/O error.
            message: String,
        },
    }

    impl CorticalError {
        /// Returns true for configuration errors, which are fatal at
        /// construction time.
        pub fn is_config_error(&self) -> bool {
            matches!(self, Self::InvalidParameter { .. })
        }

        /// Returns true for per-call size and range errors. The component
        /// that returned one is left unchanged.
        pub fn is_dimension_mismatch(&self) -> bool {
            matches!(
                self,
                Self::DimensionMismatch { .. } | Self::IndexOutOfBounds { .. }
            )
        }
    }

    impl From<std::io::Error> for CorticalError {
        fn from(err: std::io::Error) -> Self {
            Self::IoError {
                message: err.to_string(),
            }
        }
    }

    /// Result type alias using `CorticalError`.
    pub type Result<T> = std::result::Result<T, CorticalError>;
}

pub use error::{CorticalError, Result};
