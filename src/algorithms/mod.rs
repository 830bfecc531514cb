//! HTM algorithms.
//!
//! - **Connections**: cell, segment and synapse storage shared by both poolers
//! - **Spatial Pooler**: input SDR to a sparse set of active columns
//! - **Temporal Memory**: active columns to active and predictive cells

mod connections;
mod spatial_pooler;
mod temporal_memory;

pub use connections::{Connections, SegmentData, SynapseData};
pub use spatial_pooler::{SpatialPooler, SpatialPoolerParams};
pub use temporal_memory::{TemporalMemory, TemporalMemoryParams};
