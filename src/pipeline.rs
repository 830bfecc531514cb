//! Encoder, spatial pooler and temporal memory wired into one timestep.
//!
//! [`HtmPipeline::step`] runs the per-record sequence a forecasting driver
//! performs: encode the scalar, pool the encoding into active columns, then
//! feed the columns to the temporal memory. Reading records and consuming
//! the active cells is left to the caller.

use crate::algorithms::{SpatialPooler, SpatialPoolerParams, TemporalMemory, TemporalMemoryParams};
use crate::encoders::{Encoder, RandomDistributedScalarEncoder, RdseParams};
use crate::error::{CorticalError, Result};
use crate::types::{CellIdx, Real, Sdr};
use crate::utils::Topology;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for all three stages.
///
/// The defaults follow the hot-gym driver: a 100-bit scalar encoding
/// (10% active, radius 10) pooled into 2048 columns of 32 cells, with the
/// temporal memory sharing the pooler's connected threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Scalar encoder parameters.
    pub encoder: RdseParams,
    /// Spatial pooler parameters. `input_dimensions` must hold exactly
    /// `encoder.size` bits.
    pub spatial_pooler: SpatialPoolerParams,
    /// Temporal memory parameters. `column_dimensions` must equal the
    /// spatial pooler's.
    pub temporal_memory: TemporalMemoryParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            encoder: RdseParams {
                size: 100,
                sparsity: 0.1,
                radius: 10.0,
                seed: 42,
                ..Default::default()
            },
            spatial_pooler: SpatialPoolerParams {
                input_dimensions: vec![100],
                column_dimensions: vec![2048],
                potential_radius: 100,
                potential_pct: 0.85,
                global_inhibition: true,
                local_area_density: 0.0,
                num_active_columns_per_inh_area: 40,
                syn_perm_inactive_dec: 0.005,
                syn_perm_active_inc: 0.04,
                syn_perm_connected: 0.1,
                boost_strength: 3.0,
                seed: 1956,
                wrap_around: true,
                ..Default::default()
            },
            temporal_memory: TemporalMemoryParams {
                column_dimensions: vec![2048],
                cells_per_column: 32,
                activation_threshold: 16,
                initial_permanence: 0.21,
                connected_permanence: 0.1,
                min_threshold: 12,
                max_new_synapse_count: 20,
                permanence_increment: 0.1,
                permanence_decrement: 0.1,
                predicted_segment_decrement: 0.0,
                max_segments_per_cell: 128,
                max_synapses_per_segment: 128,
                seed: 1960,
            },
        }
    }
}

impl PipelineConfig {
    /// Checks each stage and that the stages fit together.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] for a bad stage parameter
    /// or for stage shapes that do not line up.
    pub fn validate(&self) -> Result<()> {
        self.spatial_pooler.validate()?;
        self.temporal_memory.validate()?;

        let input_size = Topology::num_elements(&self.spatial_pooler.input_dimensions);
        if input_size != self.encoder.size as usize {
            return Err(CorticalError::InvalidParameter {
                name: "spatial_pooler.input_dimensions",
                message: format!(
                    "Holds {input_size} bits but the encoder produces {}",
                    self.encoder.size
                ),
            });
        }
        if self.spatial_pooler.column_dimensions != self.temporal_memory.column_dimensions {
            return Err(CorticalError::InvalidParameter {
                name: "temporal_memory.column_dimensions",
                message: format!(
                    "{:?} does not match the spatial pooler columns {:?}",
                    self.temporal_memory.column_dimensions, self.spatial_pooler.column_dimensions
                ),
            });
        }
        Ok(())
    }

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] for malformed JSON.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CorticalError::SerializationError {
            message: format!("Invalid pipeline config: {e}"),
        })
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IoError`] if the file cannot be read, or
    /// [`CorticalError::SerializationError`] for malformed JSON.
    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// The three stages plus their reusable scratch SDRs.
///
/// # Example
///
/// ```rust
/// use cortical::pipeline::{HtmPipeline, PipelineConfig};
///
/// let mut config = PipelineConfig::default();
/// config.spatial_pooler.column_dimensions = vec![256];
/// config.spatial_pooler.num_active_columns_per_inh_area = 10;
/// config.temporal_memory.column_dimensions = vec![256];
/// config.temporal_memory.cells_per_column = 4;
///
/// let mut pipeline = HtmPipeline::new(config).unwrap();
/// let cells = pipeline.step(21.5, true).unwrap();
/// assert_eq!(cells.len(), 10 * 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HtmPipeline {
    encoder: RandomDistributedScalarEncoder,
    spatial_pooler: SpatialPooler,
    temporal_memory: TemporalMemory,
    encoding: Sdr,
    active_columns: Sdr,
}

impl HtmPipeline {
    /// Builds every stage from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] if the config fails
    /// [`PipelineConfig::validate`] or the encoder parameters are invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let encoder = RandomDistributedScalarEncoder::new(config.encoder)?;
        let encoding = Sdr::new(&config.spatial_pooler.input_dimensions);
        let active_columns = Sdr::new(&config.spatial_pooler.column_dimensions);
        let spatial_pooler = SpatialPooler::new(config.spatial_pooler)?;
        let temporal_memory = TemporalMemory::new(config.temporal_memory)?;

        Ok(Self {
            encoder,
            spatial_pooler,
            temporal_memory,
            encoding,
            active_columns,
        })
    }

    /// Runs one record through the stages and returns the active cells.
    ///
    /// # Errors
    ///
    /// Only errors from the encoder (a non-integer category value) can
    /// surface here; the stage shapes are fixed at construction.
    pub fn step(&mut self, value: Real, learn: bool) -> Result<&[CellIdx]> {
        // The encoder is 1-D; the pooler may see it reshaped.
        let mut flat = Sdr::new(self.encoder.dimensions());
        self.encoder.encode(value, &mut flat)?;
        self.encoding.set_sparse_unchecked(flat.get_sparse());

        self.spatial_pooler
            .compute(&self.encoding, learn, &mut self.active_columns)?;
        self.temporal_memory.compute(&self.active_columns, learn)?;

        log::trace!(
            "step {value}: {} columns, {} cells, anomaly {:.3}",
            self.active_columns.get_sum(),
            self.temporal_memory.active_cells().len(),
            self.temporal_memory.anomaly()
        );

        Ok(self.temporal_memory.active_cells())
    }

    /// Runs every value in order and collects the active cells of each step.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step.
    pub fn run<I>(&mut self, values: I, learn: bool) -> Result<Vec<Vec<CellIdx>>>
    where
        I: IntoIterator<Item = Real>,
    {
        values
            .into_iter()
            .map(|value| self.step(value, learn).map(<[CellIdx]>::to_vec))
            .collect()
    }

    /// Starts a new sequence without forgetting anything learned.
    pub fn reset(&mut self) {
        self.temporal_memory.reset();
    }

    /// The encoding of the last step.
    pub fn encoding(&self) -> &Sdr {
        &self.encoding
    }

    /// The active columns of the last step.
    pub fn active_columns(&self) -> &Sdr {
        &self.active_columns
    }

    /// The active cells of the last step.
    pub fn active_cells(&self) -> &[CellIdx] {
        self.temporal_memory.active_cells()
    }

    /// Raw anomaly of the last step.
    pub fn anomaly(&self) -> Real {
        self.temporal_memory.anomaly()
    }

    /// The encoder stage.
    pub fn encoder(&self) -> &RandomDistributedScalarEncoder {
        &self.encoder
    }

    /// The spatial pooler stage.
    pub fn spatial_pooler(&self) -> &SpatialPooler {
        &self.spatial_pooler
    }

    /// The temporal memory stage.
    pub fn temporal_memory(&self) -> &TemporalMemory {
        &self.temporal_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.spatial_pooler.column_dimensions = vec![128];
        config.spatial_pooler.num_active_columns_per_inh_area = 8;
        config.temporal_memory = TemporalMemoryParams {
            column_dimensions: vec![128],
            cells_per_column: 4,
            activation_threshold: 4,
            min_threshold: 3,
            max_new_synapse_count: 8,
            max_synapses_per_segment: 16,
            connected_permanence: 0.5,
            ..config.temporal_memory
        };
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_mismatched_stages_rejected() {
        let mut config = small_config();
        config.temporal_memory.column_dimensions = vec![64];
        let err = HtmPipeline::new(config).unwrap_err();
        assert!(err.is_config_error());

        let mut config = small_config();
        config.encoder.size = 120;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_reshaped_encoding() {
        let mut config = small_config();
        config.spatial_pooler.input_dimensions = vec![10, 10];
        config.spatial_pooler.potential_radius = 5;

        let mut pipeline = HtmPipeline::new(config).unwrap();
        pipeline.step(3.0, true).unwrap();
        assert_eq!(pipeline.encoding().dimensions(), &[10, 10]);
        assert_eq!(pipeline.encoding().get_sum(), 10);
    }

    #[test]
    fn test_step_shapes() {
        let mut pipeline = HtmPipeline::new(small_config()).unwrap();
        let cells = pipeline.step(42.0, true).unwrap().to_vec();

        assert_eq!(pipeline.encoding().get_sum(), 10);
        assert_eq!(pipeline.active_columns().get_sum(), 8);
        // Nothing is predicted yet, so all active columns burst.
        assert_eq!(cells.len(), 8 * 4);
        assert_eq!(pipeline.anomaly(), 1.0);
    }

    #[test]
    fn test_nan_record_encodes_empty() {
        let mut pipeline = HtmPipeline::new(small_config()).unwrap();
        pipeline.step(1.0, true).unwrap();
        pipeline.step(Real::NAN, true).unwrap();
        assert_eq!(pipeline.encoding().get_sum(), 0);
        // With a zero stimulus threshold the pooler still picks its quota.
        assert_eq!(pipeline.active_columns().get_sum(), 8);
    }

    #[test]
    fn test_run_collects_each_step() {
        let mut pipeline = HtmPipeline::new(small_config()).unwrap();
        let out = pipeline.run([1.0, 20.0, 40.0], true).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], pipeline.active_cells());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "encoder": { "size": 100, "sparsity": 0.1, "radius": 10.0, "seed": 7 },
            "spatial_pooler": { "input_dimensions": [100], "column_dimensions": [64],
                                "local_area_density": 0.0,
                                "num_active_columns_per_inh_area": 4 },
            "temporal_memory": { "column_dimensions": [64], "cells_per_column": 2 }
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.encoder.seed, 7);
        assert_eq!(config.temporal_memory.activation_threshold, 13);
        assert!(HtmPipeline::new(config).is_ok());

        assert!(PipelineConfig::from_json_str("{ not json").is_err());
        assert!(matches!(
            PipelineConfig::from_json_file("/nonexistent/cortical.json"),
            Err(CorticalError::IoError { .. })
        ));
    }
}
