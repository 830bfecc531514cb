//! Temporal Memory implementation.
//!
//! The Temporal Memory learns sequences of active-column sets. Each column
//! holds `cells_per_column` cells; distal segments on those cells learn
//! which cells were active one step earlier. A cell with an active segment
//! is predictive, and if its column then becomes active only the predicted
//! cells fire. An unpredicted column bursts: every cell fires and one winner
//! cell learns the transition.
//!
//! Each `compute` first activates cells from the previous step's dendrite
//! state, then recomputes the dendrites from the new active cells, so
//! [`predictive_cells`](TemporalMemory::predictive_cells) always describes
//! the next step.

use crate::algorithms::Connections;
use crate::error::{CorticalError, Result};
use crate::types::{CellIdx, Permanence, Real, Sdr, Segment, SegmentIdx, SynapseIdx, UInt};
use crate::utils::{Random, Topology};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating a Temporal Memory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TemporalMemoryParams {
    /// Dimensions of the column space. Must match the spatial pooler output.
    pub column_dimensions: Vec<UInt>,

    /// Number of cells per column.
    pub cells_per_column: UInt,

    /// Active connected synapses needed for a segment to be active.
    pub activation_threshold: UInt,

    /// Initial permanence of newly grown synapses.
    pub initial_permanence: Permanence,

    /// Permanence at which a synapse counts as connected.
    pub connected_permanence: Permanence,

    /// Active potential synapses needed for a segment to be matching.
    pub min_threshold: UInt,

    /// Target number of active potential synapses a learning segment grows to.
    pub max_new_synapse_count: UInt,

    /// Permanence increment for synapses to previously active cells.
    pub permanence_increment: Permanence,

    /// Permanence decrement for synapses to previously inactive cells.
    pub permanence_decrement: Permanence,

    /// Punishment for matching segments whose column did not become active.
    /// 0 disables it.
    pub predicted_segment_decrement: Permanence,

    /// Maximum number of segments per cell.
    pub max_segments_per_cell: SegmentIdx,

    /// Maximum number of synapses per segment.
    pub max_synapses_per_segment: UInt,

    /// Seed for winner-cell tie breaking and synapse growth.
    pub seed: u64,
}

impl Default for TemporalMemoryParams {
    fn default() -> Self {
        Self {
            column_dimensions: vec![2048],
            cells_per_column: 32,
            activation_threshold: 13,
            initial_permanence: 0.21,
            connected_permanence: 0.5,
            min_threshold: 10,
            max_new_synapse_count: 20,
            permanence_increment: 0.1,
            permanence_decrement: 0.1,
            predicted_segment_decrement: 0.0,
            max_segments_per_cell: 255,
            max_synapses_per_segment: 255,
            seed: 42,
        }
    }
}

impl TemporalMemoryParams {
    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &'static str, message: &str| {
            Err(CorticalError::InvalidParameter {
                name,
                message: message.to_string(),
            })
        };

        if self.column_dimensions.is_empty() {
            return invalid("column_dimensions", "Cannot be empty");
        }
        if self.column_dimensions.contains(&0) {
            return invalid("column_dimensions", "Every dimension must be > 0");
        }
        if self.cells_per_column == 0 {
            return invalid("cells_per_column", "Must be > 0");
        }
        let num_cells =
            Topology::num_elements(&self.column_dimensions) as u64 * u64::from(self.cells_per_column);
        if num_cells > u64::from(CellIdx::MAX) {
            return invalid("cells_per_column", "Too many cells for a 32-bit cell index");
        }

        for (name, value) in [
            ("initial_permanence", self.initial_permanence),
            ("connected_permanence", self.connected_permanence),
            ("permanence_increment", self.permanence_increment),
            ("permanence_decrement", self.permanence_decrement),
            ("predicted_segment_decrement", self.predicted_segment_decrement),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(name, "Must be in range [0, 1]");
            }
        }

        if self.activation_threshold == 0 {
            return invalid("activation_threshold", "Must be > 0");
        }
        if self.min_threshold > self.activation_threshold {
            return invalid("min_threshold", "Must be <= activation_threshold");
        }
        if self.max_segments_per_cell == 0 {
            return invalid("max_segments_per_cell", "Must be > 0");
        }
        if self.max_synapses_per_segment == 0 {
            return invalid("max_synapses_per_segment", "Must be > 0");
        }
        if self.max_new_synapse_count > self.max_synapses_per_segment {
            return invalid("max_new_synapse_count", "Must be <= max_synapses_per_segment");
        }
        Ok(())
    }
}

/// The Temporal Memory algorithm.
///
/// # Example
///
/// ```rust
/// use cortical::algorithms::{TemporalMemory, TemporalMemoryParams};
/// use cortical::types::Sdr;
///
/// let mut tm = TemporalMemory::new(TemporalMemoryParams {
///     column_dimensions: vec![100],
///     cells_per_column: 4,
///     ..Default::default()
/// })
/// .unwrap();
///
/// let mut active_columns = Sdr::new(&[100]);
/// active_columns.set_sparse(&[1, 5, 10, 20]).unwrap();
///
/// tm.compute(&active_columns, true).unwrap();
///
/// // Nothing was predicted, so every cell of every active column fires.
/// assert_eq!(tm.active_cells().len(), 16);
/// assert_eq!(tm.anomaly(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemporalMemory {
    // Configuration
    column_dimensions: Vec<UInt>,
    cells_per_column: UInt,
    num_columns: usize,
    activation_threshold: UInt,
    initial_permanence: Permanence,
    connected_permanence: Permanence,
    min_threshold: UInt,
    max_new_synapse_count: UInt,
    permanence_increment: Permanence,
    permanence_decrement: Permanence,
    predicted_segment_decrement: Permanence,
    max_segments_per_cell: SegmentIdx,
    max_synapses_per_segment: UInt,

    connections: Connections,

    // State, all sorted ascending
    active_cells: Vec<CellIdx>,
    winner_cells: Vec<CellIdx>,
    predictive_cells: Vec<CellIdx>,
    /// Sorted by cell, then by creation order on the cell.
    active_segments: Vec<Segment>,
    matching_segments: Vec<Segment>,
    num_active_potential_synapses_for_segment: Vec<SynapseIdx>,

    anomaly: Real,
    rng: Random,
}

impl TemporalMemory {
    /// Creates a new Temporal Memory.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] if the parameters fail
    /// [`TemporalMemoryParams::validate`].
    pub fn new(params: TemporalMemoryParams) -> Result<Self> {
        params.validate()?;

        let num_columns = Topology::num_elements(&params.column_dimensions);
        let num_cells = num_columns * params.cells_per_column as usize;

        log::debug!(
            "temporal memory: {num_columns} columns x {} cells",
            params.cells_per_column
        );

        Ok(Self {
            column_dimensions: params.column_dimensions,
            cells_per_column: params.cells_per_column,
            num_columns,
            activation_threshold: params.activation_threshold,
            initial_permanence: params.initial_permanence,
            connected_permanence: params.connected_permanence,
            min_threshold: params.min_threshold,
            max_new_synapse_count: params.max_new_synapse_count,
            permanence_increment: params.permanence_increment,
            permanence_decrement: params.permanence_decrement,
            predicted_segment_decrement: params.predicted_segment_decrement,
            max_segments_per_cell: params.max_segments_per_cell,
            max_synapses_per_segment: params.max_synapses_per_segment,

            connections: Connections::new(num_cells as CellIdx, params.connected_permanence),

            active_cells: Vec::new(),
            winner_cells: Vec::new(),
            predictive_cells: Vec::new(),
            active_segments: Vec::new(),
            matching_segments: Vec::new(),
            num_active_potential_synapses_for_segment: Vec::new(),

            anomaly: 0.0,
            rng: Random::new(params.seed),
        })
    }

    /// Runs one timestep on the active columns.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::DimensionMismatch`] if `active_columns` does
    /// not have one bit per column. Nothing is modified in that case.
    pub fn compute(&mut self, active_columns: &Sdr, learn: bool) -> Result<()> {
        if active_columns.size() != self.num_columns {
            return Err(CorticalError::DimensionMismatch {
                expected: self.column_dimensions.clone(),
                actual: active_columns.dimensions().to_vec(),
            });
        }

        let columns = active_columns.get_sparse();
        self.activate_cells(&columns, learn);
        self.activate_dendrites(learn);
        Ok(())
    }

    /// Computes the new active and winner cells from the active columns and
    /// the segments that were active at the end of the previous step.
    fn activate_cells(&mut self, columns: &[u32], learn: bool) {
        let prev_active_cells = std::mem::take(&mut self.active_cells);
        let prev_winner_cells = std::mem::take(&mut self.winner_cells);
        let active_segments = std::mem::take(&mut self.active_segments);
        let matching_segments = std::mem::take(&mut self.matching_segments);

        // Learning may free segment slots and reuse them on other cells, so
        // owners are resolved once, up front.
        let active_owners = self.segment_columns(&active_segments);
        let matching_owners = self.segment_columns(&matching_segments);

        self.anomaly = self.raw_anomaly(columns);

        if learn && self.predicted_segment_decrement > 0.0 {
            self.punish_predicted_columns(
                columns,
                &matching_segments,
                &matching_owners,
                &prev_active_cells,
            );
        }

        for &column in columns {
            let column = column as usize;
            let active_in_column = &active_segments[column_range(&active_owners, column)];
            if active_in_column.is_empty() {
                let matching_in_column = &matching_segments[column_range(&matching_owners, column)];
                self.burst_column(
                    column,
                    matching_in_column,
                    &prev_active_cells,
                    &prev_winner_cells,
                    learn,
                );
            } else {
                self.activate_predicted_column(
                    active_in_column,
                    &prev_active_cells,
                    &prev_winner_cells,
                    learn,
                );
            }
        }

        self.active_segments = active_segments;
        self.matching_segments = matching_segments;
    }

    /// Fraction of active columns that held no predictive cell.
    fn raw_anomaly(&self, columns: &[u32]) -> Real {
        if columns.is_empty() {
            return 0.0;
        }
        let predicted = columns
            .iter()
            .filter(|&&column| {
                let first = self.column_cell(column as usize, 0);
                let start = self.predictive_cells.partition_point(|&c| c < first);
                self.predictive_cells
                    .get(start)
                    .is_some_and(|&c| c < first + self.cells_per_column)
            })
            .count();
        1.0 - predicted as Real / columns.len() as Real
    }

    fn segment_columns(&self, segments: &[Segment]) -> Vec<usize> {
        segments
            .iter()
            .map(|&s| self.cell_column(self.connections.cell_for_segment(s)))
            .collect()
    }

    fn activate_predicted_column(
        &mut self,
        active_segments: &[Segment],
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
        learn: bool,
    ) {
        for &segment in active_segments {
            let cell = self.connections.cell_for_segment(segment);
            if self.active_cells.last() != Some(&cell) {
                self.active_cells.push(cell);
                self.winner_cells.push(cell);
            }

            if learn {
                self.learn_on_segment(segment, prev_active_cells, prev_winner_cells);
            }
        }
    }

    fn burst_column(
        &mut self,
        column: usize,
        matching_segments: &[Segment],
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
        learn: bool,
    ) {
        let first = self.column_cell(column, 0);
        self.active_cells
            .extend(first..first + self.cells_per_column);

        let best_matching = matching_segments.iter().copied().reduce(|best, s| {
            if self.num_active_potential(s) > self.num_active_potential(best) {
                s
            } else {
                best
            }
        });

        let winner = if let Some(segment) = best_matching {
            let cell = self.connections.cell_for_segment(segment);
            if learn {
                self.learn_on_segment(segment, prev_active_cells, prev_winner_cells);
            }
            cell
        } else {
            let cell = self.least_used_cell(column);
            if learn {
                let n_grow = (self.max_new_synapse_count as usize).min(prev_winner_cells.len());
                if n_grow > 0 {
                    let segment = self
                        .connections
                        .create_segment(cell, self.max_segments_per_cell);
                    self.grow_synapses(segment, prev_winner_cells, n_grow);
                }
            }
            cell
        };

        self.winner_cells.push(winner);
    }

    /// Reinforces `segment` against the previous active cells, then grows it
    /// toward `max_new_synapse_count` active potential synapses.
    fn learn_on_segment(
        &mut self,
        segment: Segment,
        prev_active_cells: &[CellIdx],
        prev_winner_cells: &[CellIdx],
    ) {
        let destroyed = self.connections.adapt_segment(
            segment,
            prev_active_cells,
            self.permanence_increment,
            self.permanence_decrement,
            true,
        );
        if destroyed {
            return;
        }

        let n_grow = (self.max_new_synapse_count as usize)
            .saturating_sub(self.num_active_potential(segment) as usize);
        if n_grow > 0 {
            self.grow_synapses(segment, prev_winner_cells, n_grow);
        }
    }

    fn punish_predicted_columns(
        &mut self,
        columns: &[u32],
        matching_segments: &[Segment],
        owners: &[usize],
        prev_active_cells: &[CellIdx],
    ) {
        for (&segment, &column) in matching_segments.iter().zip(owners) {
            if columns.binary_search(&(column as u32)).is_err() {
                self.connections.adapt_segment(
                    segment,
                    prev_active_cells,
                    -self.predicted_segment_decrement,
                    0.0,
                    true,
                );
            }
        }
    }

    fn grow_synapses(&mut self, segment: Segment, candidates: &[CellIdx], n_grow: usize) {
        self.connections.grow_synapses(
            segment,
            candidates,
            self.initial_permanence,
            &mut self.rng,
            n_grow,
            self.max_synapses_per_segment as usize,
        );
    }

    /// A cell of `column` with the fewest segments; ties are broken by the RNG.
    fn least_used_cell(&mut self, column: usize) -> CellIdx {
        let first = self.column_cell(column, 0);
        let cells = first..first + self.cells_per_column;

        let fewest = cells
            .clone()
            .map(|c| self.connections.num_segments_on_cell(c))
            .min()
            .unwrap_or(0);
        let candidates: Vec<CellIdx> = cells
            .filter(|&c| self.connections.num_segments_on_cell(c) == fewest)
            .collect();

        candidates[self.rng.get_usize(candidates.len())]
    }

    /// Recomputes active and matching segments and the predictive cells from
    /// the current active cells.
    fn activate_dendrites(&mut self, learn: bool) {
        let (connected, potential) = self.connections.compute_activity(&self.active_cells);

        self.active_segments.clear();
        self.matching_segments.clear();
        for cell in 0..self.connections.num_cells() as CellIdx {
            for &segment in self.connections.segments_for_cell(cell) {
                if connected[segment as usize] >= self.activation_threshold {
                    self.active_segments.push(segment);
                }
                if potential[segment as usize] >= self.min_threshold {
                    self.matching_segments.push(segment);
                }
            }
        }

        if learn {
            for &segment in &self.active_segments {
                self.connections.touch_segment(segment);
            }
        }

        self.predictive_cells.clear();
        for &segment in &self.active_segments {
            let cell = self.connections.cell_for_segment(segment);
            if self.predictive_cells.last() != Some(&cell) {
                self.predictive_cells.push(cell);
            }
        }

        self.num_active_potential_synapses_for_segment = potential;
    }

    fn num_active_potential(&self, segment: Segment) -> SynapseIdx {
        self.num_active_potential_synapses_for_segment
            .get(segment as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Clears the sequence state. Learned segments and synapses are kept, so
    /// the next input is treated as the start of a new sequence.
    pub fn reset(&mut self) {
        self.active_cells.clear();
        self.winner_cells.clear();
        self.predictive_cells.clear();
        self.active_segments.clear();
        self.matching_segments.clear();
        self.num_active_potential_synapses_for_segment.clear();
    }

    // ========================================================================
    // Cell/Column utilities
    // ========================================================================

    #[inline]
    fn column_cell(&self, column: usize, offset: usize) -> CellIdx {
        (column * self.cells_per_column as usize + offset) as CellIdx
    }

    #[inline]
    fn cell_column(&self, cell: CellIdx) -> usize {
        cell as usize / self.cells_per_column as usize
    }

    /// The column that contains `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IndexOutOfBounds`] for an unknown cell.
    pub fn column_for_cell(&self, cell: CellIdx) -> Result<usize> {
        if cell as usize >= self.num_cells() {
            return Err(CorticalError::IndexOutOfBounds {
                index: cell as usize,
                size: self.num_cells(),
            });
        }
        Ok(self.cell_column(cell))
    }

    /// The cells of `column`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IndexOutOfBounds`] for an unknown column.
    pub fn cells_for_column(&self, column: usize) -> Result<Vec<CellIdx>> {
        if column >= self.num_columns {
            return Err(CorticalError::IndexOutOfBounds {
                index: column,
                size: self.num_columns,
            });
        }
        let first = self.column_cell(column, 0);
        Ok((first..first + self.cells_per_column).collect())
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Cells active in the current step, ascending.
    pub fn active_cells(&self) -> &[CellIdx] {
        &self.active_cells
    }

    /// Winner (learning) cells of the current step, ascending.
    pub fn winner_cells(&self) -> &[CellIdx] {
        &self.winner_cells
    }

    /// Cells predicted to become active in the next step, ascending.
    pub fn predictive_cells(&self) -> &[CellIdx] {
        &self.predictive_cells
    }

    /// Active segments for the next step, sorted by cell.
    pub fn active_segments(&self) -> &[Segment] {
        &self.active_segments
    }

    /// Matching segments for the next step, sorted by cell.
    pub fn matching_segments(&self) -> &[Segment] {
        &self.matching_segments
    }

    fn cells_sdr(&self, cells: &[CellIdx]) -> Sdr {
        let mut dims = self.column_dimensions.clone();
        dims.push(self.cells_per_column);
        let mut sdr = Sdr::new(&dims);
        sdr.set_sparse_unchecked(cells.to_vec());
        sdr
    }

    /// Active cells as an SDR shaped `column_dimensions + [cells_per_column]`.
    pub fn active_cells_sdr(&self) -> Sdr {
        self.cells_sdr(&self.active_cells)
    }

    /// Winner cells as an SDR.
    pub fn winner_cells_sdr(&self) -> Sdr {
        self.cells_sdr(&self.winner_cells)
    }

    /// Predictive cells as an SDR.
    pub fn predictive_cells_sdr(&self) -> Sdr {
        self.cells_sdr(&self.predictive_cells)
    }

    /// Raw anomaly of the last step: the fraction of active columns that
    /// were not predicted. 0 when no column was active.
    pub fn anomaly(&self) -> Real {
        self.anomaly
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Returns the column dimensions.
    pub fn column_dimensions(&self) -> &[UInt] {
        &self.column_dimensions
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the number of cells.
    pub fn num_cells(&self) -> usize {
        self.connections.num_cells()
    }

    /// Returns the number of cells per column.
    pub fn cells_per_column(&self) -> UInt {
        self.cells_per_column
    }

    /// Returns the activation threshold.
    pub fn activation_threshold(&self) -> UInt {
        self.activation_threshold
    }

    /// Returns the minimum threshold.
    pub fn min_threshold(&self) -> UInt {
        self.min_threshold
    }

    /// Returns the initial permanence of grown synapses.
    pub fn initial_permanence(&self) -> Permanence {
        self.initial_permanence
    }

    /// Returns the connected permanence threshold.
    pub fn connected_permanence(&self) -> Permanence {
        self.connected_permanence
    }

    /// Returns the maximum segments per cell.
    pub fn max_segments_per_cell(&self) -> SegmentIdx {
        self.max_segments_per_cell
    }

    /// Returns the maximum synapses per segment.
    pub fn max_synapses_per_segment(&self) -> UInt {
        self.max_synapses_per_segment
    }

    /// The distal synapse graph.
    pub fn connections(&self) -> &Connections {
        &self.connections
    }
}

/// Index range of `column` within an ascending list of owner columns.
fn column_range(owners: &[usize], column: usize) -> std::ops::Range<usize> {
    let start = owners.partition_point(|&c| c < column);
    let end = owners.partition_point(|&c| c <= column);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TemporalMemoryParams {
        TemporalMemoryParams {
            column_dimensions: vec![32],
            cells_per_column: 4,
            activation_threshold: 3,
            min_threshold: 2,
            max_new_synapse_count: 4,
            initial_permanence: 0.21,
            connected_permanence: 0.5,
            permanence_increment: 0.1,
            permanence_decrement: 0.1,
            ..Default::default()
        }
    }

    fn columns(bits: &[u32]) -> Sdr {
        let mut sdr = Sdr::new(&[32]);
        sdr.set_sparse(bits).unwrap();
        sdr
    }

    #[test]
    fn test_invalid_params() {
        let cases = [
            TemporalMemoryParams {
                column_dimensions: vec![],
                ..params()
            },
            TemporalMemoryParams {
                cells_per_column: 0,
                ..params()
            },
            TemporalMemoryParams {
                activation_threshold: 0,
                min_threshold: 0,
                ..params()
            },
            TemporalMemoryParams {
                min_threshold: 4,
                ..params()
            },
            TemporalMemoryParams {
                initial_permanence: 1.5,
                ..params()
            },
            TemporalMemoryParams {
                max_segments_per_cell: 0,
                ..params()
            },
            TemporalMemoryParams {
                max_synapses_per_segment: 3,
                ..params()
            },
        ];
        for p in cases {
            assert!(TemporalMemory::new(p).unwrap_err().is_config_error());
        }
    }

    #[test]
    fn test_unpredicted_columns_burst() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        tm.compute(&columns(&[0, 5]), true).unwrap();

        assert_eq!(tm.active_cells(), &[0, 1, 2, 3, 20, 21, 22, 23]);
        assert_eq!(tm.winner_cells().len(), 2);
        assert_eq!(tm.column_for_cell(tm.winner_cells()[1]).unwrap(), 5);
        assert!(tm.predictive_cells().is_empty());
        assert_eq!(tm.anomaly(), 1.0);
    }

    #[test]
    fn test_growth_on_burst_needs_previous_winners() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        tm.compute(&columns(&[0, 1, 2]), true).unwrap();
        assert_eq!(tm.connections().num_segments(), 0);

        tm.compute(&columns(&[10, 11, 12]), true).unwrap();
        assert_eq!(tm.connections().num_segments(), 3);
        assert_eq!(tm.connections().num_synapses(), 9);
    }

    #[test]
    fn test_no_learning_no_growth() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        for _ in 0..5 {
            tm.compute(&columns(&[0, 1, 2]), false).unwrap();
            tm.compute(&columns(&[10, 11, 12]), false).unwrap();
        }
        assert_eq!(tm.connections().num_segments(), 0);
    }

    #[test]
    fn test_learns_sequence() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        let a = columns(&[0, 1, 2, 3]);
        let b = columns(&[10, 11, 12, 13]);

        for _ in 0..10 {
            tm.reset();
            tm.compute(&a, true).unwrap();
            tm.compute(&b, true).unwrap();
        }

        tm.reset();
        tm.compute(&a, false).unwrap();
        assert_eq!(tm.anomaly(), 1.0);
        assert!(!tm.predictive_cells().is_empty());
        for &cell in tm.predictive_cells() {
            let column = tm.column_for_cell(cell).unwrap() as u32;
            assert!((10..14).contains(&column));
        }

        tm.compute(&b, false).unwrap();
        assert_eq!(tm.anomaly(), 0.0);
        assert!(tm.active_cells().len() < 16);
    }

    #[test]
    fn test_reset_keeps_synapses() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        tm.compute(&columns(&[0, 1, 2]), true).unwrap();
        tm.compute(&columns(&[10, 11, 12]), true).unwrap();
        let segments = tm.connections().num_segments();

        tm.reset();

        assert!(tm.active_cells().is_empty());
        assert!(tm.winner_cells().is_empty());
        assert!(tm.predictive_cells().is_empty());
        assert_eq!(tm.connections().num_segments(), segments);

        // Without context nothing can grow.
        tm.compute(&columns(&[20]), true).unwrap();
        assert_eq!(tm.connections().num_segments(), segments);
    }

    #[test]
    fn test_wrong_size_leaves_state_untouched() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        tm.compute(&columns(&[1, 2]), true).unwrap();
        let snapshot = tm.clone();

        let err = tm.compute(&Sdr::new(&[33]), true).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(tm, snapshot);
    }

    #[test]
    fn test_same_seed_same_outputs() {
        let mut a = TemporalMemory::new(params()).unwrap();
        let mut b = TemporalMemory::new(params()).unwrap();
        let seq = [columns(&[0, 4, 8]), columns(&[1, 5, 9]), columns(&[2, 6, 10])];

        for step in seq.iter().cycle().take(30) {
            a.compute(step, true).unwrap();
            b.compute(step, true).unwrap();
            assert_eq!(a.active_cells(), b.active_cells());
            assert_eq!(a.winner_cells(), b.winner_cells());
            assert_eq!(a.predictive_cells(), b.predictive_cells());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_segment_and_synapse_limits() {
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            cells_per_column: 1,
            max_segments_per_cell: 2,
            max_synapses_per_segment: 4,
            ..params()
        })
        .unwrap();

        // Column 31 always follows a different context.
        for context in 0..10u32 {
            tm.compute(&columns(&[context, context + 10, context + 20]), true)
                .unwrap();
            tm.compute(&columns(&[31]), true).unwrap();
        }

        assert!(tm.connections().num_segments_on_cell(31) <= 2);
        for &segment in tm.connections().segments_for_cell(31) {
            assert!(tm.connections().num_synapses_on_segment(segment) <= 4);
        }
    }

    #[test]
    fn test_predicted_segment_decrement_punishes_wrong_predictions() {
        let mut tm = TemporalMemory::new(TemporalMemoryParams {
            predicted_segment_decrement: 0.05,
            ..params()
        })
        .unwrap();
        let a = columns(&[0, 1, 2, 3]);
        let b = columns(&[10, 11, 12, 13]);
        let c = columns(&[20, 21, 22, 23]);

        tm.compute(&a, true).unwrap();
        tm.compute(&b, true).unwrap();
        tm.reset();
        tm.compute(&a, true).unwrap();

        let total = |tm: &TemporalMemory| -> f32 {
            tm.matching_segments()
                .iter()
                .flat_map(|&s| tm.connections().synapses_for_segment(s).to_vec())
                .map(|syn| tm.connections().data_for_synapse(syn).permanence)
                .sum()
        };
        assert!(!tm.matching_segments().is_empty());
        let before = total(&tm);
        let punished: Vec<Segment> = tm.matching_segments().to_vec();

        tm.compute(&c, true).unwrap();

        let after: f32 = punished
            .iter()
            .flat_map(|&s| tm.connections().synapses_for_segment(s).to_vec())
            .map(|syn| tm.connections().data_for_synapse(syn).permanence)
            .sum();
        assert!(after < before);
    }

    #[test]
    fn test_cell_sdrs() {
        let mut tm = TemporalMemory::new(params()).unwrap();
        tm.compute(&columns(&[3]), true).unwrap();

        let sdr = tm.active_cells_sdr();
        assert_eq!(sdr.dimensions(), &[32, 4]);
        assert_eq!(sdr.get_sparse(), vec![12, 13, 14, 15]);
        assert_eq!(tm.winner_cells_sdr().get_sum(), 1);
        assert_eq!(tm.predictive_cells_sdr().get_sum(), 0);
        assert!(tm.cells_for_column(32).is_err());
        assert!(tm.column_for_cell(128).is_err());
    }
}
