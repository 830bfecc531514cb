//! Spatial Pooler implementation.
//!
//! The Spatial Pooler turns an input SDR into a sparse set of active columns
//! whose size is fixed by configuration. Each column owns one proximal
//! segment in a [`Connections`] graph; its synapses cover a seeded random
//! subset of the input bits around the column's center. With learning on,
//! winning columns reinforce synapses to the active inputs, and duty cycles
//! and boosting keep every column in use.

use crate::algorithms::Connections;
use crate::error::{CorticalError, Result};
use crate::types::{CellIdx, Permanence, Real, Sdr, Segment, SynapseIdx, UInt};
use crate::utils::{Neighborhood, Random, Topology, WrappingMode};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Iterations between refreshes of the minimum duty cycles and the
/// inhibition radius.
const UPDATE_PERIOD: UInt = 50;

/// Parameters for creating a Spatial Pooler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpatialPoolerParams {
    /// Dimensions of the input space (e.g., `vec![100]` for 100 inputs).
    pub input_dimensions: Vec<UInt>,

    /// Dimensions of the column space (e.g., `vec![2048]` for 2048 columns).
    pub column_dimensions: Vec<UInt>,

    /// Radius, in input bits, of the region around a column's center that
    /// its potential pool is drawn from.
    pub potential_radius: UInt,

    /// Fraction of that region each column may connect to, in `(0, 1]`.
    pub potential_pct: Real,

    /// If true, all columns compete globally. If false, each column competes
    /// within its inhibition neighborhood.
    pub global_inhibition: bool,

    /// Target fraction of active columns. Set to 0 when using
    /// `num_active_columns_per_inh_area`.
    pub local_area_density: Real,

    /// Target number of active columns per inhibition area. Set to 0 when
    /// using `local_area_density`.
    pub num_active_columns_per_inh_area: UInt,

    /// Minimum boosted overlap for a column to become active.
    pub stimulus_threshold: UInt,

    /// Permanence decrement for synapses to inactive inputs.
    pub syn_perm_inactive_dec: Permanence,

    /// Permanence increment for synapses to active inputs.
    pub syn_perm_active_inc: Permanence,

    /// Permanence at which a synapse counts as connected.
    pub syn_perm_connected: Permanence,

    /// A column whose overlap duty cycle falls below this fraction of the
    /// best in its neighborhood gets all of its permanences bumped.
    pub min_pct_overlap_duty_cycles: Real,

    /// Window, in learning iterations, of the duty cycle moving averages.
    pub duty_cycle_period: UInt,

    /// Strength of boosting (0.0 disables it).
    pub boost_strength: Real,

    /// Seed for potential pools and initial permanences.
    pub seed: u64,

    /// Whether the input and column spaces wrap at their edges.
    pub wrap_around: bool,
}

impl Default for SpatialPoolerParams {
    fn default() -> Self {
        Self {
            input_dimensions: vec![100],
            column_dimensions: vec![2048],
            potential_radius: 16,
            potential_pct: 0.5,
            global_inhibition: true,
            local_area_density: 0.05,
            num_active_columns_per_inh_area: 0,
            stimulus_threshold: 0,
            syn_perm_inactive_dec: 0.008,
            syn_perm_active_inc: 0.05,
            syn_perm_connected: 0.1,
            min_pct_overlap_duty_cycles: 0.001,
            duty_cycle_period: 1000,
            boost_strength: 0.0,
            seed: 1,
            wrap_around: true,
        }
    }
}

fn invalid(name: &'static str, message: impl Into<String>) -> CorticalError {
    CorticalError::InvalidParameter {
        name,
        message: message.into(),
    }
}

impl SpatialPoolerParams {
    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        for (name, dims) in [
            ("input_dimensions", &self.input_dimensions),
            ("column_dimensions", &self.column_dimensions),
        ] {
            if dims.is_empty() {
                return Err(invalid(name, "Cannot be empty"));
            }
            if dims.contains(&0) {
                return Err(invalid(name, "Every dimension must be > 0"));
            }
        }
        if !(self.potential_pct > 0.0 && self.potential_pct <= 1.0) {
            return Err(invalid("potential_pct", "Must be in range (0, 1]"));
        }

        let by_density = self.local_area_density > 0.0;
        let by_count = self.num_active_columns_per_inh_area > 0;
        if by_density == by_count {
            return Err(invalid(
                "local_area_density",
                "Exactly one of local_area_density and num_active_columns_per_inh_area must be set",
            ));
        }
        if by_density && self.local_area_density > 0.5 {
            return Err(invalid("local_area_density", "Must be in range (0, 0.5]"));
        }

        for (name, value) in [
            ("syn_perm_inactive_dec", self.syn_perm_inactive_dec),
            ("syn_perm_active_inc", self.syn_perm_active_inc),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, "Must be in range [0, 1]"));
            }
        }
        if !(self.syn_perm_connected > 0.0 && self.syn_perm_connected < 1.0) {
            return Err(invalid("syn_perm_connected", "Must be in range (0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.min_pct_overlap_duty_cycles) {
            return Err(invalid("min_pct_overlap_duty_cycles", "Must be in range [0, 1]"));
        }
        if self.duty_cycle_period == 0 {
            return Err(invalid("duty_cycle_period", "Must be > 0"));
        }
        if !(self.boost_strength >= 0.0 && self.boost_strength.is_finite()) {
            return Err(invalid("boost_strength", "Must be finite and >= 0"));
        }

        if self.global_inhibition && self.num_active_global() == 0 {
            return Err(invalid(
                "local_area_density",
                "Selects zero active columns for this column count",
            ));
        }
        Ok(())
    }

    fn num_columns(&self) -> usize {
        Topology::num_elements(&self.column_dimensions)
    }

    /// Number of winners under global inhibition.
    fn num_active_global(&self) -> usize {
        let num_columns = self.num_columns();
        if self.num_active_columns_per_inh_area > 0 {
            (self.num_active_columns_per_inh_area as usize).min(num_columns)
        } else {
            (self.local_area_density * num_columns as Real).round() as usize
        }
    }
}

/// The Spatial Pooler algorithm.
///
/// # Example
///
/// ```rust
/// use cortical::algorithms::{SpatialPooler, SpatialPoolerParams};
/// use cortical::types::Sdr;
///
/// let mut sp = SpatialPooler::new(SpatialPoolerParams {
///     input_dimensions: vec![100],
///     column_dimensions: vec![200],
///     ..Default::default()
/// })
/// .unwrap();
///
/// let mut input = Sdr::new(&[100]);
/// let mut output = Sdr::new(&[200]);
///
/// input.set_sparse(&[1, 5, 10, 20, 30]).unwrap();
/// sp.compute(&input, true, &mut output).unwrap();
/// assert_eq!(output.get_sum(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialPooler {
    // Configuration
    input_dimensions: Vec<UInt>,
    column_dimensions: Vec<UInt>,
    num_inputs: usize,
    num_columns: usize,
    potential_radius: UInt,
    potential_pct: Real,
    global_inhibition: bool,
    local_area_density: Real,
    num_active_columns_per_inh_area: UInt,
    stimulus_threshold: UInt,
    duty_cycle_period: UInt,
    boost_strength: Real,
    wrap_around: bool,

    syn_perm_inactive_dec: Permanence,
    syn_perm_active_inc: Permanence,
    syn_perm_below_stimulus_inc: Permanence,
    syn_perm_connected: Permanence,
    min_pct_overlap_duty_cycles: Real,

    // State
    inhibition_radius: UInt,
    boost_factors: Vec<Real>,
    overlap_duty_cycles: Vec<Real>,
    active_duty_cycles: Vec<Real>,
    min_overlap_duty_cycles: Vec<Real>,
    overlaps: Vec<SynapseIdx>,
    boosted_overlaps: Vec<Real>,

    /// One proximal segment per column; segment handle == column index.
    connections: Connections,

    iteration_num: UInt,
    iteration_learn_num: UInt,

    /// Inhibition neighbors, only populated under local inhibition.
    neighbor_map: Neighborhood,

    rng: Random,
}

impl SpatialPooler {
    /// Creates a new Spatial Pooler.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] if the parameters fail
    /// [`SpatialPoolerParams::validate`].
    pub fn new(params: SpatialPoolerParams) -> Result<Self> {
        params.validate()?;

        let num_inputs = Topology::num_elements(&params.input_dimensions);
        let num_columns = params.num_columns();

        let mut sp = Self {
            input_dimensions: params.input_dimensions.clone(),
            column_dimensions: params.column_dimensions.clone(),
            num_inputs,
            num_columns,
            potential_radius: params.potential_radius,
            potential_pct: params.potential_pct,
            global_inhibition: params.global_inhibition,
            local_area_density: params.local_area_density,
            num_active_columns_per_inh_area: params.num_active_columns_per_inh_area,
            stimulus_threshold: params.stimulus_threshold,
            duty_cycle_period: params.duty_cycle_period,
            boost_strength: params.boost_strength,
            wrap_around: params.wrap_around,

            syn_perm_inactive_dec: params.syn_perm_inactive_dec,
            syn_perm_active_inc: params.syn_perm_active_inc,
            syn_perm_below_stimulus_inc: params.syn_perm_connected / 10.0,
            syn_perm_connected: params.syn_perm_connected,
            min_pct_overlap_duty_cycles: params.min_pct_overlap_duty_cycles,

            inhibition_radius: 0,
            boost_factors: vec![1.0; num_columns],
            overlap_duty_cycles: vec![0.0; num_columns],
            active_duty_cycles: vec![0.0; num_columns],
            min_overlap_duty_cycles: vec![0.0; num_columns],
            overlaps: vec![0; num_columns],
            boosted_overlaps: vec![0.0; num_columns],

            connections: Connections::new(num_columns as CellIdx, params.syn_perm_connected),

            iteration_num: 0,
            iteration_learn_num: 0,

            neighbor_map: Neighborhood::default(),
            rng: Random::new(params.seed),
        };

        sp.initialize_columns();
        sp.update_inhibition_radius();

        log::debug!(
            "spatial pooler: {} inputs, {} columns, {} synapses, inhibition radius {}",
            sp.num_inputs,
            sp.num_columns,
            sp.connections.num_synapses(),
            sp.inhibition_radius
        );
        Ok(sp)
    }

    fn wrap_mode(&self) -> WrappingMode {
        WrappingMode::from(self.wrap_around)
    }

    #[inline]
    fn segment_for_column(column: usize) -> Segment {
        column as Segment
    }

    /// Builds every column's potential pool and initial permanences.
    fn initialize_columns(&mut self) {
        for column in 0..self.num_columns {
            let mut potential = self.init_map_potential(column);
            potential.sort_unstable();

            let segment = self.connections.create_segment(column as CellIdx, 1);
            debug_assert_eq!(segment, Self::segment_for_column(column));

            for input in potential {
                let permanence = self.init_permanence();
                self.connections
                    .create_synapse(segment, input as CellIdx, permanence);
            }
            self.connections
                .raise_permanences_to_threshold(segment, self.stimulus_threshold as usize);
        }
    }

    /// Samples `round(potential_pct * |neighborhood|)` inputs around the
    /// column's center, at least one.
    fn init_map_potential(&mut self, column: usize) -> Vec<usize> {
        let neighborhood = Topology::map_potential_pool(
            column,
            &self.column_dimensions,
            &self.input_dimensions,
            self.potential_radius,
            self.wrap_mode(),
        );
        let num_potential = ((neighborhood.len() as Real) * self.potential_pct).round() as usize;
        self.rng.sample(neighborhood, num_potential.max(1))
    }

    /// Half of the synapses start just above the connected threshold, the
    /// other half anywhere below it.
    fn init_permanence(&mut self) -> Permanence {
        if self.rng.get_real64() < 0.5 {
            let p = self.syn_perm_connected + self.rng.get_real32() * self.syn_perm_active_inc / 4.0;
            p.min(1.0)
        } else {
            self.syn_perm_connected * self.rng.get_real32()
        }
    }

    /// Runs one timestep.
    ///
    /// Writes the winning columns, ascending, into `output`. With `learn`,
    /// also adapts permanences, duty cycles and boost factors.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::DimensionMismatch`] if `input` or `output`
    /// does not match the configured sizes. Nothing is modified in that case.
    pub fn compute(&mut self, input: &Sdr, learn: bool, output: &mut Sdr) -> Result<()> {
        if input.size() != self.num_inputs {
            return Err(CorticalError::DimensionMismatch {
                expected: self.input_dimensions.clone(),
                actual: input.dimensions().to_vec(),
            });
        }
        if output.size() != self.num_columns {
            return Err(CorticalError::DimensionMismatch {
                expected: self.column_dimensions.clone(),
                actual: output.dimensions().to_vec(),
            });
        }

        self.iteration_num += 1;
        if learn {
            self.iteration_learn_num += 1;
        }

        let active_inputs = input.get_sparse();
        let (overlaps, _) = self.connections.compute_activity(&active_inputs);
        self.overlaps = overlaps;
        self.boosted_overlaps = self
            .overlaps
            .iter()
            .zip(&self.boost_factors)
            .map(|(&o, &b)| (o as Real * b).min(Real::MAX))
            .collect();

        let winners = if self.global_inhibition {
            self.inhibit_columns_global()
        } else {
            self.inhibit_columns_local()
        };

        if learn {
            self.adapt_synapses(&active_inputs, &winners);
            self.update_duty_cycles(&winners);
            self.bump_up_weak_columns();
            self.update_boost_factors();

            if self.iteration_num % UPDATE_PERIOD == 0 {
                self.update_inhibition_radius();
                self.update_min_duty_cycles();
            }
        }

        output.set_sparse_unchecked(winners);
        Ok(())
    }

    // ========================================================================
    // Inhibition
    // ========================================================================

    /// Top-K boosted overlaps; equal overlaps go to the lower column index.
    fn inhibit_columns_global(&self) -> Vec<CellIdx> {
        let k = self.num_active_target();
        let overlaps = &self.boosted_overlaps;

        let mut columns: Vec<CellIdx> = (0..self.num_columns as CellIdx).collect();
        let rank = |a: &CellIdx, b: &CellIdx| {
            overlaps[*b as usize]
                .total_cmp(&overlaps[*a as usize])
                .then(a.cmp(b))
        };
        if k < columns.len() {
            columns.select_nth_unstable_by(k, rank);
            columns.truncate(k);
        }

        let threshold = self.stimulus_threshold as Real;
        columns.retain(|&c| overlaps[c as usize] >= threshold);
        columns.sort_unstable();
        columns
    }

    /// Each column competes with its inhibition neighbors. A neighbor beats
    /// it with a larger overlap, or with an equal overlap if that neighbor
    /// has already won.
    fn inhibit_columns_local(&self) -> Vec<CellIdx> {
        let density = self.local_density();
        let overlaps = &self.boosted_overlaps;
        let threshold = self.stimulus_threshold as Real;

        let mut is_winner = vec![false; self.num_columns];
        let mut winners = Vec::new();

        for column in 0..self.num_columns {
            let overlap = overlaps[column];
            if overlap < threshold {
                continue;
            }

            let neighbors = self.neighbor_map.get(column);
            let num_bigger = neighbors
                .iter()
                .filter(|&&n| {
                    let other = overlaps[n as usize];
                    other > overlap || (other == overlap && is_winner[n as usize])
                })
                .count();
            let num_allowed = (density * (neighbors.len() + 1) as Real).ceil() as usize;

            if num_bigger < num_allowed {
                is_winner[column] = true;
                winners.push(column as CellIdx);
            }
        }

        winners
    }

    /// Target density inside one inhibition area.
    fn local_density(&self) -> Real {
        if self.num_active_columns_per_inh_area == 0 {
            return self.local_area_density;
        }
        let diameter = 2 * self.inhibition_radius as usize + 1;
        let area: usize = self
            .column_dimensions
            .iter()
            .map(|&d| diameter.min(d as usize))
            .product();
        (self.num_active_columns_per_inh_area as Real / area as Real).min(0.5)
    }

    // ========================================================================
    // Learning
    // ========================================================================

    fn adapt_synapses(&mut self, active_inputs: &[u32], winners: &[CellIdx]) {
        for &column in winners {
            let segment = Self::segment_for_column(column as usize);
            self.connections.adapt_segment(
                segment,
                active_inputs,
                self.syn_perm_active_inc,
                self.syn_perm_inactive_dec,
                false,
            );
            self.connections
                .raise_permanences_to_threshold(segment, self.stimulus_threshold as usize);
        }
    }

    /// Moving averages over `min(duty_cycle_period, learning iterations)`.
    fn update_duty_cycles(&mut self, winners: &[CellIdx]) {
        let period = self.duty_cycle_period.min(self.iteration_learn_num).max(1) as Real;

        let mut active = vec![false; self.num_columns];
        for &c in winners {
            active[c as usize] = true;
        }

        for column in 0..self.num_columns {
            let overlapped = if self.overlaps[column] > 0 { 1.0 } else { 0.0 };
            let fired = if active[column] { 1.0 } else { 0.0 };
            self.overlap_duty_cycles[column] =
                (self.overlap_duty_cycles[column] * (period - 1.0) + overlapped) / period;
            self.active_duty_cycles[column] =
                (self.active_duty_cycles[column] * (period - 1.0) + fired) / period;
        }
    }

    fn bump_up_weak_columns(&mut self) {
        for column in 0..self.num_columns {
            if self.overlap_duty_cycles[column] < self.min_overlap_duty_cycles[column] {
                self.connections.bump_segment(
                    Self::segment_for_column(column),
                    self.syn_perm_below_stimulus_inc,
                );
            }
        }
    }

    /// `boost = max(1, exp(boost_strength * (target - active_duty_cycle)))`.
    fn update_boost_factors(&mut self) {
        if self.boost_strength <= 0.0 {
            return;
        }

        for column in 0..self.num_columns {
            let target = if self.global_inhibition {
                self.num_active_target() as Real / self.num_columns as Real
            } else {
                let neighbors = self.neighbor_map.get(column);
                let sum: Real = neighbors
                    .iter()
                    .map(|&n| self.active_duty_cycles[n as usize])
                    .sum::<Real>()
                    + self.active_duty_cycles[column];
                sum / (neighbors.len() + 1) as Real
            };
            let boost = (self.boost_strength * (target - self.active_duty_cycles[column])).exp();
            // exp overflows to inf for strong boosting; keep factors finite.
            self.boost_factors[column] = boost.clamp(1.0, Real::MAX);
        }
    }

    fn update_min_duty_cycles(&mut self) {
        if self.global_inhibition {
            let max_overlap = self
                .overlap_duty_cycles
                .iter()
                .copied()
                .fold(0.0, Real::max);
            self.min_overlap_duty_cycles
                .fill(self.min_pct_overlap_duty_cycles * max_overlap);
            return;
        }

        for column in 0..self.num_columns {
            let max_overlap = self
                .neighbor_map
                .get(column)
                .iter()
                .map(|&n| self.overlap_duty_cycles[n as usize])
                .fold(self.overlap_duty_cycles[column], Real::max);
            self.min_overlap_duty_cycles[column] = self.min_pct_overlap_duty_cycles * max_overlap;
        }
    }

    /// Global inhibition spans the whole column space. Local inhibition
    /// derives the radius from the average connected receptive field.
    fn update_inhibition_radius(&mut self) {
        if self.global_inhibition {
            self.inhibition_radius = self.column_dimensions.iter().copied().max().unwrap_or(1);
            return;
        }

        let total_span: f64 = (0..self.num_columns)
            .map(|column| {
                let connected: Vec<usize> = self
                    .connected_inputs(column)
                    .into_iter()
                    .map(|i| i as usize)
                    .collect();
                Topology::connected_span(&connected, &self.input_dimensions)
            })
            .sum();
        let avg_span = total_span / self.num_columns as f64;
        let diameter =
            avg_span * Topology::avg_columns_per_input(&self.column_dimensions, &self.input_dimensions);
        let radius = ((diameter - 1.0) / 2.0).round().max(1.0) as UInt;

        if radius != self.inhibition_radius || self.neighbor_map.is_empty() {
            log::trace!("inhibition radius {} -> {}", self.inhibition_radius, radius);
            self.inhibition_radius = radius;
            self.neighbor_map =
                Neighborhood::compute_all(&self.column_dimensions, radius, self.wrap_mode());
        }
    }

    fn connected_inputs(&self, column: usize) -> Vec<CellIdx> {
        let segment = Self::segment_for_column(column);
        self.connections
            .synapses_for_segment(segment)
            .iter()
            .map(|&s| self.connections.data_for_synapse(s))
            .filter(|d| d.permanence >= self.syn_perm_connected)
            .map(|d| d.presynaptic_cell)
            .collect()
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.num_columns {
            return Err(CorticalError::IndexOutOfBounds {
                index: column,
                size: self.num_columns,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Returns the input dimensions.
    pub fn input_dimensions(&self) -> &[UInt] {
        &self.input_dimensions
    }

    /// Returns the column dimensions.
    pub fn column_dimensions(&self) -> &[UInt] {
        &self.column_dimensions
    }

    /// Returns the number of inputs.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the potential radius.
    pub fn potential_radius(&self) -> UInt {
        self.potential_radius
    }

    /// Returns the potential percent.
    pub fn potential_pct(&self) -> Real {
        self.potential_pct
    }

    /// Returns whether global inhibition is enabled.
    pub fn global_inhibition(&self) -> bool {
        self.global_inhibition
    }

    /// Returns the local area density.
    pub fn local_area_density(&self) -> Real {
        self.local_area_density
    }

    /// Returns the stimulus threshold.
    pub fn stimulus_threshold(&self) -> UInt {
        self.stimulus_threshold
    }

    /// Returns the current inhibition radius.
    pub fn inhibition_radius(&self) -> UInt {
        self.inhibition_radius
    }

    /// Returns the duty cycle period.
    pub fn duty_cycle_period(&self) -> UInt {
        self.duty_cycle_period
    }

    /// Returns the boost strength.
    pub fn boost_strength(&self) -> Real {
        self.boost_strength
    }

    /// Number of `compute` calls so far.
    pub fn iteration_num(&self) -> UInt {
        self.iteration_num
    }

    /// Number of `compute` calls with learning so far.
    pub fn iteration_learn_num(&self) -> UInt {
        self.iteration_learn_num
    }

    /// Returns the connected permanence threshold.
    pub fn syn_perm_connected(&self) -> Permanence {
        self.syn_perm_connected
    }

    /// Number of winners per step under global inhibition. Under local
    /// inhibition the count depends on the input and this is the global
    /// equivalent.
    pub fn num_active_target(&self) -> usize {
        if self.num_active_columns_per_inh_area > 0 {
            (self.num_active_columns_per_inh_area as usize).min(self.num_columns)
        } else {
            (self.local_area_density * self.num_columns as Real).round() as usize
        }
    }

    /// Boost factor per column, each `>= 1`.
    pub fn boost_factors(&self) -> &[Real] {
        &self.boost_factors
    }

    /// Overlap duty cycle per column.
    pub fn overlap_duty_cycles(&self) -> &[Real] {
        &self.overlap_duty_cycles
    }

    /// Active duty cycle per column.
    pub fn active_duty_cycles(&self) -> &[Real] {
        &self.active_duty_cycles
    }

    /// Minimum overlap duty cycle per column.
    pub fn min_overlap_duty_cycles(&self) -> &[Real] {
        &self.min_overlap_duty_cycles
    }

    /// Raw overlaps from the last `compute`.
    pub fn overlaps(&self) -> &[SynapseIdx] {
        &self.overlaps
    }

    /// Boosted overlaps from the last `compute`.
    pub fn boosted_overlaps(&self) -> &[Real] {
        &self.boosted_overlaps
    }

    /// The proximal synapse graph.
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// `(input bit, permanence)` for every potential synapse of `column`,
    /// ascending by input bit.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IndexOutOfBounds`] for an unknown column.
    pub fn permanences(&self, column: usize) -> Result<Vec<(CellIdx, Permanence)>> {
        self.check_column(column)?;
        Ok(self
            .connections
            .synapses_for_segment(Self::segment_for_column(column))
            .iter()
            .map(|&s| {
                let data = self.connections.data_for_synapse(s);
                (data.presynaptic_cell, data.permanence)
            })
            .collect())
    }

    /// Input bits in the potential pool of `column`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IndexOutOfBounds`] for an unknown column.
    pub fn potential_pool(&self, column: usize) -> Result<Vec<CellIdx>> {
        self.check_column(column)?;
        Ok(self
            .connections
            .presynaptic_cells_for_segment(Self::segment_for_column(column)))
    }

    /// Connected synapse count per column.
    pub fn connected_counts(&self) -> Vec<SynapseIdx> {
        (0..self.num_columns)
            .map(|c| {
                self.connections
                    .data_for_segment(Self::segment_for_column(c))
                    .num_connected
            })
            .collect()
    }
}
