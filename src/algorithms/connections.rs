//! Connections - the synaptic graph shared by the spatial pooler and the
//! temporal memory.
//!
//! Cells own segments, segments own synapses, and every relation is an
//! integer handle into a flat arena. Destroyed segments and synapses are
//! tombstoned on free lists and their slots are reused by later creations.
//! Two lookup maps from presynaptic cell to synapses (all, and connected
//! only) make activity computation proportional to the number of active
//! inputs rather than to the size of the graph.

use crate::types::{
    CellIdx, Permanence, Segment, SegmentIdx, Synapse, SynapseIdx, EPSILON, MAX_PERMANENCE,
    MIN_PERMANENCE,
};
use crate::utils::Random;

use ahash::AHashMap;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Data associated with a synapse.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseData {
    /// The presynaptic cell (or input bit) this synapse listens to.
    pub presynaptic_cell: CellIdx,

    /// Permanence in `[0, 1]`.
    pub permanence: Permanence,

    /// The segment this synapse belongs to.
    pub segment: Segment,
}

/// Data associated with a segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentData {
    /// Synapses on this segment, in creation order.
    pub synapses: SmallVec<[Synapse; 32]>,

    /// The cell this segment belongs to.
    pub cell: CellIdx,

    /// Number of synapses with permanence at or above the connected threshold.
    pub num_connected: SynapseIdx,

    /// Iteration at which the segment was created or last active while
    /// learning. Drives least-recently-used eviction.
    pub last_used: u64,
}

impl SegmentData {
    fn new(cell: CellIdx, last_used: u64) -> Self {
        Self {
            synapses: SmallVec::new(),
            cell,
            num_connected: 0,
            last_used,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct CellData {
    segments: SmallVec<[Segment; 8]>,
}

/// The synaptic graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connections {
    cells: Vec<CellData>,

    segments: Vec<SegmentData>,
    destroyed_segments: Vec<Segment>,

    synapses: Vec<SynapseData>,
    destroyed_synapses: Vec<Synapse>,

    connected_threshold: Permanence,

    /// Incremented by every `compute_activity` call.
    iteration: u64,

    potential_synapses_for_presynaptic_cell: AHashMap<CellIdx, Vec<Synapse>>,
    connected_synapses_for_presynaptic_cell: AHashMap<CellIdx, Vec<Synapse>>,
}

impl Connections {
    /// Creates an empty graph over `num_cells` cells.
    pub fn new(num_cells: CellIdx, connected_threshold: Permanence) -> Self {
        Self {
            cells: vec![CellData::default(); num_cells as usize],
            segments: Vec::new(),
            destroyed_segments: Vec::new(),
            synapses: Vec::new(),
            destroyed_synapses: Vec::new(),
            connected_threshold,
            iteration: 0,
            potential_synapses_for_presynaptic_cell: AHashMap::new(),
            connected_synapses_for_presynaptic_cell: AHashMap::new(),
        }
    }

    /// Returns the number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the connected threshold.
    #[inline]
    pub fn connected_threshold(&self) -> Permanence {
        self.connected_threshold
    }

    /// Returns the number of `compute_activity` calls so far.
    #[inline]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of live segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len() - self.destroyed_segments.len()
    }

    /// Number of segments on `cell`.
    pub fn num_segments_on_cell(&self, cell: CellIdx) -> usize {
        self.cells[cell as usize].segments.len()
    }

    /// Number of live synapses.
    pub fn num_synapses(&self) -> usize {
        self.synapses.len() - self.destroyed_synapses.len()
    }

    /// Number of synapses on `segment`.
    pub fn num_synapses_on_segment(&self, segment: Segment) -> usize {
        self.segments[segment as usize].synapses.len()
    }

    /// Length of the segment arena, tombstones included. Activity vectors
    /// returned by [`compute_activity`](Self::compute_activity) have this length.
    pub fn segment_flat_list_length(&self) -> usize {
        self.segments.len()
    }

    // ========================================================================
    // Segments
    // ========================================================================

    /// Creates a segment on `cell`.
    ///
    /// If the cell already holds `max_segments_per_cell` segments, the least
    /// recently used ones are destroyed first.
    pub fn create_segment(&mut self, cell: CellIdx, max_segments_per_cell: SegmentIdx) -> Segment {
        while self.cells[cell as usize].segments.len() >= usize::from(max_segments_per_cell.max(1))
        {
            let Some(&lru) = self.cells[cell as usize]
                .segments
                .iter()
                .min_by_key(|&&s| (self.segments[s as usize].last_used, s))
            else {
                break;
            };
            log::debug!(
                "cell {cell} is full ({max_segments_per_cell} segments), evicting segment {lru}"
            );
            self.destroy_segment(lru);
        }

        let data = SegmentData::new(cell, self.iteration);
        let segment = if let Some(reuse) = self.destroyed_segments.pop() {
            self.segments[reuse as usize] = data;
            reuse
        } else {
            self.segments.push(data);
            (self.segments.len() - 1) as Segment
        };

        self.cells[cell as usize].segments.push(segment);
        segment
    }

    /// Destroys a segment and all of its synapses.
    pub fn destroy_segment(&mut self, segment: Segment) {
        let synapses = std::mem::take(&mut self.segments[segment as usize].synapses);
        for synapse in synapses {
            self.release_synapse(synapse);
        }
        self.segments[segment as usize].num_connected = 0;

        let cell = self.segments[segment as usize].cell;
        let owned = &mut self.cells[cell as usize].segments;
        if let Some(pos) = owned.iter().position(|&s| s == segment) {
            // Keep creation order for the remaining segments.
            owned.remove(pos);
        }

        self.destroyed_segments.push(segment);
    }

    /// Segments owned by `cell`, in creation order.
    #[inline]
    pub fn segments_for_cell(&self, cell: CellIdx) -> &[Segment] {
        &self.cells[cell as usize].segments
    }

    /// The cell that owns `segment`.
    #[inline]
    pub fn cell_for_segment(&self, segment: Segment) -> CellIdx {
        self.segments[segment as usize].cell
    }

    /// Segment data.
    #[inline]
    pub fn data_for_segment(&self, segment: Segment) -> &SegmentData {
        &self.segments[segment as usize]
    }

    /// Marks `segment` as used in the current iteration.
    #[inline]
    pub fn touch_segment(&mut self, segment: Segment) {
        self.segments[segment as usize].last_used = self.iteration;
    }

    // ========================================================================
    // Synapses
    // ========================================================================

    /// Creates a synapse from `presynaptic_cell` onto `segment`.
    ///
    /// A segment holds at most one synapse per presynaptic cell. If one
    /// already exists it is returned, keeping the larger permanence.
    pub fn create_synapse(
        &mut self,
        segment: Segment,
        presynaptic_cell: CellIdx,
        permanence: Permanence,
    ) -> Synapse {
        let permanence = permanence.clamp(MIN_PERMANENCE, MAX_PERMANENCE);

        let existing = self.segments[segment as usize]
            .synapses
            .iter()
            .copied()
            .find(|&s| self.synapses[s as usize].presynaptic_cell == presynaptic_cell);
        if let Some(synapse) = existing {
            if permanence > self.synapses[synapse as usize].permanence {
                self.update_synapse_permanence(synapse, permanence);
            }
            return synapse;
        }

        let data = SynapseData {
            presynaptic_cell,
            permanence,
            segment,
        };
        let synapse = if let Some(reuse) = self.destroyed_synapses.pop() {
            self.synapses[reuse as usize] = data;
            reuse
        } else {
            self.synapses.push(data);
            (self.synapses.len() - 1) as Synapse
        };

        self.segments[segment as usize].synapses.push(synapse);
        self.potential_synapses_for_presynaptic_cell
            .entry(presynaptic_cell)
            .or_default()
            .push(synapse);
        if permanence >= self.connected_threshold {
            self.segments[segment as usize].num_connected += 1;
            self.connected_synapses_for_presynaptic_cell
                .entry(presynaptic_cell)
                .or_default()
                .push(synapse);
        }

        synapse
    }

    /// Destroys a synapse.
    pub fn destroy_synapse(&mut self, synapse: Synapse) {
        let segment = self.synapses[synapse as usize].segment;
        let owned = &mut self.segments[segment as usize].synapses;
        if let Some(pos) = owned.iter().position(|&s| s == synapse) {
            owned.remove(pos);
        }
        if self.synapses[synapse as usize].permanence >= self.connected_threshold {
            let data = &mut self.segments[segment as usize];
            data.num_connected = data.num_connected.saturating_sub(1);
        }
        self.release_synapse(synapse);
    }

    /// Drops `synapse` from the lookup maps and frees its slot. The caller
    /// has already detached it from its segment.
    fn release_synapse(&mut self, synapse: Synapse) {
        let data = &self.synapses[synapse as usize];
        let presynaptic_cell = data.presynaptic_cell;
        let was_connected = data.permanence >= self.connected_threshold;

        remove_from_map(
            &mut self.potential_synapses_for_presynaptic_cell,
            presynaptic_cell,
            synapse,
        );
        if was_connected {
            remove_from_map(
                &mut self.connected_synapses_for_presynaptic_cell,
                presynaptic_cell,
                synapse,
            );
        }

        self.synapses[synapse as usize].permanence = MIN_PERMANENCE;
        self.destroyed_synapses.push(synapse);
    }

    /// Sets a synapse's permanence, clamped to `[0, 1]`.
    pub fn update_synapse_permanence(&mut self, synapse: Synapse, permanence: Permanence) {
        let permanence = permanence.clamp(MIN_PERMANENCE, MAX_PERMANENCE);
        let data = &mut self.synapses[synapse as usize];
        let was_connected = data.permanence >= self.connected_threshold;
        let is_connected = permanence >= self.connected_threshold;
        let (presynaptic_cell, segment) = (data.presynaptic_cell, data.segment);
        data.permanence = permanence;

        if was_connected == is_connected {
            return;
        }
        let segment_data = &mut self.segments[segment as usize];
        if is_connected {
            segment_data.num_connected += 1;
            self.connected_synapses_for_presynaptic_cell
                .entry(presynaptic_cell)
                .or_default()
                .push(synapse);
        } else {
            segment_data.num_connected = segment_data.num_connected.saturating_sub(1);
            remove_from_map(
                &mut self.connected_synapses_for_presynaptic_cell,
                presynaptic_cell,
                synapse,
            );
        }
    }

    /// Synapses on `segment`, in creation order.
    #[inline]
    pub fn synapses_for_segment(&self, segment: Segment) -> &[Synapse] {
        &self.segments[segment as usize].synapses
    }

    /// Synapse data.
    #[inline]
    pub fn data_for_synapse(&self, synapse: Synapse) -> &SynapseData {
        &self.synapses[synapse as usize]
    }

    /// Presynaptic cells of every synapse on `segment`.
    pub fn presynaptic_cells_for_segment(&self, segment: Segment) -> Vec<CellIdx> {
        self.segments[segment as usize]
            .synapses
            .iter()
            .map(|&s| self.synapses[s as usize].presynaptic_cell)
            .collect()
    }

    // ========================================================================
    // Activity
    // ========================================================================

    /// Counts, for every segment, the active connected synapses and the
    /// active potential synapses (any permanence).
    ///
    /// `active_presynaptic_cells` must not contain duplicates. Both returned
    /// vectors are indexed by segment handle.
    pub fn compute_activity(
        &mut self,
        active_presynaptic_cells: &[CellIdx],
    ) -> (Vec<SynapseIdx>, Vec<SynapseIdx>) {
        self.iteration += 1;

        let mut num_active_connected = vec![0; self.segment_flat_list_length()];
        let mut num_active_potential = vec![0; self.segment_flat_list_length()];

        for cell in active_presynaptic_cells {
            if let Some(synapses) = self.connected_synapses_for_presynaptic_cell.get(cell) {
                for &synapse in synapses {
                    num_active_connected[self.synapses[synapse as usize].segment as usize] += 1;
                }
            }
            if let Some(synapses) = self.potential_synapses_for_presynaptic_cell.get(cell) {
                for &synapse in synapses {
                    num_active_potential[self.synapses[synapse as usize].segment as usize] += 1;
                }
            }
        }

        (num_active_connected, num_active_potential)
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// Reinforces synapses from `active_inputs` by `increment` and weakens
    /// all others by `decrement`.
    ///
    /// `active_inputs` must be sorted ascending. With `prune_zero_synapses`,
    /// synapses that reach zero are destroyed, and so is the segment if it
    /// ends up empty. Returns true if the segment was destroyed.
    pub fn adapt_segment(
        &mut self,
        segment: Segment,
        active_inputs: &[CellIdx],
        increment: Permanence,
        decrement: Permanence,
        prune_zero_synapses: bool,
    ) -> bool {
        let synapses: SmallVec<[Synapse; 32]> = self.segments[segment as usize].synapses.clone();
        let mut dead = Vec::new();

        for synapse in synapses {
            let data = &self.synapses[synapse as usize];
            let delta = if active_inputs.binary_search(&data.presynaptic_cell).is_ok() {
                increment
            } else {
                -decrement
            };
            let updated = (data.permanence + delta).clamp(MIN_PERMANENCE, MAX_PERMANENCE);

            if prune_zero_synapses && updated < EPSILON {
                dead.push(synapse);
            } else if updated != data.permanence {
                self.update_synapse_permanence(synapse, updated);
            }
        }

        for synapse in dead {
            self.destroy_synapse(synapse);
        }

        if prune_zero_synapses && self.segments[segment as usize].synapses.is_empty() {
            self.destroy_segment(segment);
            return true;
        }
        false
    }

    /// Grows up to `max_new` synapses from `candidates` onto `segment`.
    ///
    /// Candidates already present on the segment are skipped; the rest are
    /// picked at random. If the segment would exceed
    /// `max_synapses_per_segment`, its weakest synapses to cells outside
    /// `candidates` are destroyed first. Returns the number of synapses grown.
    pub fn grow_synapses(
        &mut self,
        segment: Segment,
        candidates: &[CellIdx],
        initial_permanence: Permanence,
        rng: &mut Random,
        max_new: usize,
        max_synapses_per_segment: usize,
    ) -> usize {
        let present = self.presynaptic_cells_for_segment(segment);
        let mut fresh: Vec<CellIdx> = candidates
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect();

        let num_new = max_new.min(fresh.len());
        if num_new == 0 {
            return 0;
        }

        let overrun = (self.num_synapses_on_segment(segment) + num_new)
            .saturating_sub(max_synapses_per_segment);
        if overrun > 0 {
            log::debug!("segment {segment} is full, destroying {overrun} weakest synapses");
            self.destroy_min_permanence_synapses(segment, overrun, candidates);
        }
        let room = max_synapses_per_segment.saturating_sub(self.num_synapses_on_segment(segment));
        let num_new = num_new.min(room);

        rng.shuffle(&mut fresh);
        for &cell in &fresh[..num_new] {
            self.create_synapse(segment, cell, initial_permanence);
        }
        num_new
    }

    /// Destroys the `n_destroy` lowest-permanence synapses on `segment`,
    /// skipping synapses whose presynaptic cell is in `exclude_cells`.
    /// Ties go to the older synapse.
    pub fn destroy_min_permanence_synapses(
        &mut self,
        segment: Segment,
        n_destroy: usize,
        exclude_cells: &[CellIdx],
    ) {
        if n_destroy == 0 {
            return;
        }

        let mut candidates: Vec<(usize, Synapse, Permanence)> = self.segments[segment as usize]
            .synapses
            .iter()
            .enumerate()
            .map(|(pos, &s)| (pos, s, &self.synapses[s as usize]))
            .filter(|(_, _, d)| !exclude_cells.contains(&d.presynaptic_cell))
            .map(|(pos, s, d)| (pos, s, d.permanence))
            .collect();
        candidates.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));

        for (_, synapse, _) in candidates.into_iter().take(n_destroy) {
            self.destroy_synapse(synapse);
        }
    }

    /// Raises every permanence on `segment` by the same amount, just enough
    /// that at least `threshold` synapses are connected.
    pub fn raise_permanences_to_threshold(&mut self, segment: Segment, threshold: usize) {
        let target = threshold.min(self.num_synapses_on_segment(segment));
        while (self.segments[segment as usize].num_connected as usize) < target {
            let mut permanences: Vec<Permanence> = self
                .synapses_for_segment(segment)
                .iter()
                .map(|&s| self.synapses[s as usize].permanence)
                .collect();
            permanences.sort_by(|a, b| b.total_cmp(a));

            // At least one ulp for any permanence below 1, so each pass moves.
            let delta =
                (self.connected_threshold - permanences[target - 1]).max(Permanence::EPSILON);
            self.bump_segment(segment, delta);
        }
    }

    /// Adds `delta` to every permanence on `segment`.
    pub fn bump_segment(&mut self, segment: Segment, delta: Permanence) {
        let synapses: SmallVec<[Synapse; 32]> = self.segments[segment as usize].synapses.clone();
        for synapse in synapses {
            let updated = self.synapses[synapse as usize].permanence + delta;
            self.update_synapse_permanence(synapse, updated);
        }
    }
}

fn remove_from_map(map: &mut AHashMap<CellIdx, Vec<Synapse>>, cell: CellIdx, synapse: Synapse) {
    if let Some(list) = map.get_mut(&cell) {
        if let Some(pos) = list.iter().position(|&s| s == synapse) {
            list.swap_remove(pos);
        }
        if list.is_empty() {
            map.remove(&cell);
        }
    }
}
