//! Primitive type definitions shared by the HTM algorithms.
//!
//! Cells, segments and synapses are addressed by plain integer handles into
//! flat arenas, so every graph in this crate is a set of index vectors rather
//! than a web of owning pointers.

/// Default unsigned integer type used for dimensions and counts.
pub type UInt = u32;

/// Default floating point type.
pub type Real = f32;

/// Index of a cell (or of a column, when the spatial pooler uses the
/// connections graph with one cell per column).
/// Must match `ElemSparse` so cell sets can be stored in an [`Sdr`](crate::types::Sdr).
pub type CellIdx = u32;

/// Count of segments on a single cell.
pub type SegmentIdx = u16;

/// Count of synapses on a single segment. Proximal segments span a whole
/// potential pool, so this is wider than [`SegmentIdx`].
pub type SynapseIdx = u32;

/// Handle of a segment in the connections arena.
pub type Segment = u32;

/// Handle of a synapse in the connections arena.
pub type Synapse = u32;

/// Synapse permanence value (0.0 to 1.0).
pub type Permanence = f32;

/// Minimum permanence value.
pub const MIN_PERMANENCE: Permanence = 0.0;

/// Maximum permanence value.
pub const MAX_PERMANENCE: Permanence = 1.0;

/// Permanences below this are treated as zero and their synapses are destroyed.
pub const EPSILON: Permanence = 1e-6;

/// Element type for the dense SDR view (0 or 1).
pub type ElemDense = u8;

/// Element type for the sparse SDR view (flat indices of active bits).
pub type ElemSparse = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_widths() {
        assert_eq!(core::mem::size_of::<CellIdx>(), core::mem::size_of::<ElemSparse>());
        assert_eq!(core::mem::size_of::<Segment>(), 4);
        assert!(core::mem::size_of::<SynapseIdx>() >= core::mem::size_of::<SegmentIdx>());
    }

    #[test]
    fn test_permanence_bounds() {
        assert!(MIN_PERMANENCE < MAX_PERMANENCE);
        assert!(EPSILON > 0.0 && EPSILON < 0.001);
    }
}
