//! Sparse Distributed Representation (SDR) implementation.
//!
//! An SDR is a fixed-size group of boolean values (bits). It is exchanged
//! between every stage of the pipeline in one of two formats:
//! - **Dense**: a contiguous array holding one byte (0 or 1) per bit
//! - **Sparse**: a strictly increasing list of the indices of active bits
//!
//! Setting one format invalidates the other; reading a stale format
//! recomputes it from the fresh one and caches the result.

use crate::error::{CorticalError, Result};
use crate::types::{ElemDense, ElemSparse, Real, UInt};
use crate::utils::Random;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;

/// Type alias for dense SDR data (array of bytes, 0 or 1).
pub type SdrDense = Vec<ElemDense>;

/// Type alias for sparse SDR data (sorted indices of active bits).
pub type SdrSparse = Vec<ElemSparse>;

/// Cached views. `None` marks a view as stale.
#[derive(Default)]
struct SdrCache {
    dense: Option<SdrDense>,
    sparse: Option<SdrSparse>,
}

impl SdrCache {
    fn with_sparse(sparse: SdrSparse) -> Self {
        Self {
            dense: None,
            sparse: Some(sparse),
        }
    }

    fn with_dense(dense: SdrDense) -> Self {
        Self {
            dense: Some(dense),
            sparse: None,
        }
    }
}

/// Sparse Distributed Representation.
///
/// The shape is fixed at construction; only the set of active bits changes.
/// An SDR is a single-owner value: the lazy cache uses interior mutability,
/// so it is `Send` but not `Sync`.
///
/// # Example
///
/// ```rust
/// use cortical::types::Sdr;
///
/// let mut sdr = Sdr::new(&[10, 10]);
/// sdr.set_sparse(&[1, 4, 8, 15, 42]).unwrap();
///
/// assert_eq!(sdr.get_sum(), 5);
/// assert_eq!(sdr.get_dense()[42], 1);
/// ```
pub struct Sdr {
    dimensions: Vec<UInt>,
    size: usize,
    cache: RefCell<SdrCache>,
}

// Only dimensions and the sparse view are persisted.
#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct SdrState {
        dimensions: Vec<UInt>,
        sparse: Vec<ElemSparse>,
    }

    impl Serialize for Sdr {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            SdrState {
                dimensions: self.dimensions.clone(),
                sparse: self.get_sparse(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Sdr {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let state = SdrState::deserialize(deserializer)?;
            if state.dimensions.is_empty() {
                return Err(serde::de::Error::custom("SDR dimensions cannot be empty"));
            }
            let mut sdr = Sdr::new(&state.dimensions);
            sdr.set_sparse_owned(state.sparse)
                .map_err(serde::de::Error::custom)?;
            Ok(sdr)
        }
    }
}

impl Sdr {
    /// Creates a new SDR with the given dimensions, initialized to all zeros.
    ///
    /// `&[0]` is accepted as an empty placeholder.
    ///
    /// # Panics
    ///
    /// Panics if `dimensions` is empty, or if a multi-dimensional shape
    /// contains a zero.
    #[must_use]
    pub fn new(dimensions: &[UInt]) -> Self {
        assert!(!dimensions.is_empty(), "Dimensions cannot be empty");
        if dimensions.len() > 1 {
            if let Some(axis) = dimensions.iter().position(|&d| d == 0) {
                panic!("Dimension {axis} cannot be zero in multi-dimensional SDR");
            }
        }

        let size = dimensions.iter().map(|&d| d as usize).product();

        Self {
            dimensions: dimensions.to_vec(),
            size,
            cache: RefCell::new(SdrCache::with_sparse(Vec::new())),
        }
    }

    /// Returns the dimensions of this SDR.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    /// Returns the total number of bits in the SDR.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Deactivates every bit.
    pub fn zero(&mut self) {
        *self.cache.get_mut() = SdrCache::with_sparse(Vec::new());
    }

    // ------------------------------------------------------------------------
    // Dense view
    // ------------------------------------------------------------------------

    /// Sets the SDR from a dense array; any non-zero byte is an active bit.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::DimensionMismatch`] if the length differs
    /// from [`size`](Self::size). The SDR is left unchanged.
    pub fn set_dense(&mut self, data: &[ElemDense]) -> Result<()> {
        self.set_dense_owned(data.to_vec())
    }

    /// Sets the SDR from a dense array, taking ownership of the buffer.
    ///
    /// # Errors
    ///
    /// Same as [`set_dense`](Self::set_dense).
    pub fn set_dense_owned(&mut self, mut data: SdrDense) -> Result<()> {
        if data.len() != self.size {
            return Err(CorticalError::DimensionMismatch {
                expected: vec![self.size as UInt],
                actual: vec![data.len() as UInt],
            });
        }
        for bit in &mut data {
            *bit = ElemDense::from(*bit != 0);
        }
        *self.cache.get_mut() = SdrCache::with_dense(data);
        Ok(())
    }

    /// Returns a copy of the dense view, recomputing it if stale.
    #[must_use]
    pub fn get_dense(&self) -> SdrDense {
        self.with_dense(<[ElemDense]>::to_vec)
    }

    /// Runs `f` on the dense view without copying it out.
    pub fn with_dense<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[ElemDense]) -> R,
    {
        self.ensure_dense();
        let cache = self.cache.borrow();
        f(cache.dense.as_deref().unwrap_or(&[]))
    }

    fn ensure_dense(&self) {
        if self.cache.borrow().dense.is_some() {
            return;
        }
        let mut cache = self.cache.borrow_mut();
        let mut dense = vec![0; self.size];
        for &idx in cache.sparse.as_deref().unwrap_or(&[]) {
            dense[idx as usize] = 1;
        }
        cache.dense = Some(dense);
    }

    // ------------------------------------------------------------------------
    // Sparse view
    // ------------------------------------------------------------------------

    /// Sets the active bits from a list of flat indices.
    ///
    /// Indices may arrive in any order; they are stored sorted.
    ///
    /// # Errors
    ///
    /// - [`CorticalError::IndexOutOfBounds`] if an index is `>= size()`
    /// - [`CorticalError::InvalidSdrData`] if an index appears twice
    ///
    /// The SDR is left unchanged on error.
    pub fn set_sparse(&mut self, indices: &[ElemSparse]) -> Result<()> {
        self.set_sparse_owned(indices.to_vec())
    }

    /// Sets the active bits, taking ownership of the index buffer.
    ///
    /// # Errors
    ///
    /// Same as [`set_sparse`](Self::set_sparse).
    pub fn set_sparse_owned(&mut self, mut indices: SdrSparse) -> Result<()> {
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            indices.sort_unstable();
            if indices.windows(2).any(|w| w[0] == w[1]) {
                return Err(CorticalError::InvalidSdrData(
                    "Sparse indices must be unique".to_string(),
                ));
            }
        }
        if let Some(&last) = indices.last() {
            if last as usize >= self.size {
                return Err(CorticalError::IndexOutOfBounds {
                    index: last as usize,
                    size: self.size,
                });
            }
        }

        *self.cache.get_mut() = SdrCache::with_sparse(indices);
        Ok(())
    }

    /// Sets sorted, unique, in-range indices without validation.
    pub(crate) fn set_sparse_unchecked(&mut self, indices: SdrSparse) {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.last().map_or(true, |&i| (i as usize) < self.size));
        *self.cache.get_mut() = SdrCache::with_sparse(indices);
    }

    /// Returns a copy of the active indices, recomputing them if stale.
    #[must_use]
    pub fn get_sparse(&self) -> SdrSparse {
        self.with_sparse(<[ElemSparse]>::to_vec)
    }

    /// Runs `f` on the sorted active indices without copying them out.
    pub fn with_sparse<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[ElemSparse]) -> R,
    {
        self.ensure_sparse();
        let cache = self.cache.borrow();
        f(cache.sparse.as_deref().unwrap_or(&[]))
    }

    fn ensure_sparse(&self) {
        if self.cache.borrow().sparse.is_some() {
            return;
        }
        let mut cache = self.cache.borrow_mut();
        let sparse: SdrSparse = cache
            .dense
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit != 0)
            .map(|(i, _)| i as ElemSparse)
            .collect();
        cache.sparse = Some(sparse);
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Returns the number of active bits.
    #[must_use]
    pub fn get_sum(&self) -> usize {
        self.with_sparse(<[ElemSparse]>::len)
    }

    /// Returns the fraction of active bits.
    #[must_use]
    pub fn get_sparsity(&self) -> Real {
        if self.size == 0 {
            return 0.0;
        }
        self.get_sum() as Real / self.size as Real
    }

    /// Returns the number of bits active in both SDRs.
    #[must_use]
    pub fn get_overlap(&self, other: &Sdr) -> usize {
        self.with_sparse(|a| other.with_sparse(|b| sorted_intersection_count(a, b)))
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Copies the active bits of another SDR with the same dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::DimensionMismatch`] if the shapes differ.
    pub fn set_sdr(&mut self, other: &Sdr) -> Result<()> {
        if self.dimensions != other.dimensions {
            return Err(CorticalError::DimensionMismatch {
                expected: self.dimensions.clone(),
                actual: other.dimensions.clone(),
            });
        }
        self.set_sparse_unchecked(other.get_sparse());
        Ok(())
    }

    /// Activates `round(size * sparsity)` bits chosen by `rng`.
    pub fn randomize(&mut self, sparsity: Real, rng: &mut Random) {
        let num_active = ((self.size as Real) * sparsity.clamp(0.0, 1.0)).round() as usize;
        let mut sparse: SdrSparse = rng
            .sample_indices(self.size, num_active)
            .into_iter()
            .map(|i| i as ElemSparse)
            .collect();
        sparse.sort_unstable();
        self.set_sparse_unchecked(sparse);
    }

    /// Moves `round(active * fraction_noise)` active bits to random inactive
    /// positions, keeping the number of active bits constant.
    pub fn add_noise(&mut self, fraction_noise: Real, rng: &mut Random) {
        let sparse = self.get_sparse();
        let num_moved = ((sparse.len() as Real) * fraction_noise.clamp(0.0, 1.0)).round() as usize;
        if num_moved == 0 {
            return;
        }

        let mut dense = self.get_dense();
        let inactive: Vec<ElemSparse> = (0..self.size as ElemSparse)
            .filter(|&i| dense[i as usize] == 0)
            .collect();
        let num_moved = num_moved.min(inactive.len());

        for idx in rng.sample(sparse, num_moved) {
            dense[idx as usize] = 0;
        }
        for idx in rng.sample(inactive, num_moved) {
            dense[idx as usize] = 1;
        }
        *self.cache.get_mut() = SdrCache::with_dense(dense);
    }

    /// Concatenates `inputs` end to end into this SDR.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] for an empty input list and
    /// [`CorticalError::DimensionMismatch`] if the input sizes do not add up
    /// to this SDR's size.
    pub fn concatenate(&mut self, inputs: &[&Sdr]) -> Result<()> {
        if inputs.is_empty() {
            return Err(CorticalError::InvalidParameter {
                name: "inputs",
                message: "Cannot concatenate empty list".to_string(),
            });
        }

        let total: usize = inputs.iter().map(|sdr| sdr.size()).sum();
        if total != self.size {
            return Err(CorticalError::DimensionMismatch {
                expected: vec![self.size as UInt],
                actual: vec![total as UInt],
            });
        }

        let mut result = Vec::new();
        let mut offset = 0;
        for input in inputs {
            input.with_sparse(|sparse| {
                result.extend(sparse.iter().map(|&i| i + offset as ElemSparse));
            });
            offset += input.size();
        }

        self.set_sparse_unchecked(result);
        Ok(())
    }
}

/// Counts common elements of two strictly increasing slices.
fn sorted_intersection_count(a: &[ElemSparse], b: &[ElemSparse]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

impl Clone for Sdr {
    fn clone(&self) -> Self {
        let cache = self.cache.borrow();
        let copy = match (&cache.sparse, &cache.dense) {
            (Some(sparse), _) => SdrCache::with_sparse(sparse.clone()),
            (None, Some(dense)) => SdrCache::with_dense(dense.clone()),
            (None, None) => SdrCache::with_sparse(Vec::new()),
        };

        Self {
            dimensions: self.dimensions.clone(),
            size: self.size,
            cache: RefCell::new(copy),
        }
    }
}

impl PartialEq for Sdr {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions
            && self.with_sparse(|a| other.with_sparse(|b| a == b))
    }
}

impl Eq for Sdr {}

impl fmt::Debug for Sdr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_sparse(|sparse| write!(f, "SDR({:?}) {:?}", self.dimensions, sparse))
    }
}

impl fmt::Display for Sdr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dimensions.iter().map(ToString::to_string).collect();
        let bits: Vec<String> =
            self.with_sparse(|sparse| sparse.iter().map(ToString::to_string).collect());
        write!(f, "SDR( {} ) {}", dims.join(", "), bits.join(", "))
    }
}

impl Default for Sdr {
    fn default() -> Self {
        Self::new(&[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor() {
        let sdr = Sdr::new(&[3]);
        assert_eq!(sdr.size(), 3);
        assert_eq!(sdr.dimensions(), &[3]);

        let sdr2 = Sdr::new(&[3, 4, 5]);
        assert_eq!(sdr2.size(), 60);
        assert_eq!(sdr2.get_sum(), 0);
    }

    #[test]
    fn test_empty_placeholder() {
        let sdr = Sdr::new(&[0]);
        assert_eq!(sdr.size(), 0);
        assert_eq!(sdr.get_sparsity(), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_axis_panics() {
        let _ = Sdr::new(&[4, 0]);
    }

    #[test]
    fn test_zero() {
        let mut sdr = Sdr::new(&[4, 4]);
        sdr.set_dense(&[1; 16]).unwrap();
        sdr.zero();
        assert_eq!(sdr.get_sum(), 0);
        assert_eq!(sdr.get_dense(), vec![0; 16]);
    }

    #[test]
    fn test_dense_sparse_conversion() {
        let mut sdr = Sdr::new(&[9]);
        sdr.set_dense(&[0, 1, 0, 0, 1, 0, 0, 0, 1]).unwrap();
        assert_eq!(sdr.get_sparse(), vec![1, 4, 8]);

        sdr.set_sparse(&[2, 3]).unwrap();
        assert_eq!(sdr.get_dense(), vec![0, 0, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_dense_normalizes_nonzero_bytes() {
        let mut sdr = Sdr::new(&[4]);
        sdr.set_dense(&[0, 7, 0, 255]).unwrap();
        assert_eq!(sdr.get_dense(), vec![0, 1, 0, 1]);
        assert_eq!(sdr.get_sparse(), vec![1, 3]);
    }

    #[test]
    fn test_dense_wrong_length() {
        let mut sdr = Sdr::new(&[10]);
        sdr.set_sparse(&[1, 2]).unwrap();

        let err = sdr.set_dense(&[0; 9]).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(sdr.get_sparse(), vec![1, 2]);
    }

    #[test]
    fn test_sparse_out_of_range() {
        let mut sdr = Sdr::new(&[10]);
        sdr.set_sparse(&[3]).unwrap();

        let err = sdr.set_sparse(&[1, 10]).unwrap_err();
        assert!(matches!(err, CorticalError::IndexOutOfBounds { index: 10, size: 10 }));
        assert!(err.is_dimension_mismatch());
        assert_eq!(sdr.get_sparse(), vec![3]);
    }

    #[test]
    fn test_sparse_unsorted_is_sorted() {
        let mut sdr = Sdr::new(&[10]);
        sdr.set_sparse(&[7, 2, 5]).unwrap();
        assert_eq!(sdr.get_sparse(), vec![2, 5, 7]);
    }

    #[test]
    fn test_sparse_duplicates_rejected() {
        let mut sdr = Sdr::new(&[10]);
        assert!(matches!(
            sdr.set_sparse(&[4, 2, 4]),
            Err(CorticalError::InvalidSdrData(_))
        ));
        assert_eq!(sdr.get_sum(), 0);
    }

    #[test]
    fn test_sum_sparsity() {
        let mut sdr = Sdr::new(&[100]);
        sdr.set_sparse(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(sdr.get_sum(), 5);
        assert!((sdr.get_sparsity() - 0.05).abs() < 0.001);
    }

    #[test]
    fn test_overlap() {
        let mut a = Sdr::new(&[9]);
        let mut b = Sdr::new(&[9]);
        a.set_sparse(&[1, 2, 3, 4]).unwrap();
        b.set_sparse(&[2, 3, 4, 5]).unwrap();
        assert_eq!(a.get_overlap(&b), 3);
        assert_eq!(a.get_overlap(&a), 4);
    }

    #[test]
    fn test_set_sdr() {
        let mut a = Sdr::new(&[10]);
        let mut b = Sdr::new(&[10]);
        a.set_sparse(&[0, 9]).unwrap();
        b.set_sdr(&a).unwrap();
        assert_eq!(a, b);

        let mut c = Sdr::new(&[2, 5]);
        assert!(c.set_sdr(&a).unwrap_err().is_dimension_mismatch());
    }

    #[test]
    fn test_randomize() {
        let mut rng = Random::new(7);
        let mut sdr = Sdr::new(&[200]);
        sdr.randomize(0.05, &mut rng);
        assert_eq!(sdr.get_sum(), 10);

        let sparse = sdr.get_sparse();
        assert!(sparse.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_add_noise_keeps_sum() {
        let mut rng = Random::new(3);
        let mut sdr = Sdr::new(&[100]);
        sdr.set_sparse(&[0, 10, 20, 30, 40, 50, 60, 70, 80, 90]).unwrap();
        let original = sdr.clone();

        sdr.add_noise(0.5, &mut rng);

        assert_eq!(sdr.get_sum(), 10);
        assert_eq!(sdr.get_overlap(&original), 5);
    }

    #[test]
    fn test_concatenate() {
        let mut a = Sdr::new(&[10]);
        let mut b = Sdr::new(&[5]);
        let mut c = Sdr::new(&[15]);

        a.set_sparse(&[0, 1, 2]).unwrap();
        b.set_sparse(&[0, 4]).unwrap();
        c.concatenate(&[&a, &b]).unwrap();

        assert_eq!(c.get_sparse(), vec![0, 1, 2, 10, 14]);

        let mut wrong = Sdr::new(&[20]);
        assert!(wrong.concatenate(&[&a, &b]).is_err());
    }

    #[test]
    fn test_equality() {
        let mut a = Sdr::new(&[10]);
        let mut b = Sdr::new(&[10]);

        a.set_sparse(&[1, 2, 3]).unwrap();
        b.set_dense(&[0, 1, 1, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(a, b);

        b.set_sparse(&[1, 2, 4]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let mut sdr = Sdr::new(&[3, 3]);
        sdr.set_sparse(&[1, 4, 8]).unwrap();
        assert_eq!(format!("{sdr}"), "SDR( 3, 3 ) 1, 4, 8");
    }

    #[test]
    fn test_clone_is_deep() {
        let mut sdr = Sdr::new(&[10]);
        sdr.set_sparse(&[1, 2, 3]).unwrap();

        let cloned = sdr.clone();
        sdr.set_sparse(&[4, 5, 6]).unwrap();

        assert_ne!(sdr, cloned);
        assert_eq!(cloned.get_sparse(), vec![1, 2, 3]);
    }
}
