//! Topology of column and input spaces.
//!
//! Columns and inputs live in N-dimensional boxes addressed by flat,
//! row-major indices. The spatial pooler uses these helpers to center each
//! column over the input, to build potential pools, and to find inhibition
//! neighbors.

use crate::types::UInt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the edges of a topological space are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WrappingMode {
    /// Edges are hard limits.
    #[default]
    NoWrap,
    /// The space is toroidal.
    Wrap,
}

impl From<bool> for WrappingMode {
    fn from(wrap: bool) -> Self {
        if wrap {
            Self::Wrap
        } else {
            Self::NoWrap
        }
    }
}

/// Stateless helpers for computing topological relationships.
pub struct Topology;

impl Topology {
    /// Converts a flat index to coordinates.
    ///
    /// ```rust
    /// use cortical::utils::Topology;
    ///
    /// assert_eq!(Topology::index_to_coordinates(5, &[3, 3]), vec![1, 2]);
    /// ```
    #[must_use]
    pub fn index_to_coordinates(index: usize, dimensions: &[UInt]) -> Vec<UInt> {
        let mut coords = vec![0; dimensions.len()];
        let mut rest = index;
        for (coord, &dim) in coords.iter_mut().zip(dimensions).rev() {
            *coord = (rest % dim as usize) as UInt;
            rest /= dim as usize;
        }
        coords
    }

    /// Converts coordinates to a flat index.
    #[must_use]
    pub fn coordinates_to_index(coordinates: &[UInt], dimensions: &[UInt]) -> usize {
        coordinates
            .iter()
            .zip(dimensions)
            .fold(0, |acc, (&c, &d)| acc * d as usize + c as usize)
    }

    /// Total number of elements in a space.
    #[must_use]
    pub fn num_elements(dimensions: &[UInt]) -> usize {
        dimensions.iter().map(|&d| d as usize).product()
    }

    /// Returns every index within `radius` of `center_index` along each axis,
    /// in ascending order.
    ///
    /// When wrapping, an axis whose window `2 * radius + 1` covers the whole
    /// axis contributes each coordinate exactly once, so no index is ever
    /// returned twice.
    #[must_use]
    pub fn neighborhood(
        center_index: usize,
        dimensions: &[UInt],
        radius: UInt,
        wrap: WrappingMode,
        include_center: bool,
    ) -> Vec<usize> {
        let center = Self::index_to_coordinates(center_index, dimensions);

        // Candidate coordinates per axis.
        let axes: Vec<Vec<UInt>> = center
            .iter()
            .zip(dimensions)
            .map(|(&c, &dim)| Self::axis_window(c, dim, radius, wrap))
            .collect();

        let mut result = vec![0usize];
        for (axis, &dim) in axes.iter().zip(dimensions) {
            let mut next = Vec::with_capacity(result.len() * axis.len());
            for &prefix in &result {
                for &coord in axis {
                    next.push(prefix * dim as usize + coord as usize);
                }
            }
            result = next;
        }

        result.sort_unstable();
        if !include_center {
            result.retain(|&idx| idx != center_index);
        }
        result
    }

    fn axis_window(center: UInt, dim: UInt, radius: UInt, wrap: WrappingMode) -> Vec<UInt> {
        let (c, d, r) = (i64::from(center), i64::from(dim), i64::from(radius));
        match wrap {
            WrappingMode::Wrap if 2 * r + 1 >= d => (0..dim).collect(),
            WrappingMode::Wrap => (c - r..=c + r).map(|x| x.rem_euclid(d) as UInt).collect(),
            WrappingMode::NoWrap => ((c - r).max(0)..=(c + r).min(d - 1))
                .map(|x| x as UInt)
                .collect(),
        }
    }

    /// Maps a column to the input index at the center of its receptive field.
    ///
    /// Each column axis is spread uniformly over the matching input axis.
    /// Column spaces with fewer axes than the input map their missing axes
    /// to the middle of the input axis.
    #[must_use]
    pub fn map_column_to_input(
        column_index: usize,
        column_dimensions: &[UInt],
        input_dimensions: &[UInt],
    ) -> usize {
        let column_coords = Self::index_to_coordinates(column_index, column_dimensions);

        let input_coords: Vec<UInt> = input_dimensions
            .iter()
            .enumerate()
            .map(|(axis, &input_dim)| {
                let col_coord = column_coords.get(axis).map_or(0.0, |&c| f64::from(c));
                let col_dim = column_dimensions.get(axis).map_or(1.0, |&d| f64::from(d));
                let mapped = ((col_coord + 0.5) * f64::from(input_dim) / col_dim) as UInt;
                mapped.min(input_dim - 1)
            })
            .collect();

        Self::coordinates_to_index(&input_coords, input_dimensions)
    }

    /// Input indices a column may connect to: the neighborhood of
    /// `potential_radius` around its mapped center, ascending and unique.
    #[must_use]
    pub fn map_potential_pool(
        column_index: usize,
        column_dimensions: &[UInt],
        input_dimensions: &[UInt],
        potential_radius: UInt,
        wrap: WrappingMode,
    ) -> Vec<usize> {
        let center = Self::map_column_to_input(column_index, column_dimensions, input_dimensions);
        Self::neighborhood(center, input_dimensions, potential_radius, wrap, true)
    }

    /// Average number of columns per input along each axis.
    #[must_use]
    pub fn avg_columns_per_input(column_dimensions: &[UInt], input_dimensions: &[UInt]) -> f64 {
        let axes = column_dimensions.len().max(input_dimensions.len());
        let ratio_sum: f64 = (0..axes)
            .map(|axis| {
                let col = column_dimensions.get(axis).map_or(1.0, |&d| f64::from(d));
                let inp = input_dimensions.get(axis).map_or(1.0, |&d| f64::from(d));
                col / inp
            })
            .sum();
        ratio_sum / axes as f64
    }

    /// Mean extent (max - min + 1) of `inputs` over every axis.
    /// Returns 0 for an empty set.
    #[must_use]
    pub fn connected_span(inputs: &[usize], input_dimensions: &[UInt]) -> f64 {
        if inputs.is_empty() {
            return 0.0;
        }
        let axes = input_dimensions.len();
        let mut min = vec![UInt::MAX; axes];
        let mut max = vec![0; axes];
        for &idx in inputs {
            let coords = Self::index_to_coordinates(idx, input_dimensions);
            for axis in 0..axes {
                min[axis] = min[axis].min(coords[axis]);
                max[axis] = max[axis].max(coords[axis]);
            }
        }
        let total: f64 = min
            .iter()
            .zip(&max)
            .map(|(&lo, &hi)| f64::from(hi - lo + 1))
            .sum();
        total / axes as f64
    }
}

/// Precomputed neighbor lists, one per element of a space, center excluded.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neighborhood {
    radius: UInt,
    neighbors: Vec<Vec<u32>>,
}

impl Neighborhood {
    /// Computes the neighbors of every element of `dimensions`.
    #[must_use]
    pub fn compute_all(dimensions: &[UInt], radius: UInt, wrap: WrappingMode) -> Self {
        let neighbors = (0..Topology::num_elements(dimensions))
            .map(|i| {
                Topology::neighborhood(i, dimensions, radius, wrap, false)
                    .into_iter()
                    .map(|n| n as u32)
                    .collect()
            })
            .collect();
        Self { radius, neighbors }
    }

    /// Radius the lists were computed with.
    pub fn radius(&self) -> UInt {
        self.radius
    }

    /// Neighbors of `element`, or an empty slice if it is out of range.
    pub fn get(&self, element: usize) -> &[u32] {
        self.neighbors.get(element).map_or(&[], Vec::as_slice)
    }

    /// Number of elements covered.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// True if no lists have been computed.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
