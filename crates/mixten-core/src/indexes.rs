//! Sequential iteration over dense coordinates
//!
//! [`Indexes`] walks a subset of the dimensions of a dense space while the
//! other dimensions stay fixed, keeping the flat offsets of the current
//! position up to date incrementally instead of recomputing them per step.
//!
//! The *iterate dimensions* are given in increment order: the first one in the
//! list varies fastest. [`Indexes::all`] iterates every dimension in canonical
//! order (last dimension fastest), visiting flat offsets `0..total_size()` in
//! sequence.
//!
//! Several strategies exist for speed (single-value, single-dimension with
//! equal or differing strides, general multi-dimension); they all produce the
//! same order as the general case.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{DimensionSizes, Indexes};
//!
//! let sizes = DimensionSizes::of(&[2, 3]);
//! let mut indexes = Indexes::all(&sizes);
//! let mut visited = Vec::new();
//! while indexes.next() {
//!     visited.push(indexes.source_value_index());
//! }
//! assert_eq!(visited, vec![0, 1, 2, 3, 4, 5]);
//! ```

use smallvec::SmallVec;

use crate::address::TensorAddress;
use crate::dimension_sizes::DimensionSizes;
use crate::error::{TensorError, TensorResult};

type Buffer = SmallVec<[usize; 6]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Empty,
    SingleValue,
    EqualSizeSingleDimension {
        dimension: usize,
        stride: usize,
    },
    SingleDimension {
        dimension: usize,
        source_stride: usize,
        iterate_stride: usize,
    },
    MultiDimension,
}

/// A cursor over the coordinates of a dense (sub)space.
///
/// Call [`next`](Self::next) before reading the first position; it returns
/// `false` once all [`size`](Self::size) positions have been visited and the
/// position no longer changes.
#[derive(Debug, Clone)]
pub struct Indexes {
    source_sizes: DimensionSizes,
    iterate_sizes: DimensionSizes,
    iterate_dimensions: Buffer,
    indexes: Buffer,
    source_strides: Buffer,
    iterate_strides: Buffer,
    source_index: usize,
    iteration_index: usize,
    size: usize,
    remaining: usize,
    started: bool,
    strategy: Strategy,
}

impl Indexes {
    /// Iterate every position of `sizes` in canonical order
    pub fn all(sizes: &DimensionSizes) -> Self {
        let iterate_dimensions: Buffer = (0..sizes.rank()).rev().collect();
        let initial: Buffer = SmallVec::from_elem(0, sizes.rank());
        Self::build(sizes.clone(), sizes.clone(), iterate_dimensions, initial)
    }

    /// Iterate `iterate_dimensions` (first one fastest) over `iterate_sizes`,
    /// holding the other coordinates at their values in `initial`.
    ///
    /// Offsets are reported both in the layout of `source_sizes` (the storage
    /// being read) and of `iterate_sizes`. Iteration starts at 0 in every
    /// iterated dimension regardless of `initial`.
    ///
    /// # Errors
    ///
    /// Fails if the ranks of the arguments disagree, if an iterate dimension
    /// is out of range or repeated, or if a held coordinate lies outside its
    /// dimension.
    pub fn of(
        source_sizes: &DimensionSizes,
        iterate_sizes: &DimensionSizes,
        iterate_dimensions: &[usize],
        initial: &[usize],
    ) -> TensorResult<Self> {
        let rank = source_sizes.rank();
        if iterate_sizes.rank() != rank || initial.len() != rank {
            return Err(TensorError::RankMismatch {
                expected: rank,
                got: if iterate_sizes.rank() != rank {
                    iterate_sizes.rank()
                } else {
                    initial.len()
                },
            });
        }
        for (i, &d) in iterate_dimensions.iter().enumerate() {
            if d >= rank || iterate_dimensions[..i].contains(&d) {
                return Err(TensorError::invalid(format!(
                    "Bad iterate dimension {} for rank {}",
                    d, rank
                )));
            }
        }
        let held_out_of_bounds = (0..rank).any(|d| {
            !iterate_dimensions.contains(&d)
                && (initial[d] >= source_sizes.size(d) || initial[d] >= iterate_sizes.size(d))
        });
        if held_out_of_bounds {
            return Err(TensorError::index_out_of_bounds(
                initial,
                source_sizes.as_slice(),
            ));
        }
        Ok(Self::build(
            source_sizes.clone(),
            iterate_sizes.clone(),
            SmallVec::from_slice(iterate_dimensions),
            SmallVec::from_slice(initial),
        ))
    }

    fn build(
        source_sizes: DimensionSizes,
        iterate_sizes: DimensionSizes,
        iterate_dimensions: Buffer,
        mut indexes: Buffer,
    ) -> Self {
        for &d in &iterate_dimensions {
            indexes[d] = 0;
        }
        let size: usize = iterate_dimensions
            .iter()
            .map(|&d| iterate_sizes.size(d))
            .product();
        let source_strides = source_sizes.strides();
        let iterate_strides = iterate_sizes.strides();
        let source_index = dot(&indexes, &source_strides);
        let iteration_index = dot(&indexes, &iterate_strides);

        let strategy = if size == 0 {
            Strategy::Empty
        } else if size == 1 {
            Strategy::SingleValue
        } else if iterate_dimensions.len() == 1 {
            let dimension = iterate_dimensions[0];
            if source_strides[dimension] == iterate_strides[dimension] {
                Strategy::EqualSizeSingleDimension {
                    dimension,
                    stride: source_strides[dimension],
                }
            } else {
                Strategy::SingleDimension {
                    dimension,
                    source_stride: source_strides[dimension],
                    iterate_stride: iterate_strides[dimension],
                }
            }
        } else {
            Strategy::MultiDimension
        };

        Self {
            source_sizes,
            iterate_sizes,
            iterate_dimensions,
            indexes,
            source_strides,
            iterate_strides,
            source_index,
            iteration_index,
            size,
            remaining: size,
            started: false,
            strategy,
        }
    }

    /// Advance one position; `false` when iteration is exhausted
    #[inline]
    pub fn next(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if !self.started {
            self.started = true;
            return true;
        }
        match self.strategy {
            Strategy::Empty | Strategy::SingleValue => {}
            Strategy::EqualSizeSingleDimension { dimension, stride } => {
                self.indexes[dimension] += 1;
                self.source_index += stride;
                self.iteration_index += stride;
            }
            Strategy::SingleDimension {
                dimension,
                source_stride,
                iterate_stride,
            } => {
                self.indexes[dimension] += 1;
                self.source_index += source_stride;
                self.iteration_index += iterate_stride;
            }
            Strategy::MultiDimension => self.next_multi_dimension(),
        }
        true
    }

    fn next_multi_dimension(&mut self) {
        for &d in &self.iterate_dimensions {
            if self.indexes[d] + 1 < self.iterate_sizes.size(d) {
                self.indexes[d] += 1;
                self.source_index += self.source_strides[d];
                self.iteration_index += self.iterate_strides[d];
                return;
            }
            // carry over
            self.source_index -= self.indexes[d] * self.source_strides[d];
            self.iteration_index -= self.indexes[d] * self.iterate_strides[d];
            self.indexes[d] = 0;
        }
    }

    /// Number of positions this iteration visits
    pub fn size(&self) -> usize {
        self.size
    }

    /// Positions not yet visited
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Coordinates of the current position
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Flat offset of the current position in the source layout
    pub fn source_value_index(&self) -> usize {
        self.source_index
    }

    /// Flat offset of the current position in the iteration layout
    pub fn iteration_value_index(&self) -> usize {
        self.iteration_index
    }

    /// Whether the current position lies inside the source sizes
    pub fn is_within_source(&self) -> bool {
        self.indexes
            .iter()
            .zip(self.source_sizes.as_slice())
            .all(|(&i, &s)| i < s)
    }

    pub fn source_sizes(&self) -> &DimensionSizes {
        &self.source_sizes
    }

    pub fn iterate_sizes(&self) -> &DimensionSizes {
        &self.iterate_sizes
    }

    /// The current position as a numeric address
    pub fn to_address(&self) -> TensorAddress {
        TensorAddress::of_indexes(&self.indexes)
    }
}

fn dot(indexes: &[usize], strides: &[usize]) -> usize {
    indexes.iter().zip(strides).map(|(i, s)| i * s).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(indexes: &mut Indexes) -> Vec<(Vec<usize>, usize, usize)> {
        let mut out = Vec::new();
        while indexes.next() {
            out.push((
                indexes.indexes().to_vec(),
                indexes.source_value_index(),
                indexes.iteration_value_index(),
            ));
        }
        out
    }

    #[test]
    fn test_empty_and_single_value() {
        let mut empty = Indexes::all(&DimensionSizes::of(&[3, 0]));
        assert_eq!(empty.size(), 0);
        assert!(!empty.next());

        let mut scalar = Indexes::all(&DimensionSizes::of(&[]));
        assert_eq!(scalar.size(), 1);
        assert!(scalar.next());
        assert_eq!(scalar.source_value_index(), 0);
        assert!(!scalar.next());
    }

    #[test]
    fn test_canonical_order() {
        let mut indexes = Indexes::all(&DimensionSizes::of(&[2, 2]));
        let coords: Vec<Vec<usize>> = visit(&mut indexes).into_iter().map(|v| v.0).collect();
        assert_eq!(
            coords,
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn test_first_iterate_dimension_is_fastest() {
        let sizes = DimensionSizes::of(&[2, 2]);
        let mut indexes = Indexes::of(&sizes, &sizes, &[0, 1], &[0, 0]).unwrap();
        let visited = visit(&mut indexes);
        let offsets: Vec<usize> = visited.iter().map(|v| v.1).collect();
        assert_eq!(offsets, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_subspace_holds_other_dimensions() {
        let sizes = DimensionSizes::of(&[2, 3, 4]);
        let mut indexes = Indexes::of(&sizes, &sizes, &[1], &[1, 0, 2]).unwrap();
        let visited = visit(&mut indexes);
        assert_eq!(
            visited.iter().map(|v| v.0.clone()).collect::<Vec<_>>(),
            vec![vec![1, 0, 2], vec![1, 1, 2], vec![1, 2, 2]]
        );
        assert_eq!(
            visited.iter().map(|v| v.1).collect::<Vec<_>>(),
            vec![14, 18, 22]
        );
    }

    #[test]
    fn test_single_dimension_with_differing_strides() {
        let source = DimensionSizes::of(&[3, 5]);
        let iterate = DimensionSizes::of(&[3, 2]);
        let mut indexes = Indexes::of(&source, &iterate, &[0], &[0, 1]).unwrap();
        assert!(matches!(indexes.strategy, Strategy::SingleDimension { .. }));
        let visited = visit(&mut indexes);
        assert_eq!(
            visited.iter().map(|v| (v.1, v.2)).collect::<Vec<_>>(),
            vec![(1, 1), (6, 3), (11, 5)]
        );
    }

    #[test]
    fn test_specialized_strategies_match_general_order() {
        // The same single-dimension walk expressed through the general strategy
        // (a second iterate dimension of size 1) must match exactly.
        let sizes = DimensionSizes::of(&[1, 4]);
        let mut single = Indexes::of(&sizes, &sizes, &[1], &[0, 0]).unwrap();
        let mut general = Indexes::of(&sizes, &sizes, &[1, 0], &[0, 0]).unwrap();
        assert_eq!(single.strategy, Strategy::EqualSizeSingleDimension { dimension: 1, stride: 1 });
        assert_eq!(general.strategy, Strategy::MultiDimension);
        assert_eq!(visit(&mut single), visit(&mut general));
    }

    #[test]
    fn test_invalid_arguments() {
        let sizes = DimensionSizes::of(&[2, 2]);
        assert!(Indexes::of(&sizes, &sizes, &[2], &[0, 0]).is_err());
        assert!(Indexes::of(&sizes, &sizes, &[0, 0], &[0, 0]).is_err());
        assert!(Indexes::of(&sizes, &DimensionSizes::of(&[2]), &[0], &[0, 0]).is_err());
    }

    #[test]
    fn test_held_coordinates_must_be_in_bounds() {
        let sizes = DimensionSizes::of(&[2, 3]);
        assert_eq!(
            Indexes::of(&sizes, &sizes, &[1], &[2, 0]).err(),
            Some(TensorError::index_out_of_bounds(&[2, 0], &[2, 3]))
        );
        let narrow = DimensionSizes::of(&[1, 3]);
        assert!(matches!(
            Indexes::of(&sizes, &narrow, &[1], &[1, 0]),
            Err(TensorError::IndexOutOfBounds { .. })
        ));

        // iterated coordinates are reset, so their initial value is unchecked
        let mut indexes = Indexes::of(&sizes, &sizes, &[1], &[1, 7]).unwrap();
        let offsets: Vec<usize> = visit(&mut indexes).into_iter().map(|v| v.1).collect();
        assert_eq!(offsets, vec![3, 4, 5]);
    }
}
