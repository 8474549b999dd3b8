//! Mutable flat-offset cursor for hot loops
//!
//! [`DirectIndexedAddress`] keeps a running flat offset into a dense layout.
//! Changing one coordinate adjusts the offset by the delta times that
//! dimension's stride, so repeated updates to one or two dimensions inside a
//! loop never recompute the full coordinate-to-offset product.

use smallvec::SmallVec;

use crate::dimension_sizes::DimensionSizes;

/// A mutable dense coordinate with its precomputed flat offset.
///
/// # Examples
///
/// ```
/// use mixten_core::{DimensionSizes, DirectIndexedAddress};
///
/// let mut address = DirectIndexedAddress::of(&DimensionSizes::of(&[3, 4]));
/// address.set_index(0, 2);
/// address.set_index(1, 1);
/// assert_eq!(address.index(), 9);
/// assert_eq!(address.stride(0), 4);
/// address.set_index(0, 0);
/// assert_eq!(address.index(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DirectIndexedAddress {
    sizes: DimensionSizes,
    strides: SmallVec<[usize; 6]>,
    indexes: SmallVec<[usize; 6]>,
    index: usize,
}

impl DirectIndexedAddress {
    /// A cursor at the origin of `sizes`
    pub fn of(sizes: &DimensionSizes) -> Self {
        Self {
            strides: sizes.strides(),
            indexes: SmallVec::from_elem(0, sizes.rank()),
            sizes: sizes.clone(),
            index: 0,
        }
    }

    /// Set coordinate `dimension`; O(1)
    ///
    /// Coordinates are not bounds checked; callers iterate within the sizes.
    #[inline]
    pub fn set_index(&mut self, dimension: usize, value: usize) {
        let current = self.indexes[dimension];
        let stride = self.strides[dimension];
        if value >= current {
            self.index += (value - current) * stride;
        } else {
            self.index -= (current - value) * stride;
        }
        self.indexes[dimension] = value;
    }

    /// The flat offset of the current coordinates
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Product of the sizes of all dimensions after `dimension`
    pub fn stride(&self, dimension: usize) -> usize {
        self.strides[dimension]
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    pub fn sizes(&self) -> &DimensionSizes {
        &self.sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_full_computation() {
        let sizes = DimensionSizes::of(&[2, 3, 4]);
        let mut address = DirectIndexedAddress::of(&sizes);
        for i in 0..2 {
            address.set_index(0, i);
            for j in 0..3 {
                address.set_index(1, j);
                for k in 0..4 {
                    address.set_index(2, k);
                    assert_eq!(address.index(), sizes.to_value_index(&[i, j, k]));
                }
            }
        }
    }

    #[test]
    fn test_rank_zero() {
        let address = DirectIndexedAddress::of(&DimensionSizes::of(&[]));
        assert_eq!(address.index(), 0);
    }
}
