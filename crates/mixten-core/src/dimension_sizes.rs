//! Resolved sizes of the dimensions of a dense (sub)space
//!
//! [`DimensionSizes`] belong to a tensor *instance*, not its type: an
//! unbound dimension `x[]` has a concrete size once data exists. The sizes
//! define the flat storage layout, with the last dimension varying fastest
//! (row-major / C order).

use smallvec::SmallVec;

use crate::error::{TensorError, TensorResult};
use crate::tensor_type::TensorType;

/// Concrete sizes, one per dimension position.
///
/// # Examples
///
/// ```
/// use mixten_core::DimensionSizes;
///
/// let sizes = DimensionSizes::of(&[2, 3, 4]);
/// assert_eq!(sizes.total_size(), 24);
/// assert_eq!(sizes.stride(0), 12);
/// assert_eq!(sizes.to_value_index(&[1, 2, 3]), 23);
/// assert_eq!(sizes.from_value_index(23).as_slice(), &[1, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DimensionSizes {
    sizes: SmallVec<[usize; 6]>,
}

impl DimensionSizes {
    pub fn of(sizes: &[usize]) -> Self {
        Self {
            sizes: SmallVec::from_slice(sizes),
        }
    }

    /// Sizes of a type whose dimensions are all indexed and bound
    ///
    /// # Errors
    ///
    /// Fails if the type has a mapped or unbound dimension.
    pub fn from_type(tensor_type: &TensorType) -> TensorResult<Self> {
        tensor_type
            .dimensions()
            .iter()
            .map(|d| {
                d.size().map(|s| s as usize).ok_or_else(|| {
                    TensorError::invalid(format!(
                        "Dimension '{}' of {} has no fixed size",
                        d.name(),
                        tensor_type
                    ))
                })
            })
            .collect::<TensorResult<SmallVec<[usize; 6]>>>()
            .map(|sizes| Self { sizes })
    }

    /// Size of dimension `i`
    pub fn size(&self, i: usize) -> usize {
        self.sizes[i]
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.sizes.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.sizes
    }

    /// Product of all sizes; 1 for rank 0
    pub fn total_size(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Product of the sizes of all dimensions after `i`
    pub fn stride(&self, i: usize) -> usize {
        self.sizes[i + 1..].iter().product()
    }

    /// Strides of every dimension
    pub fn strides(&self) -> SmallVec<[usize; 6]> {
        let mut strides: SmallVec<[usize; 6]> = SmallVec::from_elem(1, self.sizes.len());
        for i in (0..self.sizes.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.sizes[i + 1];
        }
        strides
    }

    /// Flat offset of `indexes`; no bounds checking
    pub fn to_value_index(&self, indexes: &[usize]) -> usize {
        match indexes.len() {
            0 => 0,
            1 => indexes[0],
            _ => {
                let mut value_index = 0;
                for (i, &index) in indexes.iter().enumerate() {
                    value_index = value_index * self.sizes[i] + index;
                }
                value_index
            }
        }
    }

    /// Flat offset of `indexes`, checking arity and bounds
    pub fn checked_value_index(&self, indexes: &[usize]) -> TensorResult<usize> {
        if indexes.len() != self.rank()
            || indexes.iter().zip(&self.sizes).any(|(&i, &size)| i >= size)
        {
            return Err(TensorError::index_out_of_bounds(indexes, &self.sizes));
        }
        Ok(self.to_value_index(indexes))
    }

    /// Coordinates of a flat offset (inverse of [`to_value_index`](Self::to_value_index))
    pub fn from_value_index(&self, mut value_index: usize) -> SmallVec<[usize; 6]> {
        let mut indexes: SmallVec<[usize; 6]> = SmallVec::from_elem(0, self.sizes.len());
        for i in (0..self.sizes.len()).rev() {
            let size = self.sizes[i];
            if size == 0 {
                continue;
            }
            indexes[i] = value_index % size;
            value_index /= size;
        }
        indexes
    }

    /// Whether these sizes can hold a tensor of `tensor_type`'s indexed dimensions
    pub fn fits(&self, tensor_type: &TensorType) -> bool {
        self.rank() == tensor_type.rank()
            && tensor_type
                .dimensions()
                .iter()
                .zip(&self.sizes)
                .all(|(d, &s)| d.is_indexed() && d.size().map_or(true, |bound| bound as usize == s))
    }
}

impl From<&[usize]> for DimensionSizes {
    fn from(sizes: &[usize]) -> Self {
        Self::of(sizes)
    }
}
