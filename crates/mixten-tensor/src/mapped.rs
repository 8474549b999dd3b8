//! Sparse tensors over mapped dimensions
//!
//! A [`MappedTensor`] is a hash map from [`TensorAddress`] to value. Absent
//! cells read as `0.0`, the additive identity; [`MappedTensor::has`] tells an
//! absent cell from a stored zero.

use std::collections::hash_map::{self, HashMap};

use mixten_core::{TensorAddress, TensorError, TensorResult, TensorType};

use crate::cell::{CellCursor, CellView, Cells};
use crate::indexed::check_rank;
use crate::values::round_to;

/// A sparse tensor
///
/// # Examples
///
/// ```
/// use mixten_core::{TensorAddress, TensorType};
/// use mixten_tensor::MappedTensor;
///
/// let t: TensorType = "tensor(key{})".parse().unwrap();
/// let mut builder = MappedTensor::builder(t).unwrap();
/// builder.cell(TensorAddress::of_labels(["a"]), 0.0).unwrap();
/// let tensor = builder.build();
///
/// let a = TensorAddress::of_labels(["a"]);
/// let b = TensorAddress::of_labels(["b"]);
/// assert_eq!(tensor.get(&b), 0.0);
/// assert!(tensor.has(&a));
/// assert!(!tensor.has(&b));
/// ```
#[derive(Debug, Clone)]
pub struct MappedTensor {
    tensor_type: TensorType,
    cells: HashMap<TensorAddress, f64>,
}

impl MappedTensor {
    /// # Errors
    ///
    /// Fails if the type has an indexed dimension.
    pub fn builder(tensor_type: TensorType) -> TensorResult<MappedBuilder> {
        if tensor_type.has_indexed_dimensions() {
            return Err(TensorError::invalid(format!(
                "A mapped tensor cannot have indexed dimensions: {}",
                tensor_type
            )));
        }
        Ok(MappedBuilder::new(tensor_type, None))
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    /// Number of stored cells
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// The stored value, or `0.0` if absent
    pub fn get(&self, address: &TensorAddress) -> f64 {
        self.cells.get(address).copied().unwrap_or(0.0)
    }

    pub fn has(&self, address: &TensorAddress) -> bool {
        self.cells.contains_key(address)
    }

    /// Addresses of all stored cells, in no particular order
    pub fn addresses(&self) -> impl Iterator<Item = &TensorAddress> + '_ {
        self.cells.keys()
    }

    pub fn cursor(&self) -> MappedCursor<'_> {
        MappedCursor {
            cells: self.cells.iter(),
        }
    }

    pub fn cells(&self) -> Cells<'_> {
        Cells::new(CellCursor::Mapped(self.cursor()))
    }

    /// The same addresses with `f` applied to every value, as `tensor_type`
    pub(crate) fn map_values(&self, tensor_type: TensorType, f: impl Fn(f64) -> f64) -> Self {
        let value_type = tensor_type.value_type();
        let cells = self
            .cells
            .iter()
            .map(|(address, &value)| (address.clone(), round_to(value_type, f(value))))
            .collect();
        Self { tensor_type, cells }
    }
}

/// Cursor over the stored cells of a [`MappedTensor`], in no particular order
#[derive(Debug)]
pub struct MappedCursor<'a> {
    cells: hash_map::Iter<'a, TensorAddress, f64>,
}

impl MappedCursor<'_> {
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CellView<'_>> {
        self.cells
            .next()
            .map(|(address, &value)| CellView::new(address, value))
    }
}

/// Builder for a [`MappedTensor`]; a later cell at the same address wins
#[derive(Debug)]
pub struct MappedBuilder {
    tensor_type: TensorType,
    cells: HashMap<TensorAddress, f64>,
}

impl MappedBuilder {
    pub(crate) fn new(tensor_type: TensorType, capacity: Option<usize>) -> Self {
        Self {
            tensor_type,
            cells: HashMap::with_capacity(capacity.unwrap_or(0)),
        }
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    /// # Errors
    ///
    /// Fails if the address does not have one label per dimension.
    pub fn cell(&mut self, address: TensorAddress, value: f64) -> TensorResult<()> {
        check_rank(&self.tensor_type, &address)?;
        let value = round_to(self.tensor_type.value_type(), value);
        self.cells.insert(address, value);
        Ok(())
    }

    pub fn build(self) -> MappedTensor {
        MappedTensor {
            tensor_type: self.tensor_type,
            cells: self.cells,
        }
    }
}
