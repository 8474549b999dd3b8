//! The unified tensor value
//!
//! [`Tensor`] is a closed enum over the three representations. The variant
//! is chosen once, when building, from the dimension mix of the type:
//!
//! | type                              | representation |
//! |-----------------------------------|----------------|
//! | no dimensions, or only indexed    | [`IndexedTensor`] |
//! | only mapped                       | [`MappedTensor`] |
//! | both mapped and indexed           | [`MixedTensor`] |
//!
//! Equality is mathematical: types must have the same dimension names and
//! kinds (sizes and value type are ignored), the same number of cells, and
//! every cell must match within [`TensorHints::tolerance`].

use std::fmt;
use std::str::FromStr;

use mixten_core::{DimensionSizes, Label, TensorAddress, TensorError, TensorResult, TensorType};

use crate::cell::{CellCursor, Cells};
use crate::hints::TensorHints;
use crate::indexed::{IndexedBuilder, IndexedTensor};
use crate::literal;
use crate::mapped::{MappedBuilder, MappedTensor};
use crate::mixed::{MixedBuilder, MixedTensor};
use crate::values::CellValues;

/// A tensor in one of its three representations
///
/// # Examples
///
/// ```
/// use mixten_core::{TensorAddress, TensorType};
/// use mixten_tensor::Tensor;
///
/// let t: TensorType = "tensor(key{},x[2])".parse().unwrap();
/// let mut builder = Tensor::builder(t);
/// builder.cell_builder().label("key", "a").label("x", 1u64).value(3.0).unwrap();
/// let tensor = builder.build().unwrap();
///
/// assert!(matches!(tensor, Tensor::Mixed(_)));
/// assert_eq!(tensor.get(&TensorAddress::of_labels(["a", "1"])), 3.0);
/// assert_eq!(tensor.to_string(), "tensor(key{},x[2]):{a:[0.0,3.0]}");
/// ```
#[derive(Debug, Clone)]
pub enum Tensor {
    Indexed(IndexedTensor),
    Mapped(MappedTensor),
    Mixed(MixedTensor),
}

impl Tensor {
    /// A builder choosing the representation from `tensor_type`
    pub fn builder(tensor_type: TensorType) -> TensorBuilder {
        TensorBuilder::new(tensor_type)
    }

    /// The rank-0 tensor holding `value`
    pub fn scalar(value: f64) -> Tensor {
        Tensor::Indexed(IndexedTensor::from_parts(
            TensorType::empty(),
            DimensionSizes::of(&[]),
            CellValues::Double(vec![value]),
        ))
    }

    /// Parse a tensor literal such as `tensor(x[2]):[1,2]`
    pub fn from_literal(literal: &str) -> TensorResult<Tensor> {
        literal::parse(literal, None)
    }

    /// Parse a literal body, or a complete literal, as a tensor of `tensor_type`
    ///
    /// # Errors
    ///
    /// Fails on malformed input, or if a complete literal declares a
    /// different type.
    pub fn from_literal_with_type(tensor_type: &TensorType, literal: &str) -> TensorResult<Tensor> {
        literal::parse(literal, Some(tensor_type))
    }

    pub fn tensor_type(&self) -> &TensorType {
        match self {
            Tensor::Indexed(t) => t.tensor_type(),
            Tensor::Mapped(t) => t.tensor_type(),
            Tensor::Mixed(t) => t.tensor_type(),
        }
    }

    /// Number of cells
    pub fn size(&self) -> usize {
        match self {
            Tensor::Indexed(t) => t.size(),
            Tensor::Mapped(t) => t.size(),
            Tensor::Mixed(t) => t.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The value at `address`.
    ///
    /// An address outside a dense tensor reads as NaN; an absent cell of a
    /// mapped or mixed tensor reads as `0.0`.
    pub fn get(&self, address: &TensorAddress) -> f64 {
        match self {
            Tensor::Indexed(t) => t.get(address),
            Tensor::Mapped(t) => t.get(address),
            Tensor::Mixed(t) => t.get(address),
        }
    }

    pub fn has(&self, address: &TensorAddress) -> bool {
        match self {
            Tensor::Indexed(t) => t.has(address),
            Tensor::Mapped(t) => t.has(address),
            Tensor::Mixed(t) => t.has(address),
        }
    }

    /// The value of a rank-0 or single-cell tensor
    ///
    /// # Errors
    ///
    /// Fails if the tensor does not have exactly one cell.
    pub fn as_double(&self) -> TensorResult<f64> {
        if self.size() != 1 {
            return Err(TensorError::invalid(format!(
                "Expected a single cell but {} has {}",
                self.tensor_type(),
                self.size()
            )));
        }
        let mut cursor = self.cursor();
        cursor
            .next()
            .map(|cell| cell.value())
            .ok_or_else(|| TensorError::invalid("Tensor has no cells"))
    }

    pub fn cursor(&self) -> CellCursor<'_> {
        match self {
            Tensor::Indexed(t) => CellCursor::Indexed(t.cursor()),
            Tensor::Mapped(t) => CellCursor::Mapped(t.cursor()),
            Tensor::Mixed(t) => CellCursor::Mixed(t.cursor()),
        }
    }

    pub fn cells(&self) -> Cells<'_> {
        Cells::new(self.cursor())
    }

    pub fn as_indexed(&self) -> Option<&IndexedTensor> {
        match self {
            Tensor::Indexed(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_mapped(&self) -> Option<&MappedTensor> {
        match self {
            Tensor::Mapped(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_mixed(&self) -> Option<&MixedTensor> {
        match self {
            Tensor::Mixed(t) => Some(t),
            _ => None,
        }
    }

    /// Mathematical equality under `hints`
    ///
    /// Both tensors must hold cells at the same addresses. Equal sizes plus
    /// every address of `self` present in `other` gives equal address sets.
    pub fn approx_eq_with(&self, other: &Tensor, hints: &TensorHints) -> bool {
        if !self.tensor_type().mathematically_equals(other.tensor_type()) {
            return false;
        }
        if self.size() != other.size() {
            return false;
        }
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            if !other.has(cell.address())
                || !hints.values_equal(cell.value(), other.get(cell.address()))
            {
                return false;
            }
        }
        true
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq_with(other, &TensorHints::default())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        literal::write(f, self)
    }
}

impl FromStr for Tensor {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_literal(s)
    }
}

impl From<IndexedTensor> for Tensor {
    fn from(tensor: IndexedTensor) -> Self {
        Tensor::Indexed(tensor)
    }
}

impl From<MappedTensor> for Tensor {
    fn from(tensor: MappedTensor) -> Self {
        Tensor::Mapped(tensor)
    }
}

impl From<MixedTensor> for Tensor {
    fn from(tensor: MixedTensor) -> Self {
        Tensor::Mixed(tensor)
    }
}

/// Builder for any [`Tensor`].
///
/// `build` consumes the builder, so no cell can be added afterwards:
///
/// ```compile_fail
/// use mixten_core::{TensorAddress, TensorType};
/// use mixten_tensor::Tensor;
///
/// let t: TensorType = "tensor(key{})".parse().unwrap();
/// let mut builder = Tensor::builder(t);
/// let tensor = builder.build().unwrap();
/// builder.cell(TensorAddress::of_labels(["a"]), 1.0).unwrap();
/// ```
#[derive(Debug)]
pub enum TensorBuilder {
    Indexed(IndexedBuilder),
    Mapped(MappedBuilder),
    Mixed(MixedBuilder),
}

impl TensorBuilder {
    pub fn new(tensor_type: TensorType) -> Self {
        Self::with_hints(tensor_type, &TensorHints::default())
    }

    /// A builder pre-sized by [`TensorHints::expected_cells`]
    pub fn with_hints(tensor_type: TensorType, hints: &TensorHints) -> Self {
        let capacity = hints.expected_cells;
        let mapped = tensor_type.has_mapped_dimensions();
        let indexed = tensor_type.has_indexed_dimensions();
        match (mapped, indexed) {
            (false, _) => TensorBuilder::Indexed(IndexedBuilder::new(tensor_type, capacity)),
            (true, false) => TensorBuilder::Mapped(MappedBuilder::new(tensor_type, capacity)),
            (true, true) => TensorBuilder::Mixed(MixedBuilder::new(tensor_type, capacity)),
        }
    }

    pub fn tensor_type(&self) -> &TensorType {
        match self {
            TensorBuilder::Indexed(b) => b.tensor_type(),
            TensorBuilder::Mapped(b) => b.tensor_type(),
            TensorBuilder::Mixed(b) => b.tensor_type(),
        }
    }

    /// Set the value at `address`, positional against the type's dimensions
    pub fn cell(&mut self, address: TensorAddress, value: f64) -> TensorResult<()> {
        match self {
            TensorBuilder::Indexed(b) => b.cell(&address, value),
            TensorBuilder::Mapped(b) => b.cell(address, value),
            TensorBuilder::Mixed(b) => b.cell(address, value),
        }
    }

    /// Set the value at numeric coordinates
    pub fn cell_at(&mut self, indexes: &[usize], value: f64) -> TensorResult<()> {
        match self {
            TensorBuilder::Indexed(b) => b.cell_at(indexes, value),
            _ => self.cell(TensorAddress::of_indexes(indexes), value),
        }
    }

    /// Start a cell addressed by dimension name
    pub fn cell_builder(&mut self) -> CellBuilder<'_> {
        CellBuilder {
            builder: self,
            labels: Vec::new(),
        }
    }

    pub fn build(self) -> TensorResult<Tensor> {
        Ok(match self {
            TensorBuilder::Indexed(b) => Tensor::Indexed(b.build()?),
            TensorBuilder::Mapped(b) => Tensor::Mapped(b.build()),
            TensorBuilder::Mixed(b) => Tensor::Mixed(b.build()?),
        })
    }
}

/// One cell under construction, addressed by dimension name
#[derive(Debug)]
pub struct CellBuilder<'b> {
    builder: &'b mut TensorBuilder,
    labels: Vec<(String, Label)>,
}

impl CellBuilder<'_> {
    pub fn label(mut self, dimension: impl Into<String>, label: impl Into<Label>) -> Self {
        self.labels.push((dimension.into(), label.into()));
        self
    }

    /// Finish the address and store `value`
    ///
    /// # Errors
    ///
    /// Fails if a dimension is unknown or lacks a label, or a label does not
    /// fit its dimension.
    pub fn value(self, value: f64) -> TensorResult<()> {
        let address = {
            let mut address = TensorAddress::builder(self.builder.tensor_type());
            for (dimension, label) in self.labels {
                address = address.add(&dimension, label)?;
            }
            address.build()?
        };
        self.builder.cell(address, value)
    }
}
