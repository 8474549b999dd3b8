//! Cells and cell iteration
//!
//! Iteration comes in two flavors with a compile-time distinction:
//!
//! - [`CellCursor`] is a lending cursor. Each [`CellView`] borrows the cursor
//!   and is invalidated by the next call to [`CellCursor::next`]; dense
//!   tensors reuse a single address slot across steps instead of allocating.
//! - [`Cells`] is a plain [`Iterator`] of owned [`Cell`]s, detached from the
//!   tensor.
//!
//! A view is turned into an owned cell with [`CellView::detach`].

use mixten_core::TensorAddress;

use crate::indexed::IndexedCursor;
use crate::mapped::MappedCursor;
use crate::mixed::MixedCursor;

/// An owned cell: an address and its value
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    address: TensorAddress,
    value: f64,
}

impl Cell {
    pub fn new(address: TensorAddress, value: f64) -> Self {
        Self { address, value }
    }

    pub fn address(&self) -> &TensorAddress {
        &self.address
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn into_parts(self) -> (TensorAddress, f64) {
        (self.address, self.value)
    }
}

/// A cell borrowed from a cursor
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    address: &'a TensorAddress,
    value: f64,
}

impl<'a> CellView<'a> {
    pub(crate) fn new(address: &'a TensorAddress, value: f64) -> Self {
        Self { address, value }
    }

    pub fn address(&self) -> &'a TensorAddress {
        self.address
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Copy out a stable cell that outlives the cursor step
    pub fn detach(&self) -> Cell {
        Cell::new(self.address.clone(), self.value)
    }
}

/// Lending cursor over the cells of any tensor representation.
///
/// # Examples
///
/// ```
/// use mixten_tensor::Tensor;
///
/// let t: Tensor = "tensor(x[3]):[1,2,3]".parse().unwrap();
/// let mut cursor = t.cursor();
/// let mut sum = 0.0;
/// while let Some(cell) = cursor.next() {
///     sum += cell.value();
/// }
/// assert_eq!(sum, 6.0);
/// ```
#[derive(Debug)]
pub enum CellCursor<'a> {
    Indexed(IndexedCursor<'a>),
    Mapped(MappedCursor<'a>),
    Mixed(MixedCursor<'a>),
}

impl CellCursor<'_> {
    /// The next cell, valid until the following call
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CellView<'_>> {
        match self {
            CellCursor::Indexed(cursor) => cursor.next(),
            CellCursor::Mapped(cursor) => cursor.next(),
            CellCursor::Mixed(cursor) => cursor.next(),
        }
    }
}

/// Iterator of owned cells
#[derive(Debug)]
pub struct Cells<'a> {
    cursor: CellCursor<'a>,
}

impl<'a> Cells<'a> {
    pub(crate) fn new(cursor: CellCursor<'a>) -> Self {
        Self { cursor }
    }
}

impl Iterator for Cells<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        self.cursor.next().map(|view| view.detach())
    }
}
