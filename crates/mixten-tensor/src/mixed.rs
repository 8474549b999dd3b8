//! Mixed tensors: sparse over mapped dimensions, dense within
//!
//! A [`MixedTensor`] keeps one flat list of cells in which every *sparse
//! partial address* (the labels of the mapped dimensions) owns a contiguous
//! dense subspace of the same size. A [`MixedIndex`] maps each sparse partial
//! address to the start of its subspace.
//!
//! Lookups split the address into its sparse and dense parts, find the
//! subspace, add the dense offset and verify that the cell found carries the
//! requested address. Anything not found reads as `0.0`.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{TensorAddress, TensorType};
//! use mixten_tensor::MixedTensor;
//!
//! let t: TensorType = "tensor(key{},x[2])".parse().unwrap();
//! let mut builder = MixedTensor::builder(t);
//! builder.cell(TensorAddress::of_labels(["a", "1"]), 2.0).unwrap();
//! let tensor = builder.build().unwrap();
//!
//! assert_eq!(tensor.dense_subspace_size(), 2);
//! assert_eq!(tensor.size(), 2);
//! assert_eq!(tensor.get(&TensorAddress::of_labels(["a", "1"])), 2.0);
//! assert_eq!(tensor.get(&TensorAddress::of_labels(["b", "1"])), 0.0);
//! ```

use std::collections::HashMap;
use std::slice;

use mixten_core::{
    Dimension, DimensionSizes, Label, TensorAddress, TensorError, TensorResult, TensorType,
};

use crate::cell::{Cell, CellCursor, CellView, Cells};
use crate::indexed::{check_rank, checked_coordinate, Positions};
use crate::values::round_to;

/// Positions of the mapped and indexed dimensions of a type with bound
/// indexed dimensions.
#[derive(Debug, Clone)]
struct Layout {
    mapped_positions: Positions,
    indexed_positions: Positions,
    dense_sizes: DimensionSizes,
}

impl Layout {
    fn of(tensor_type: &TensorType) -> TensorResult<Self> {
        let mut mapped_positions = Positions::new();
        let mut indexed_positions = Positions::new();
        let mut sizes = Positions::new();
        for (position, dimension) in tensor_type.dimensions().iter().enumerate() {
            if dimension.is_mapped() {
                mapped_positions.push(position);
                continue;
            }
            let size = dimension.size().ok_or_else(|| {
                TensorError::invalid(format!(
                    "Dimension '{}' of {} must be bound",
                    dimension.name(),
                    tensor_type
                ))
            })?;
            indexed_positions.push(position);
            sizes.push(size as usize);
        }
        Ok(Self {
            mapped_positions,
            indexed_positions,
            dense_sizes: DimensionSizes::of(&sizes),
        })
    }

    fn rank(&self) -> usize {
        self.mapped_positions.len() + self.indexed_positions.len()
    }

    fn sparse_address(&self, address: &TensorAddress) -> TensorAddress {
        address.project(&self.mapped_positions)
    }

    /// Offset within the dense subspace, `None` if outside it
    fn dense_offset(&self, address: &TensorAddress) -> Option<usize> {
        let mut offset = 0usize;
        for (k, &position) in self.indexed_positions.iter().enumerate() {
            let label = usize::try_from(address.numeric_label(position).ok()?).ok()?;
            let size = self.dense_sizes.size(k);
            if label >= size {
                return None;
            }
            offset = offset * size + label;
        }
        Some(offset)
    }

    /// Whether `requested` names the stored cell, comparing indexed labels
    /// by their integer value so `01` and `1` agree
    fn same_cell(&self, stored: &TensorAddress, requested: &TensorAddress) -> bool {
        self.mapped_positions
            .iter()
            .all(|&p| stored.label(p) == requested.label(p))
            && self.indexed_positions.iter().all(|&p| {
                matches!(
                    (stored.numeric_label(p), requested.numeric_label(p)),
                    (Ok(a), Ok(b)) if a == b
                )
            })
    }

    fn checked_dense_offset(
        &self,
        tensor_type: &TensorType,
        address: &TensorAddress,
    ) -> TensorResult<usize> {
        let mut offset = 0usize;
        for (k, &position) in self.indexed_positions.iter().enumerate() {
            let index = checked_coordinate(tensor_type, address, position)?;
            offset = offset * self.dense_sizes.size(k) + index;
        }
        Ok(offset)
    }

    /// The full address of dense `offset` within the subspace of `sparse`
    fn full_address(&self, sparse: &TensorAddress, offset: usize) -> TensorAddress {
        let dense = self.dense_sizes.from_value_index(offset);
        let mut labels = vec![Label::Numeric(0); self.rank()];
        for (j, &position) in self.mapped_positions.iter().enumerate() {
            labels[position] = sparse.label_at(j);
        }
        for (k, &position) in self.indexed_positions.iter().enumerate() {
            labels[position] = Label::Numeric(dense[k] as u64);
        }
        TensorAddress::of_labels(labels)
    }
}

/// Sparse partial address to dense subspace start
#[derive(Debug, Clone)]
pub struct MixedIndex {
    sparse_type: TensorType,
    layout: Layout,
    starts: HashMap<TensorAddress, usize>,
    order: Vec<TensorAddress>,
}

impl MixedIndex {
    /// The type of the sparse partial addresses
    pub fn sparse_type(&self) -> &TensorType {
        &self.sparse_type
    }

    /// Sizes of the indexed dimensions within one subspace
    pub fn dense_sizes(&self) -> &DimensionSizes {
        &self.layout.dense_sizes
    }

    /// Number of cells in every dense subspace
    pub fn dense_subspace_size(&self) -> usize {
        self.layout.dense_sizes.total_size()
    }

    /// Offset of the first cell of the subspace of `sparse`
    pub fn subspace_start(&self, sparse: &TensorAddress) -> Option<usize> {
        self.starts.get(sparse).copied()
    }

    /// Number of subspaces
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sparse partial addresses in cell order
    pub fn sparse_addresses(&self) -> impl Iterator<Item = &TensorAddress> + '_ {
        self.order.iter()
    }
}

/// A tensor with both mapped and indexed dimensions
#[derive(Debug, Clone)]
pub struct MixedTensor {
    tensor_type: TensorType,
    cells: Vec<Cell>,
    index: MixedIndex,
}

impl MixedTensor {
    /// A builder for `tensor_type`: bound if every indexed dimension is
    /// bound, otherwise unbound.
    pub fn builder(tensor_type: TensorType) -> MixedBuilder {
        MixedBuilder::new(tensor_type, None)
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    /// Number of cells, including the zero-filled parts of subspaces
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn index(&self) -> &MixedIndex {
        &self.index
    }

    pub fn dense_subspace_size(&self) -> usize {
        self.index.dense_subspace_size()
    }

    /// Sparse partial addresses in cell order
    pub fn sparse_addresses(&self) -> impl Iterator<Item = &TensorAddress> + '_ {
        self.index.sparse_addresses()
    }

    /// The cells of the subspace of `sparse`, in canonical dense order
    pub fn dense_subspace(&self, sparse: &TensorAddress) -> Option<&[Cell]> {
        let start = self.index.subspace_start(sparse)?;
        self.cells
            .get(start..start + self.index.dense_subspace_size())
    }

    /// The value at `address`, or `0.0` if absent
    pub fn get(&self, address: &TensorAddress) -> f64 {
        self.find(address).map_or(0.0, Cell::value)
    }

    pub fn has(&self, address: &TensorAddress) -> bool {
        self.find(address).is_some()
    }

    fn find(&self, address: &TensorAddress) -> Option<&Cell> {
        let layout = &self.index.layout;
        if address.size() != layout.rank() {
            return None;
        }
        let start = self.index.subspace_start(&layout.sparse_address(address))?;
        let offset = layout.dense_offset(address)?;
        let cell = self.cells.get(start + offset)?;
        if !layout.same_cell(cell.address(), address) {
            log::trace!(
                "mixed lookup of {} found cell {}",
                address,
                cell.address()
            );
            return None;
        }
        Some(cell)
    }

    pub fn cursor(&self) -> MixedCursor<'_> {
        MixedCursor {
            cells: self.cells.iter(),
        }
    }

    pub fn cells(&self) -> Cells<'_> {
        Cells::new(CellCursor::Mixed(self.cursor()))
    }

    /// The same cell layout with `f` applied to every value, as `tensor_type`
    pub(crate) fn map_values(&self, tensor_type: TensorType, f: impl Fn(f64) -> f64) -> Self {
        let value_type = tensor_type.value_type();
        let cells = self
            .cells
            .iter()
            .map(|cell| Cell::new(cell.address().clone(), round_to(value_type, f(cell.value()))))
            .collect();
        Self {
            tensor_type,
            cells,
            index: self.index.clone(),
        }
    }
}

/// Cursor over the cells of a [`MixedTensor`] in storage order
#[derive(Debug)]
pub struct MixedCursor<'a> {
    cells: slice::Iter<'a, Cell>,
}

impl MixedCursor<'_> {
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CellView<'_>> {
        self.cells
            .next()
            .map(|cell| CellView::new(cell.address(), cell.value()))
    }
}

/// Builder for a [`MixedTensor`], bound or unbound
#[derive(Debug)]
pub enum MixedBuilder {
    Bound(BoundBuilder),
    Unbound(UnboundBuilder),
}

impl MixedBuilder {
    pub(crate) fn new(tensor_type: TensorType, capacity: Option<usize>) -> Self {
        match Layout::of(&tensor_type) {
            Ok(layout) => MixedBuilder::Bound(BoundBuilder::new(tensor_type, layout, capacity)),
            Err(_) => MixedBuilder::Unbound(UnboundBuilder::new(tensor_type, capacity)),
        }
    }

    pub fn tensor_type(&self) -> &TensorType {
        match self {
            MixedBuilder::Bound(b) => &b.tensor_type,
            MixedBuilder::Unbound(b) => &b.tensor_type,
        }
    }

    pub fn cell(&mut self, address: TensorAddress, value: f64) -> TensorResult<()> {
        match self {
            MixedBuilder::Bound(b) => b.cell(&address, value),
            MixedBuilder::Unbound(b) => b.cell(address, value),
        }
    }

    /// # Errors
    ///
    /// Unbound building fails if the derived bound type is invalid.
    pub fn build(self) -> TensorResult<MixedTensor> {
        match self {
            MixedBuilder::Bound(b) => Ok(b.build()),
            MixedBuilder::Unbound(b) => b.build(),
        }
    }
}

/// Accumulates one dense block per sparse partial address.
///
/// Cells never assigned within a block are zero.
#[derive(Debug)]
pub struct BoundBuilder {
    tensor_type: TensorType,
    layout: Layout,
    blocks: HashMap<TensorAddress, Vec<f64>>,
    order: Vec<TensorAddress>,
}

impl BoundBuilder {
    fn new(tensor_type: TensorType, layout: Layout, capacity: Option<usize>) -> Self {
        let subspaces = capacity.map_or(0, |c| c / layout.dense_sizes.total_size().max(1));
        Self {
            tensor_type,
            layout,
            blocks: HashMap::with_capacity(subspaces),
            order: Vec::with_capacity(subspaces),
        }
    }

    /// # Errors
    ///
    /// Fails on wrong arity or an indexed label that is non-numeric or out
    /// of range.
    pub fn cell(&mut self, address: &TensorAddress, value: f64) -> TensorResult<()> {
        check_rank(&self.tensor_type, address)?;
        let offset = self.layout.checked_dense_offset(&self.tensor_type, address)?;
        let sparse = self.layout.sparse_address(address);
        let dense_size = self.layout.dense_sizes.total_size();
        let order = &mut self.order;
        let block = self.blocks.entry(sparse).or_insert_with_key(|sparse| {
            order.push(sparse.clone());
            vec![0.0; dense_size]
        });
        block[offset] = round_to(self.tensor_type.value_type(), value);
        Ok(())
    }

    pub fn build(mut self) -> MixedTensor {
        let dense_size = self.layout.dense_sizes.total_size();
        let mut cells = Vec::with_capacity(self.order.len() * dense_size);
        let mut starts = HashMap::with_capacity(self.order.len());
        for sparse in &self.order {
            let Some(block) = self.blocks.remove(sparse) else {
                continue;
            };
            starts.insert(sparse.clone(), cells.len());
            for (offset, value) in block.into_iter().enumerate() {
                cells.push(Cell::new(self.layout.full_address(sparse, offset), value));
            }
        }
        let sparse_type = self.tensor_type.mapped_subtype();
        MixedTensor {
            tensor_type: self.tensor_type,
            cells,
            index: MixedIndex {
                sparse_type,
                layout: self.layout,
                starts,
                order: self.order,
            },
        }
    }
}

/// Collects cells while tracking the largest label of each indexed
/// dimension, then derives a bound type and replays into a [`BoundBuilder`].
#[derive(Debug)]
pub struct UnboundBuilder {
    tensor_type: TensorType,
    extents: Positions,
    cells: Vec<(TensorAddress, f64)>,
}

impl UnboundBuilder {
    fn new(tensor_type: TensorType, capacity: Option<usize>) -> Self {
        let extents = tensor_type
            .dimensions()
            .iter()
            .map(|d| d.size().map_or(0, |s| s as usize))
            .collect();
        Self {
            tensor_type,
            extents,
            cells: Vec::with_capacity(capacity.unwrap_or(0)),
        }
    }

    /// # Errors
    ///
    /// Fails on wrong arity or an indexed label that is non-numeric or out
    /// of range.
    pub fn cell(&mut self, address: TensorAddress, value: f64) -> TensorResult<()> {
        check_rank(&self.tensor_type, &address)?;
        for (position, dimension) in self.tensor_type.dimensions().iter().enumerate() {
            if dimension.is_indexed() {
                let index = checked_coordinate(&self.tensor_type, &address, position)?;
                self.extents[position] = self.extents[position].max(index + 1);
            }
        }
        self.cells.push((address, value));
        Ok(())
    }

    pub fn build(self) -> TensorResult<MixedTensor> {
        let dimensions = self
            .tensor_type
            .dimensions()
            .iter()
            .zip(&self.extents)
            .map(|(d, &extent)| match d.size() {
                None if d.is_indexed() => Dimension::indexed(d.name(), extent as u64),
                _ => d.clone(),
            });
        let bound_type = TensorType::new(self.tensor_type.value_type(), dimensions)?;
        log::debug!(
            "derived {} for mixed tensor of {} from {} cells",
            bound_type,
            self.tensor_type,
            self.cells.len()
        );
        let layout = Layout::of(&bound_type)?;
        let mut builder = BoundBuilder::new(bound_type, layout, Some(self.cells.len()));
        for (address, value) in &self.cells {
            builder.cell(address, *value)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(spec: &str) -> TensorType {
        spec.parse().unwrap()
    }

    fn address(labels: &[&str]) -> TensorAddress {
        TensorAddress::of_labels(labels.iter().copied())
    }

    #[test]
    fn test_subspaces_are_contiguous_in_insertion_order() {
        let mut builder = MixedTensor::builder(t("tensor(key{},x[3])"));
        builder.cell(address(&["b", "2"]), 3.0).unwrap();
        builder.cell(address(&["a", "0"]), 1.0).unwrap();
        builder.cell(address(&["b", "0"]), 2.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.size(), 6);
        let order: Vec<_> = tensor.sparse_addresses().cloned().collect();
        assert_eq!(order, vec![address(&["b"]), address(&["a"])]);

        let b = tensor.dense_subspace(&address(&["b"])).unwrap();
        assert_eq!(
            b.iter().map(Cell::value).collect::<Vec<_>>(),
            vec![2.0, 0.0, 3.0]
        );
        assert_eq!(b[2].address(), &address(&["b", "2"]));
        assert!(tensor.dense_subspace(&address(&["c"])).is_none());
    }

    #[test]
    fn test_get_checks_identity_and_bounds() {
        let mut builder = MixedTensor::builder(t("tensor(key{},x[2])"));
        builder.cell(address(&["a", "1"]), 5.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.get(&address(&["a", "1"])), 5.0);
        assert_eq!(tensor.get(&address(&["a", "0"])), 0.0);
        assert!(tensor.has(&address(&["a", "0"])));
        assert_eq!(tensor.get(&address(&["a", "2"])), 0.0);
        assert!(!tensor.has(&address(&["a", "2"])));
        assert_eq!(tensor.get(&address(&["a", "x"])), 0.0);
        assert_eq!(tensor.get(&address(&["a"])), 0.0);
    }

    #[test]
    fn test_get_reads_non_canonical_indexed_labels() {
        let mut builder = MixedTensor::builder(t("tensor(key{},x[2])"));
        builder.cell(address(&["a", "1"]), 5.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.get(&address(&["a", "01"])), 5.0);
        assert!(tensor.has(&address(&["a", "01"])));
        assert_eq!(tensor.get(&address(&["01", "1"])), 0.0);

        let dense: crate::Tensor = "tensor(x[2]):[0,5]".parse().unwrap();
        assert_eq!(dense.get(&address(&["01"])), tensor.get(&address(&["a", "01"])));
    }

    #[test]
    fn test_dimension_order_is_respected() {
        // the mapped dimension sorts after the indexed one
        let mut builder = MixedTensor::builder(t("tensor(a[2],z{})"));
        builder.cell(address(&["1", "k"]), 4.0).unwrap();
        let tensor = builder.build().unwrap();
        assert_eq!(tensor.get(&address(&["1", "k"])), 4.0);
        assert_eq!(tensor.get(&address(&["0", "k"])), 0.0);
        assert_eq!(tensor.index().sparse_type(), &t("tensor(z{})"));
    }

    #[test]
    fn test_unbound_builder_derives_bound_type() {
        let mut builder = MixedTensor::builder(t("tensor(key{},x[],y[2])"));
        assert!(matches!(builder, MixedBuilder::Unbound(_)));
        builder.cell(address(&["a", "2", "1"]), 1.0).unwrap();
        builder.cell(address(&["b", "0", "0"]), 2.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.tensor_type(), &t("tensor(key{},x[3],y[2])"));
        assert_eq!(tensor.dense_subspace_size(), 6);
        assert_eq!(tensor.size(), 12);
        assert_eq!(tensor.get(&address(&["a", "2", "1"])), 1.0);
        assert_eq!(tensor.get(&address(&["b", "0", "0"])), 2.0);
    }

    #[test]
    fn test_builder_rejects_bad_addresses() {
        let mut builder = MixedTensor::builder(t("tensor(key{},x[2])"));
        assert!(matches!(
            builder.cell(address(&["a", "2"]), 1.0),
            Err(TensorError::LabelOutOfRange { .. })
        ));
        assert!(matches!(
            builder.cell(address(&["a", "b"]), 1.0),
            Err(TensorError::NonNumericLabel { .. })
        ));
        assert!(matches!(
            builder.cell(address(&["a"]), 1.0),
            Err(TensorError::RankMismatch { .. })
        ));
    }
}
