//! Dense tensors over indexed dimensions
//!
//! An [`IndexedTensor`] stores one value per coordinate of its
//! [`DimensionSizes`] in a flat row-major array of `f64` or `f32`, chosen by
//! the type's value type. The declared type may have unbound dimensions; the
//! sizes always resolve them.
//!
//! Missing values follow the dense convention: [`IndexedTensor::get`] returns
//! NaN for an address outside the sizes, while the coordinate accessor
//! [`IndexedTensor::get_at`] fails.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{TensorAddress, TensorType};
//! use mixten_tensor::IndexedTensor;
//!
//! let t: TensorType = "tensor(x[2],y[3])".parse().unwrap();
//! let mut builder = IndexedTensor::builder(t).unwrap();
//! builder.cell_at(&[1, 2], 5.0).unwrap();
//! let tensor = builder.build().unwrap();
//!
//! assert_eq!(tensor.get(&TensorAddress::of_numeric(&[1, 2])), 5.0);
//! assert_eq!(tensor.get(&TensorAddress::of_numeric(&[0, 0])), 0.0);
//! assert!(tensor.get(&TensorAddress::of_numeric(&[2, 0])).is_nan());
//! assert!(tensor.get_at(&[2, 0]).is_err());
//! ```

use smallvec::SmallVec;

use mixten_core::{
    DimensionSizes, Indexes, TensorAddress, TensorError, TensorResult, TensorType,
    MAX_DIMENSION_SIZE,
};

use crate::cell::{CellCursor, CellView, Cells};
use crate::values::{CellValues, Values};

pub(crate) type Positions = SmallVec<[usize; 6]>;

/// A dense tensor
#[derive(Debug, Clone)]
pub struct IndexedTensor {
    tensor_type: TensorType,
    sizes: DimensionSizes,
    values: CellValues,
}

impl IndexedTensor {
    /// A builder for `tensor_type`: bound if every dimension is bound,
    /// otherwise unbound with sizes inferred from the cells.
    ///
    /// # Errors
    ///
    /// Fails if the type has a mapped dimension.
    pub fn builder(tensor_type: TensorType) -> TensorResult<IndexedBuilder> {
        require_indexed(&tensor_type)?;
        Ok(IndexedBuilder::new(tensor_type, None))
    }

    /// A builder with all sizes known up front
    ///
    /// # Errors
    ///
    /// Fails if `sizes` do not fit the indexed dimensions of `tensor_type`.
    pub fn bound_builder(
        tensor_type: TensorType,
        sizes: DimensionSizes,
    ) -> TensorResult<BoundBuilder> {
        if !sizes.fits(&tensor_type) {
            return Err(TensorError::invalid(format!(
                "Sizes {:?} do not fit {}",
                sizes.as_slice(),
                tensor_type
            )));
        }
        Ok(BoundBuilder::new(tensor_type, sizes))
    }

    /// A builder inferring unbound sizes from the largest label per dimension
    ///
    /// # Errors
    ///
    /// Fails if the type has a mapped dimension.
    pub fn unbound_builder(tensor_type: TensorType) -> TensorResult<UnboundBuilder> {
        require_indexed(&tensor_type)?;
        Ok(UnboundBuilder::new(tensor_type, None))
    }

    /// A tensor from values in canonical order
    ///
    /// # Errors
    ///
    /// Fails if the sizes do not fit the type or the value count differs
    /// from the total size.
    pub fn from_values(
        tensor_type: TensorType,
        sizes: DimensionSizes,
        values: Vec<f64>,
    ) -> TensorResult<Self> {
        if !sizes.fits(&tensor_type) {
            return Err(TensorError::invalid(format!(
                "Sizes {:?} do not fit {}",
                sizes.as_slice(),
                tensor_type
            )));
        }
        if values.len() != sizes.total_size() {
            return Err(TensorError::invalid(format!(
                "Expected {} values but got {}",
                sizes.total_size(),
                values.len()
            )));
        }
        let values = CellValues::from_doubles(tensor_type.value_type(), values);
        Ok(Self::from_parts(tensor_type, sizes, values))
    }

    /// Invariant: `sizes` fit the type and `values` has the total size
    pub(crate) fn from_parts(
        tensor_type: TensorType,
        sizes: DimensionSizes,
        values: CellValues,
    ) -> Self {
        Self {
            tensor_type,
            sizes,
            values,
        }
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    pub fn dimension_sizes(&self) -> &DimensionSizes {
        &self.sizes
    }

    /// Number of cells
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// All values in canonical order
    pub fn values(&self) -> Values<'_> {
        self.values.iter()
    }

    pub fn cell_values(&self) -> &CellValues {
        &self.values
    }

    /// The value at `address`, or NaN if it lies outside this tensor
    pub fn get(&self, address: &TensorAddress) -> f64 {
        self.value_index(address)
            .and_then(|i| self.values.get(i))
            .unwrap_or(f64::NAN)
    }

    /// Whether `address` lies inside this tensor
    pub fn has(&self, address: &TensorAddress) -> bool {
        self.value_index(address).is_some()
    }

    /// The value at dense coordinates
    ///
    /// # Errors
    ///
    /// Fails on wrong arity or any coordinate out of bounds.
    pub fn get_at(&self, indexes: &[usize]) -> TensorResult<f64> {
        let i = self.sizes.checked_value_index(indexes)?;
        self.value_at(i)
    }

    /// The value at a flat offset in canonical order
    ///
    /// # Errors
    ///
    /// Fails if `index >= self.size()`.
    pub fn value_at(&self, index: usize) -> TensorResult<f64> {
        self.values
            .get(index)
            .ok_or_else(|| TensorError::index_out_of_bounds(&[index], &[self.values.len()]))
    }

    fn value_index(&self, address: &TensorAddress) -> Option<usize> {
        if address.size() != self.sizes.rank() {
            return None;
        }
        let mut index = 0usize;
        for i in 0..self.sizes.rank() {
            let label = usize::try_from(address.numeric_label(i).ok()?).ok()?;
            let size = self.sizes.size(i);
            if label >= size {
                return None;
            }
            index = index * size + label;
        }
        Some(index)
    }

    pub fn cursor(&self) -> IndexedCursor<'_> {
        IndexedCursor {
            tensor: self,
            indexes: Indexes::all(&self.sizes),
            address: TensorAddress::empty(),
        }
    }

    pub fn cells(&self) -> Cells<'_> {
        Cells::new(CellCursor::Indexed(self.cursor()))
    }

    /// Iterate the subspaces spanned by `dimensions`.
    ///
    /// Yields one `(address, subspace)` pair per position of the remaining
    /// dimensions, in canonical order. The address holds the labels of the
    /// remaining dimensions; the subspace is a tensor over `dimensions` only.
    ///
    /// # Errors
    ///
    /// Fails if a name is unknown or repeated.
    ///
    /// ```
    /// use mixten_core::TensorAddress;
    /// use mixten_tensor::Tensor;
    ///
    /// let t: Tensor = "tensor(x[2],y[3]):[[1,2,3],[4,5,6]]".parse().unwrap();
    /// let rows: Vec<_> = t.as_indexed().unwrap().subspaces(&["y"]).unwrap().collect();
    /// assert_eq!(rows.len(), 2);
    /// assert_eq!(rows[1].0, TensorAddress::of_numeric(&[1]));
    /// assert_eq!(rows[1].1.values().collect::<Vec<_>>(), vec![4.0, 5.0, 6.0]);
    /// ```
    pub fn subspaces(&self, dimensions: &[&str]) -> TensorResult<Subspaces<'_>> {
        let mut sub_positions = Positions::new();
        for name in dimensions {
            let position = self
                .tensor_type
                .index_of(name)
                .ok_or_else(|| TensorError::unknown_dimension(name, &self.tensor_type))?;
            if sub_positions.contains(&position) {
                return Err(TensorError::DuplicateDimension(name.to_string()));
            }
            sub_positions.push(position);
        }
        sub_positions.sort_unstable();
        let rank = self.sizes.rank();
        let super_positions: Positions = (0..rank).filter(|p| !sub_positions.contains(p)).collect();

        let sub_type = TensorType::new(
            self.tensor_type.value_type(),
            sub_positions
                .iter()
                .map(|&p| self.tensor_type.dimensions()[p].clone()),
        )?;
        let sub_sizes: Positions = sub_positions.iter().map(|&p| self.sizes.size(p)).collect();

        // last dimension fastest
        let super_iterate: Positions = super_positions.iter().rev().copied().collect();
        let origin: Positions = SmallVec::from_elem(0, rank);
        // subspace dimensions are held at 0, which must be in range even when empty
        let held: Positions = (0..rank)
            .map(|p| if sub_positions.contains(&p) { 1 } else { self.sizes.size(p) })
            .collect();
        let held = DimensionSizes::of(&held);
        let superspace = Indexes::of(&held, &held, &super_iterate, &origin)?;

        Ok(Subspaces {
            tensor: self,
            superspace,
            super_positions,
            sub_iterate: sub_positions.iter().rev().copied().collect(),
            sub_type,
            sub_sizes: DimensionSizes::of(&sub_sizes),
        })
    }
}

fn require_indexed(tensor_type: &TensorType) -> TensorResult<()> {
    if tensor_type.has_mapped_dimensions() {
        return Err(TensorError::invalid(format!(
            "An indexed tensor cannot have mapped dimensions: {}",
            tensor_type
        )));
    }
    Ok(())
}

/// The dense coordinate of `address` at `position`, validated against the
/// type's bound (or against [`MAX_DIMENSION_SIZE`] for unbound dimensions).
pub(crate) fn checked_coordinate(
    tensor_type: &TensorType,
    address: &TensorAddress,
    position: usize,
) -> TensorResult<usize> {
    let dimension = &tensor_type.dimensions()[position];
    let label = address.numeric_label(position)?;
    let limit = dimension.size().unwrap_or(MAX_DIMENSION_SIZE);
    if label >= limit {
        return Err(TensorError::LabelOutOfRange {
            dimension: dimension.name().to_string(),
            label,
            size: limit,
        });
    }
    usize::try_from(label).map_err(|_| TensorError::invalid(format!("Label {} is too large", label)))
}

pub(crate) fn check_rank(tensor_type: &TensorType, address: &TensorAddress) -> TensorResult<()> {
    if address.size() != tensor_type.rank() {
        return Err(TensorError::RankMismatch {
            expected: tensor_type.rank(),
            got: address.size(),
        });
    }
    Ok(())
}

/// Lending cursor over an [`IndexedTensor`] in canonical order
#[derive(Debug)]
pub struct IndexedCursor<'a> {
    tensor: &'a IndexedTensor,
    indexes: Indexes,
    address: TensorAddress,
}

impl IndexedCursor<'_> {
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CellView<'_>> {
        if !self.indexes.next() {
            return None;
        }
        self.address = TensorAddress::of_indexes(self.indexes.indexes());
        let value = self
            .tensor
            .values
            .get(self.indexes.source_value_index())
            .unwrap_or(f64::NAN);
        Some(CellView::new(&self.address, value))
    }
}

/// Iterator over the subspaces of an [`IndexedTensor`]
#[derive(Debug)]
pub struct Subspaces<'a> {
    tensor: &'a IndexedTensor,
    superspace: Indexes,
    super_positions: Positions,
    sub_iterate: Positions,
    sub_type: TensorType,
    sub_sizes: DimensionSizes,
}

impl Iterator for Subspaces<'_> {
    type Item = (TensorAddress, IndexedTensor);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.superspace.next() {
            return None;
        }
        let origin = self.superspace.indexes();
        let super_indexes: Positions = self.super_positions.iter().map(|&p| origin[p]).collect();
        let sizes = &self.tensor.sizes;
        let mut subspace = Indexes::of(sizes, sizes, &self.sub_iterate, origin).ok()?;
        let mut values = Vec::with_capacity(subspace.size());
        while subspace.next() {
            values.push(
                self.tensor
                    .values
                    .get(subspace.source_value_index())
                    .unwrap_or(f64::NAN),
            );
        }
        let values = CellValues::from_doubles(self.sub_type.value_type(), values);
        Some((
            TensorAddress::of_indexes(&super_indexes),
            IndexedTensor::from_parts(self.sub_type.clone(), self.sub_sizes.clone(), values),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.superspace.remaining();
        (remaining, Some(remaining))
    }
}

/// Builder for an [`IndexedTensor`], bound or unbound
#[derive(Debug)]
pub enum IndexedBuilder {
    Bound(BoundBuilder),
    Unbound(UnboundBuilder),
}

impl IndexedBuilder {
    /// Invariant: `tensor_type` has no mapped dimensions
    pub(crate) fn new(tensor_type: TensorType, capacity: Option<usize>) -> Self {
        if tensor_type.has_only_indexed_bound_dimensions() {
            match DimensionSizes::from_type(&tensor_type) {
                Ok(sizes) => return IndexedBuilder::Bound(BoundBuilder::new(tensor_type, sizes)),
                Err(e) => log::debug!("falling back to unbound building: {}", e),
            }
        }
        IndexedBuilder::Unbound(UnboundBuilder::new(tensor_type, capacity))
    }

    pub fn tensor_type(&self) -> &TensorType {
        match self {
            IndexedBuilder::Bound(b) => &b.tensor_type,
            IndexedBuilder::Unbound(b) => &b.tensor_type,
        }
    }

    pub fn cell(&mut self, address: &TensorAddress, value: f64) -> TensorResult<()> {
        match self {
            IndexedBuilder::Bound(b) => b.cell(address, value),
            IndexedBuilder::Unbound(b) => b.cell(address, value),
        }
    }

    pub fn cell_at(&mut self, indexes: &[usize], value: f64) -> TensorResult<()> {
        match self {
            IndexedBuilder::Bound(b) => b.cell_at(indexes, value),
            IndexedBuilder::Unbound(b) => b.cell(&TensorAddress::of_indexes(indexes), value),
        }
    }

    /// # Errors
    ///
    /// Unbound building fails if the inferred sizes overflow.
    pub fn build(self) -> TensorResult<IndexedTensor> {
        match self {
            IndexedBuilder::Bound(b) => Ok(b.build()),
            IndexedBuilder::Unbound(b) => b.build(),
        }
    }
}

/// Builds into storage allocated once from known sizes.
///
/// Cells never assigned are zero.
#[derive(Debug)]
pub struct BoundBuilder {
    tensor_type: TensorType,
    sizes: DimensionSizes,
    values: CellValues,
}

impl BoundBuilder {
    fn new(tensor_type: TensorType, sizes: DimensionSizes) -> Self {
        let values = CellValues::zeros(tensor_type.value_type(), sizes.total_size());
        Self {
            tensor_type,
            sizes,
            values,
        }
    }

    pub fn cell(&mut self, address: &TensorAddress, value: f64) -> TensorResult<()> {
        check_rank(&self.tensor_type, address)?;
        let mut indexes = Positions::with_capacity(address.size());
        for i in 0..address.size() {
            let label = address.numeric_label(i)?;
            let size = self.sizes.size(i);
            match usize::try_from(label) {
                Ok(index) if index < size => indexes.push(index),
                _ => {
                    return Err(TensorError::LabelOutOfRange {
                        dimension: self.tensor_type.dimensions()[i].name().to_string(),
                        label,
                        size: size as u64,
                    })
                }
            }
        }
        self.cell_at(&indexes, value)
    }

    pub fn cell_at(&mut self, indexes: &[usize], value: f64) -> TensorResult<()> {
        let i = self.sizes.checked_value_index(indexes)?;
        self.values.set(i, value);
        Ok(())
    }

    pub fn build(self) -> IndexedTensor {
        IndexedTensor::from_parts(self.tensor_type, self.sizes, self.values)
    }
}

/// Collects cells first and sizes unbound dimensions by the largest label
/// seen in each.
#[derive(Debug)]
pub struct UnboundBuilder {
    tensor_type: TensorType,
    extents: Positions,
    cells: Vec<(Positions, f64)>,
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

    pub fn cell(&mut self, address: &TensorAddress, value: f64) -> TensorResult<()> {
        check_rank(&self.tensor_type, address)?;
        let mut indexes = Positions::with_capacity(address.size());
        for i in 0..address.size() {
            let index = checked_coordinate(&self.tensor_type, address, i)?;
            self.extents[i] = self.extents[i].max(index + 1);
            indexes.push(index);
        }
        self.cells.push((indexes, value));
        Ok(())
    }

    pub fn build(self) -> TensorResult<IndexedTensor> {
        let sizes = DimensionSizes::of(&self.extents);
        let total = self
            .extents
            .iter()
            .try_fold(1usize, |acc, &s| acc.checked_mul(s))
            .ok_or_else(|| {
                TensorError::invalid(format!("Sizes {:?} are too large", self.extents.as_slice()))
            })?;
        log::debug!(
            "inferred sizes {:?} for {} from {} cells",
            sizes.as_slice(),
            self.tensor_type,
            self.cells.len()
        );
        let mut values = CellValues::zeros(self.tensor_type.value_type(), total);
        for (indexes, value) in &self.cells {
            values.set(sizes.to_value_index(indexes), *value);
        }
        Ok(IndexedTensor::from_parts(self.tensor_type, sizes, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixten_core::ValueType;

    fn t(spec: &str) -> TensorType {
        spec.parse().unwrap()
    }

    #[test]
    fn test_get_is_soft_get_at_is_strict() {
        let mut builder = IndexedTensor::builder(t("tensor(x[2])")).unwrap();
        builder.cell_at(&[0], 1.0).unwrap();
        builder.cell_at(&[1], 2.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.get(&TensorAddress::of_numeric(&[1])), 2.0);
        assert!(tensor.get(&TensorAddress::of_numeric(&[2])).is_nan());
        assert!(tensor.get(&TensorAddress::of_labels(["a"])).is_nan());
        assert!(tensor.get(&TensorAddress::of_numeric(&[0, 0])).is_nan());
        assert!(matches!(
            tensor.get_at(&[2]),
            Err(TensorError::IndexOutOfBounds { .. })
        ));
        assert!(tensor.get_at(&[0, 0]).is_err());
        assert_eq!(tensor.get_at(&[1]), Ok(2.0));
    }

    #[test]
    fn test_bound_builder_rejects_out_of_range() {
        let mut builder = IndexedTensor::builder(t("tensor(x[2])")).unwrap();
        assert!(matches!(
            builder.cell(&TensorAddress::of_numeric(&[2]), 1.0),
            Err(TensorError::LabelOutOfRange { .. })
        ));
        assert!(matches!(
            builder.cell(&TensorAddress::of_numeric(&[0, 1]), 1.0),
            Err(TensorError::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_unbound_builder_infers_sizes() {
        let mut builder = IndexedTensor::builder(t("tensor(x[],y[2])")).unwrap();
        assert!(matches!(builder, IndexedBuilder::Unbound(_)));
        builder.cell_at(&[3, 1], 7.0).unwrap();
        builder.cell_at(&[1, 0], 2.0).unwrap();
        let tensor = builder.build().unwrap();

        assert_eq!(tensor.dimension_sizes(), &DimensionSizes::of(&[4, 2]));
        assert_eq!(tensor.tensor_type(), &t("tensor(x[],y[2])"));
        assert_eq!(tensor.size(), 8);
        assert_eq!(tensor.get_at(&[3, 1]), Ok(7.0));
        assert_eq!(tensor.get_at(&[0, 0]), Ok(0.0));
    }

    #[test]
    fn test_unbound_builder_keeps_bound_limits() {
        let mut builder = IndexedTensor::unbound_builder(t("tensor(x[],y[2])")).unwrap();
        assert!(builder.cell(&TensorAddress::of_numeric(&[0, 2]), 1.0).is_err());
    }

    #[test]
    fn test_float_storage() {
        let tensor = IndexedTensor::from_values(
            t("tensor<float>(x[2])"),
            DimensionSizes::of(&[2]),
            vec![0.1, 0.5],
        )
        .unwrap();
        assert_eq!(tensor.cell_values().value_type(), ValueType::Float);
        assert_eq!(tensor.value_at(0), Ok(f64::from(0.1f32)));
        assert!(tensor.value_at(2).is_err());
    }

    #[test]
    fn test_cursor_visits_canonical_order() {
        let tensor = IndexedTensor::from_values(
            t("tensor(x[2],y[2])"),
            DimensionSizes::of(&[2, 2]),
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let mut cursor = tensor.cursor();
        let mut seen = Vec::new();
        while let Some(cell) = cursor.next() {
            seen.push((cell.address().clone(), cell.value()));
        }
        assert_eq!(
            seen,
            vec![
                (TensorAddress::of_numeric(&[0, 0]), 1.0),
                (TensorAddress::of_numeric(&[0, 1]), 2.0),
                (TensorAddress::of_numeric(&[1, 0]), 3.0),
                (TensorAddress::of_numeric(&[1, 1]), 4.0),
            ]
        );
        assert_eq!(tensor.cells().count(), 4);
    }

    #[test]
    fn test_subspaces_over_leading_dimension() {
        let tensor = IndexedTensor::from_values(
            t("tensor(x[2],y[3])"),
            DimensionSizes::of(&[2, 3]),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        let columns: Vec<_> = tensor.subspaces(&["x"]).unwrap().collect();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].0, TensorAddress::of_numeric(&[2]));
        assert_eq!(columns[2].1.tensor_type(), &t("tensor(x[2])"));
        assert_eq!(columns[2].1.values().collect::<Vec<_>>(), vec![3.0, 6.0]);

        let whole: Vec<_> = tensor.subspaces(&["x", "y"]).unwrap().collect();
        assert_eq!(whole.len(), 1);
        assert!(whole[0].0.is_empty());
        assert_eq!(whole[0].1.size(), 6);

        assert!(tensor.subspaces(&["z"]).is_err());
        assert!(tensor.subspaces(&["x", "x"]).is_err());
    }

    #[test]
    fn test_subspaces_of_empty_dimension() {
        let tensor =
            IndexedTensor::from_values(t("tensor(x[2],y[])"), DimensionSizes::of(&[2, 0]), vec![])
                .unwrap();
        let rows: Vec<_> = tensor.subspaces(&["y"]).unwrap().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(_, row)| row.size() == 0));
    }

    #[test]
    fn test_mapped_type_rejected() {
        assert!(IndexedTensor::builder(t("tensor(x{})")).is_err());
        assert!(IndexedTensor::bound_builder(t("tensor(x[2])"), DimensionSizes::of(&[3])).is_err());
    }
}
