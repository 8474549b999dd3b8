//! Primitive tensor operations
//!
//! Every operation computes its result type with
//! [`type_resolver`](mixten_core::type_resolver) first, then produces cells
//! through a [`TensorBuilder`] for that type. Non-fatal type warnings
//! (reducing or renaming an absent dimension) go to `log::warn!`.
//!
//! # Examples
//!
//! ```
//! use mixten_tensor::{Aggregator, Tensor};
//!
//! let a: Tensor = "tensor(x[2],y[2]):[[1,2],[3,4]]".parse().unwrap();
//! let sums = a.reduce(Aggregator::Sum, &["y"]).unwrap();
//! assert_eq!(sums, "tensor(x[2]):[3,7]".parse().unwrap());
//!
//! let b: Tensor = "tensor(y[2]):[10,100]".parse().unwrap();
//! let product = a.multiply(&b).unwrap();
//! assert_eq!(product, "tensor(x[2],y[2]):[[10,200],[30,400]]".parse().unwrap());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use mixten_core::{
    type_resolver, Label, TensorAddress, TensorError, TensorResult, TensorType, ValueType,
};

use crate::cell::Cell;
use crate::hints::TensorHints;
use crate::indexed::IndexedTensor;
use crate::tensor::{Tensor, TensorBuilder};
use crate::values::CellValues;

/// How [`Tensor::reduce`] combines the values of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregator {
    Avg,
    Count,
    Max,
    Median,
    Min,
    Prod,
    Sum,
}

impl Aggregator {
    /// Aggregate `values`, which may be reordered.
    ///
    /// Over no values: sum and count are `0`, prod is `1`, max is `-inf`,
    /// min is `+inf`, and avg and median are NaN.
    pub fn aggregate(&self, values: &mut [f64]) -> f64 {
        match self {
            Aggregator::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Aggregator::Count => values.len() as f64,
            Aggregator::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregator::Prod => values.iter().product(),
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Median => median(values),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Aggregator::Avg => "avg",
            Aggregator::Count => "count",
            Aggregator::Max => "max",
            Aggregator::Median => "median",
            Aggregator::Min => "min",
            Aggregator::Prod => "prod",
            Aggregator::Sum => "sum",
        }
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregator {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(Aggregator::Avg),
            "count" => Ok(Aggregator::Count),
            "max" => Ok(Aggregator::Max),
            "median" => Ok(Aggregator::Median),
            "min" => Ok(Aggregator::Min),
            "prod" => Ok(Aggregator::Prod),
            "sum" => Ok(Aggregator::Sum),
            other => Err(TensorError::invalid(format!("Unknown aggregator '{}'", other))),
        }
    }
}

/// Where a result dimension takes its label from in a join
#[derive(Debug, Clone, Copy)]
enum Side {
    Left(usize),
    Right(usize),
}

/// Where a result dimension takes its label from in a concat
#[derive(Debug)]
enum ConcatSource {
    /// The concat dimension, at this position in the operand if present
    Concat(Option<usize>),
    Operand(usize),
    /// Absent in the operand: every label the other operand has
    Broadcast(Vec<Label>),
}

impl Tensor {
    /// Apply `f` to every cell
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        self.map_cells(type_resolver::map(self.tensor_type()), f)
    }

    fn map_cells(&self, result_type: TensorType, f: impl Fn(f64) -> f64) -> Tensor {
        match self {
            Tensor::Indexed(dense) => {
                let values = CellValues::from_doubles(
                    result_type.value_type(),
                    dense.values().map(&f).collect(),
                );
                Tensor::Indexed(IndexedTensor::from_parts(
                    result_type,
                    dense.dimension_sizes().clone(),
                    values,
                ))
            }
            Tensor::Mapped(sparse) => Tensor::Mapped(sparse.map_values(result_type, f)),
            Tensor::Mixed(mixed) => Tensor::Mixed(mixed.map_values(result_type, f)),
        }
    }

    /// Aggregate away `dimensions`; no dimensions reduces to a scalar.
    ///
    /// Dimensions the tensor does not have are logged and ignored.
    pub fn reduce(&self, aggregator: Aggregator, dimensions: &[&str]) -> TensorResult<Tensor> {
        let result_type = type_resolver::reduce(self.tensor_type(), dimensions).logged();
        let kept = positions_in(self.tensor_type(), &result_type)?;

        let mut groups: HashMap<TensorAddress, Vec<f64>> = HashMap::new();
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            groups
                .entry(cell.address().project(&kept))
                .or_default()
                .push(cell.value());
        }
        if result_type.rank() == 0 && groups.is_empty() {
            groups.insert(TensorAddress::empty(), Vec::new());
        }

        let hints = TensorHints::default().with_expected_cells(groups.len());
        let mut builder = TensorBuilder::with_hints(result_type, &hints);
        for (address, mut values) in groups {
            builder.cell(address, aggregator.aggregate(&mut values))?;
        }
        builder.build()
    }

    /// Sum over `dimensions`
    pub fn sum(&self, dimensions: &[&str]) -> TensorResult<Tensor> {
        self.reduce(Aggregator::Sum, dimensions)
    }

    /// Combine every pair of cells agreeing on the shared dimensions.
    ///
    /// # Errors
    ///
    /// Fails if the types cannot be joined.
    pub fn join(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> TensorResult<Tensor> {
        let lhs = self.tensor_type();
        let rhs = other.tensor_type();
        let result_type = type_resolver::join(lhs, rhs)?;

        let mut lhs_common = Vec::new();
        let mut rhs_common = Vec::new();
        for (i, name) in lhs.dimension_names().enumerate() {
            if let Some(j) = rhs.index_of(name) {
                lhs_common.push(i);
                rhs_common.push(j);
            }
        }
        let sides = result_type
            .dimension_names()
            .map(|name| match (lhs.index_of(name), rhs.index_of(name)) {
                (Some(i), _) => Ok(Side::Left(i)),
                (None, Some(j)) => Ok(Side::Right(j)),
                (None, None) => Err(TensorError::unknown_dimension(name, lhs)),
            })
            .collect::<TensorResult<Vec<_>>>()?;

        let mut matches: HashMap<TensorAddress, Vec<Cell>> = HashMap::new();
        let mut cursor = other.cursor();
        while let Some(cell) = cursor.next() {
            matches
                .entry(cell.address().project(&rhs_common))
                .or_default()
                .push(cell.detach());
        }

        let mut builder = TensorBuilder::new(result_type);
        let mut cursor = self.cursor();
        while let Some(left) = cursor.next() {
            let Some(rights) = matches.get(&left.address().project(&lhs_common)) else {
                continue;
            };
            for right in rights {
                let labels = sides.iter().map(|side| match *side {
                    Side::Left(i) => left.address().label_at(i),
                    Side::Right(j) => right.address().label_at(j),
                });
                builder.cell(
                    TensorAddress::of_labels(labels),
                    f(left.value(), right.value()),
                )?;
            }
        }
        builder.build()
    }

    /// Cell-wise sum over the shared dimensions
    pub fn add(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.join(other, |a, b| a + b)
    }

    /// Cell-wise product over the shared dimensions
    pub fn multiply(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.join(other, |a, b| a * b)
    }

    /// Union of the cells of two tensors with the same dimension names,
    /// combining with `f` where both have a cell.
    ///
    /// # Errors
    ///
    /// Fails if the dimension names differ or the types cannot be joined.
    pub fn merge(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> TensorResult<Tensor> {
        let result_type = type_resolver::merge(self.tensor_type(), other.tensor_type())?;
        let mut builder = TensorBuilder::new(result_type);
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            let value = if other.has(cell.address()) {
                f(cell.value(), other.get(cell.address()))
            } else {
                cell.value()
            };
            builder.cell(cell.address().clone(), value)?;
        }
        let mut cursor = other.cursor();
        while let Some(cell) = cursor.next() {
            if !self.has(cell.address()) {
                builder.cell(cell.address().clone(), cell.value())?;
            }
        }
        builder.build()
    }

    /// Rename dimensions `from[i]` to `to[i]`.
    ///
    /// Source names the tensor does not have are logged and skipped.
    pub fn rename(&self, from: &[&str], to: &[&str]) -> TensorResult<Tensor> {
        let input = self.tensor_type();
        let result_type = type_resolver::rename(input, from, to)?.logged();

        let new_names: Vec<&str> = input
            .dimension_names()
            .map(|name| {
                from.iter()
                    .position(|&old| old == name)
                    .map_or(name, |i| to[i])
            })
            .collect();
        let sources = result_type
            .dimension_names()
            .map(|name| {
                new_names
                    .iter()
                    .position(|&n| n == name)
                    .ok_or_else(|| TensorError::unknown_dimension(name, input))
            })
            .collect::<TensorResult<Vec<_>>>()?;

        let mut builder = TensorBuilder::new(result_type);
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            builder.cell(cell.address().project(&sources), cell.value())?;
        }
        builder.build()
    }

    /// Concatenate along the indexed dimension `dimension`.
    ///
    /// An operand without `dimension` counts as size 1 along it. Labels of
    /// `other` along it are shifted by this tensor's size along it. An
    /// operand without another result dimension is repeated for every label
    /// the other operand has along it. Cells outside a bound result
    /// dimension are dropped.
    ///
    /// # Errors
    ///
    /// Fails if `dimension` is mapped in either operand, or the other
    /// dimensions cannot be combined.
    pub fn concat(&self, other: &Tensor, dimension: &str) -> TensorResult<Tensor> {
        let result_type =
            type_resolver::concat(self.tensor_type(), other.tensor_type(), dimension)?;
        let offset = self.extent_along(dimension)?;
        log::trace!(
            "concat of {} and {} along '{}' at offset {}",
            self.tensor_type(),
            other.tensor_type(),
            dimension,
            offset
        );
        let mut builder = TensorBuilder::new(result_type.clone());
        self.concat_into(&mut builder, &result_type, other, dimension, 0)?;
        other.concat_into(&mut builder, &result_type, self, dimension, offset)?;
        builder.build()
    }

    /// Size along the indexed `dimension`, 1 if absent
    fn extent_along(&self, dimension: &str) -> TensorResult<u64> {
        let Some(position) = self.tensor_type().index_of(dimension) else {
            return Ok(1);
        };
        if let Tensor::Indexed(dense) = self {
            return Ok(dense.dimension_sizes().size(position) as u64);
        }
        if let Some(size) = self.tensor_type().dimensions()[position].size() {
            return Ok(size);
        }
        let mut extent = 0;
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            extent = extent.max(cell.address().numeric_label(position)? + 1);
        }
        Ok(extent)
    }

    fn concat_into(
        &self,
        builder: &mut TensorBuilder,
        result_type: &TensorType,
        other: &Tensor,
        dimension: &str,
        offset: u64,
    ) -> TensorResult<()> {
        let own_type = self.tensor_type();
        let sources: Vec<ConcatSource> = result_type
            .dimension_names()
            .map(|name| {
                if name == dimension {
                    ConcatSource::Concat(own_type.index_of(name))
                } else if let Some(i) = own_type.index_of(name) {
                    ConcatSource::Operand(i)
                } else {
                    ConcatSource::Broadcast(other.distinct_labels(name))
                }
            })
            .collect();

        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            let mut addresses: Vec<Vec<Label>> = vec![Vec::with_capacity(sources.len())];
            for source in &sources {
                match source {
                    ConcatSource::Concat(position) => {
                        let index = match position {
                            Some(i) => cell.address().numeric_label(*i)?,
                            None => 0,
                        };
                        let label = Label::Numeric(index + offset);
                        addresses.iter_mut().for_each(|a| a.push(label.clone()));
                    }
                    ConcatSource::Operand(i) => {
                        let label = cell.address().label_at(*i);
                        addresses.iter_mut().for_each(|a| a.push(label.clone()));
                    }
                    ConcatSource::Broadcast(labels) => {
                        addresses = addresses
                            .into_iter()
                            .flat_map(|a| {
                                labels.iter().map(move |label| {
                                    let mut a = a.clone();
                                    a.push(label.clone());
                                    a
                                })
                            })
                            .collect();
                    }
                }
            }
            for labels in addresses {
                if fits_bounds(result_type, &labels) {
                    builder.cell(TensorAddress::of_labels(labels), cell.value())?;
                }
            }
        }
        Ok(())
    }

    fn distinct_labels(&self, dimension: &str) -> Vec<Label> {
        let Some(position) = self.tensor_type().index_of(dimension) else {
            return Vec::new();
        };
        let mut labels = BTreeSet::new();
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            labels.insert(cell.address().label_at(position));
        }
        labels.into_iter().collect()
    }

    /// Convert every cell to `value_type`.
    ///
    /// # Errors
    ///
    /// A scalar can only be cast to `double`.
    pub fn cell_cast(&self, value_type: ValueType) -> TensorResult<Tensor> {
        let result_type = type_resolver::cell_cast(self.tensor_type(), value_type)?;
        if let Tensor::Indexed(dense) = self {
            return Ok(Tensor::Indexed(IndexedTensor::from_parts(
                result_type,
                dense.dimension_sizes().clone(),
                dense.cell_values().cast(value_type),
            )));
        }
        Ok(self.map_cells(result_type, |v| v))
    }

    /// The subspace at the given labels of some dimensions.
    ///
    /// Fixing every dimension gives the scalar holding that cell's value,
    /// read with [`Tensor::get`].
    ///
    /// # Errors
    ///
    /// Fails if no dimension is given or a dimension is unknown.
    pub fn peek(&self, address: &[(&str, Label)]) -> TensorResult<Tensor> {
        let input = self.tensor_type();
        let names: Vec<&str> = address.iter().map(|(name, _)| *name).collect();
        let result_type = type_resolver::peek(input, &names)?;
        let fixed = address
            .iter()
            .map(|(name, label)| {
                input
                    .index_of(name)
                    .map(|i| (i, label))
                    .ok_or_else(|| TensorError::unknown_dimension(name, input))
            })
            .collect::<TensorResult<Vec<_>>>()?;

        if result_type.rank() == 0 {
            let mut labels = vec![Label::Numeric(0); input.rank()];
            for &(i, label) in &fixed {
                labels[i] = label.clone();
            }
            return Ok(Tensor::scalar(self.get(&TensorAddress::of_labels(labels))));
        }

        let kept = positions_in(input, &result_type)?;
        let mut builder = TensorBuilder::new(result_type);
        let mut cursor = self.cursor();
        while let Some(cell) = cursor.next() {
            let matching = fixed
                .iter()
                .all(|&(i, label)| cell.address().label(i) == label.as_str());
            if matching {
                builder.cell(cell.address().project(&kept), cell.value())?;
            }
        }
        builder.build()
    }
}

/// Positions in `input` of the dimensions of `result`
fn positions_in(input: &TensorType, result: &TensorType) -> TensorResult<Vec<usize>> {
    result
        .dimension_names()
        .map(|name| {
            input
                .index_of(name)
                .ok_or_else(|| TensorError::unknown_dimension(name, input))
        })
        .collect()
}

fn fits_bounds(tensor_type: &TensorType, labels: &[Label]) -> bool {
    tensor_type
        .dimensions()
        .iter()
        .zip(labels)
        .all(|(dimension, label)| match (dimension.size(), label.as_numeric()) {
            (Some(size), Some(index)) => index < size,
            _ => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(literal: &str) -> Tensor {
        literal.parse().unwrap()
    }

    #[test]
    fn test_aggregators() {
        let mut values = [3.0, 1.0, 2.0, 6.0];
        assert_eq!(Aggregator::Sum.aggregate(&mut values), 12.0);
        assert_eq!(Aggregator::Avg.aggregate(&mut values), 3.0);
        assert_eq!(Aggregator::Count.aggregate(&mut values), 4.0);
        assert_eq!(Aggregator::Max.aggregate(&mut values), 6.0);
        assert_eq!(Aggregator::Min.aggregate(&mut values), 1.0);
        assert_eq!(Aggregator::Prod.aggregate(&mut values), 36.0);
        assert_eq!(Aggregator::Median.aggregate(&mut values), 2.5);
        assert_eq!(Aggregator::Median.aggregate(&mut [5.0, 1.0, 3.0]), 3.0);

        assert_eq!(Aggregator::Sum.aggregate(&mut []), 0.0);
        assert_eq!(Aggregator::Prod.aggregate(&mut []), 1.0);
        assert!(Aggregator::Avg.aggregate(&mut []).is_nan());
        assert!(Aggregator::Median.aggregate(&mut [1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_aggregator_names() {
        for aggregator in [
            Aggregator::Avg,
            Aggregator::Count,
            Aggregator::Max,
            Aggregator::Median,
            Aggregator::Min,
            Aggregator::Prod,
            Aggregator::Sum,
        ] {
            assert_eq!(aggregator.to_string().parse::<Aggregator>(), Ok(aggregator));
        }
        assert!("mean".parse::<Aggregator>().is_err());
    }

    #[test]
    fn test_map() {
        let squared = tensor("tensor(x[3]):[1,2,3]").map(|v| v * v);
        assert_eq!(squared, tensor("tensor(x[3]):[1,4,9]"));

        let sparse = tensor("tensor(key{}):{a:1,b:-2}").map(f64::abs);
        assert_eq!(sparse, tensor("tensor(key{}):{a:1,b:2}"));

        let mixed = tensor("tensor(key{},x[2]):{a:[1,2]}").map(|v| v + 1.0);
        assert_eq!(mixed, tensor("tensor(key{},x[2]):{a:[2,3]}"));
    }

    #[test]
    fn test_reduce() {
        let t = tensor("tensor(x[2],y[3]):[[1,2,3],[4,5,6]]");
        assert_eq!(t.sum(&["x"]).unwrap(), tensor("tensor(y[3]):[5,7,9]"));
        assert_eq!(
            t.reduce(Aggregator::Max, &["y"]).unwrap(),
            tensor("tensor(x[2]):[3,6]")
        );
        assert_eq!(t.sum(&[]).unwrap().as_double(), Ok(21.0));
        assert_eq!(t.sum(&["x", "y"]).unwrap().as_double(), Ok(21.0));
    }

    #[test]
    fn test_reduce_of_absent_dimension_is_ignored() {
        let t = tensor("tensor(x[2]):[1,2]");
        assert_eq!(t.sum(&["z"]).unwrap(), t);
    }

    #[test]
    fn test_reduce_empty_to_scalar() {
        let empty = tensor("tensor(key{}):{}");
        assert_eq!(empty.sum(&[]).unwrap().as_double(), Ok(0.0));
        assert_eq!(empty.reduce(Aggregator::Count, &[]).unwrap().as_double(), Ok(0.0));
    }

    #[test]
    fn test_reduce_mixed_to_sparse() {
        let t = tensor("tensor(key{},x[2]):{a:[1,2],b:[3,4]}");
        assert_eq!(t.sum(&["x"]).unwrap(), tensor("tensor(key{}):{a:3,b:7}"));
        assert_eq!(t.sum(&["key"]).unwrap(), tensor("tensor(x[2]):[4,6]"));
    }

    #[test]
    fn test_join_over_shared_dimension() {
        let a = tensor("tensor(key{}):{a:2,b:3,c:4}");
        let b = tensor("tensor(key{}):{a:10,c:100}");
        assert_eq!(a.multiply(&b).unwrap(), tensor("tensor(key{}):{a:20,c:400}"));
    }

    #[test]
    fn test_join_without_shared_dimensions_is_outer_product() {
        let x = tensor("tensor(x[2]):[1,2]");
        let y = tensor("tensor(y[2]):[10,20]");
        assert_eq!(
            x.multiply(&y).unwrap(),
            tensor("tensor(x[2],y[2]):[[10,20],[20,40]]")
        );
        assert_eq!(x.add(&Tensor::scalar(1.0)).unwrap(), tensor("tensor(x[2]):[2,3]"));
    }

    #[test]
    fn test_join_mapped_with_indexed() {
        let sparse = tensor("tensor(x{}):{0:1,5:2}");
        let dense = tensor("tensor(x[2]):[10,20]");
        let joined = sparse.multiply(&dense).unwrap();
        assert_eq!(joined.tensor_type().to_string(), "tensor(x{})");
        assert_eq!(joined, tensor("tensor(x{}):{0:10}"));
    }

    #[test]
    fn test_join_incompatible() {
        let a = tensor("tensor(x[2]):[1,2]");
        let b = tensor("tensor(x[3]):[1,2,3]");
        assert!(matches!(
            a.add(&b),
            Err(TensorError::IncompatibleTypes { .. })
        ));
    }

    #[test]
    fn test_merge() {
        let a = tensor("tensor(key{}):{a:1,b:2}");
        let b = tensor("tensor(key{}):{b:10,c:20}");
        let merged = a.merge(&b, |x, y| x + y).unwrap();
        assert_eq!(merged, tensor("tensor(key{}):{a:1,b:12,c:20}"));
        assert!(a.merge(&tensor("tensor(other{}):{}"), |x, _| x).is_err());
    }

    #[test]
    fn test_rename() {
        let t = tensor("tensor(a[2],b[3]):[[1,2,3],[4,5,6]]");
        let swapped = t.rename(&["a", "b"], &["b", "a"]).unwrap();
        assert_eq!(swapped, tensor("tensor(a[3],b[2]):[[1,4],[2,5],[3,6]]"));

        let renamed = t.rename(&["a", "missing"], &["z", "y"]).unwrap();
        assert_eq!(renamed.tensor_type().to_string(), "tensor(b[3],z[2])");
        assert_eq!(renamed.get(&TensorAddress::of_numeric(&[2, 1])), 6.0);

        assert!(t.rename(&["a"], &["b"]).is_err());
        assert!(t.rename(&["a"], &[]).is_err());
    }

    #[test]
    fn test_concat() {
        let a = tensor("tensor(x[2]):[1,2]");
        let b = tensor("tensor(x[3]):[3,4,5]");
        assert_eq!(a.concat(&b, "x").unwrap(), tensor("tensor(x[5]):[1,2,3,4,5]"));
    }

    #[test]
    fn test_concat_operand_without_dimension() {
        let a = tensor("tensor(x[2]):[1,2]");
        let s = Tensor::scalar(9.0);
        assert_eq!(a.concat(&s, "x").unwrap(), tensor("tensor(x[3]):[1,2,9]"));
        assert_eq!(s.concat(&a, "x").unwrap(), tensor("tensor(x[3]):[9,1,2]"));
    }

    #[test]
    fn test_concat_new_dimension_broadcasts() {
        let a = tensor("tensor(x[2]):[1,2]");
        let b = tensor("tensor(y[2]):[3,4]");
        let c = a.concat(&b, "z").unwrap();
        assert_eq!(c.tensor_type().to_string(), "tensor(x[2],y[2],z[2])");
        assert_eq!(c.get(&TensorAddress::of_numeric(&[1, 0, 0])), 2.0);
        assert_eq!(c.get(&TensorAddress::of_numeric(&[1, 1, 0])), 2.0);
        assert_eq!(c.get(&TensorAddress::of_numeric(&[0, 1, 1])), 4.0);
        assert_eq!(c.get(&TensorAddress::of_numeric(&[1, 1, 1])), 4.0);
    }

    #[test]
    fn test_concat_drops_cells_beyond_smaller_bound() {
        let a = tensor("tensor(x[2],y[2]):[[1,2],[3,4]]");
        let b = tensor("tensor(x[1],y[3]):[[5,6,7]]");
        let c = a.concat(&b, "x").unwrap();
        assert_eq!(c, tensor("tensor(x[3],y[2]):[[1,2],[3,4],[5,6]]"));
    }

    #[test]
    fn test_concat_mapped_dimension_fails() {
        let a = tensor("tensor(x{}):{a:1}");
        assert!(a.concat(&a, "x").is_err());
    }

    #[test]
    fn test_cell_cast() {
        let t = tensor("tensor(x[2]):[0.1,2]");
        let float = t.cell_cast(ValueType::Float).unwrap();
        assert_eq!(float.tensor_type().value_type(), ValueType::Float);
        assert_eq!(float.get(&TensorAddress::of_numeric(&[0])), 0.1f32 as f64);

        let sparse = tensor("tensor(k{}):{a:0.1}")
            .cell_cast(ValueType::Float)
            .unwrap();
        assert_eq!(sparse.get(&TensorAddress::of_labels(["a"])), 0.1f32 as f64);

        assert!(Tensor::scalar(1.0).cell_cast(ValueType::Float).is_err());
    }

    #[test]
    fn test_peek() {
        let t = tensor("tensor(key{},x[2]):{a:[1,2],b:[3,4]}");
        let b = t.peek(&[("key", Label::from("b"))]).unwrap();
        assert_eq!(b, tensor("tensor(x[2]):[3,4]"));

        let x1 = t.peek(&[("x", Label::from(1u64))]).unwrap();
        assert_eq!(x1, tensor("tensor(key{}):{a:2,b:4}"));

        let cell = t
            .peek(&[("x", Label::from(0u64)), ("key", Label::from("a"))])
            .unwrap();
        assert_eq!(cell.as_double(), Ok(1.0));
    }

    #[test]
    fn test_peek_requires_known_dimensions() {
        let t = tensor("tensor(x[2]):[1,2]");
        assert!(t.peek(&[("y", Label::from(0u64))]).is_err());
        assert!(t.peek(&[]).is_err());
        let outside = t.peek(&[("x", Label::from(5u64))]).unwrap();
        assert!(outside.as_double().unwrap().is_nan());
    }
}
