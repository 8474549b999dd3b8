//! Result types of the primitive tensor operations
//!
//! Pure functions from operand types to the output type, computed without
//! touching any cell data. Computed (non-identity) results never have a cell
//! type below `float`; see [`ValueType::map`].
//!
//! # Examples
//!
//! ```
//! use mixten_core::{type_resolver, TensorType};
//!
//! let t = |s: &str| s.parse::<TensorType>().unwrap();
//!
//! assert_eq!(type_resolver::join(&t("tensor(x[3])"), &t("tensor(x[])")).unwrap(), t("tensor(x[])"));
//! assert!(type_resolver::join(&t("tensor(x[3])"), &t("tensor(x[5])")).is_err());
//! assert_eq!(type_resolver::concat(&t("tensor(x[3])"), &t("tensor(x[4])"), "x").unwrap(), t("tensor(x[7])"));
//! assert_eq!(type_resolver::reduce(&t("tensor(x[3])"), &["x"]).into_value(), TensorType::empty());
//! ```

use std::collections::BTreeMap;

use crate::diagnostics::{Resolved, TypeWarning};
use crate::error::{TensorError, TensorResult};
use crate::tensor_type::{
    is_valid_dimension_name, Dimension, DimensionKind, TensorType, MAX_DIMENSION_SIZE,
};
use crate::value_type::ValueType;

/// Type of applying a function to every cell
pub fn map(input: &TensorType) -> TensorType {
    input.with_value_type(input.value_type().map())
}

/// Type of reducing away `dimensions`.
///
/// An empty list reduces over all dimensions. Names not present in `input`
/// are reported as warnings and otherwise ignored.
pub fn reduce<S: AsRef<str>>(input: &TensorType, dimensions: &[S]) -> Resolved<TensorType> {
    if dimensions.is_empty() {
        return Resolved::new(TensorType::empty());
    }
    let mut remaining: Vec<Dimension> = input.dimensions().to_vec();
    let mut warnings = Vec::new();
    for name in dimensions {
        let name = name.as_ref();
        match remaining.iter().position(|d| d.name() == name) {
            Some(i) => {
                remaining.remove(i);
            }
            None => warnings.push(TypeWarning::ReduceMissingDimension {
                dimension: name.to_string(),
                tensor_type: input.to_string(),
            }),
        }
    }
    let reduced = if remaining.is_empty() {
        TensorType::empty()
    } else {
        TensorType::from_sorted(input.value_type().map(), remaining)
    };
    Resolved::with_warnings(reduced, warnings)
}

/// Type of looking up a sub-tensor by fixing `dimensions`.
///
/// # Errors
///
/// Fails if `dimensions` is empty or names a dimension not in `input`.
pub fn peek<S: AsRef<str>>(input: &TensorType, dimensions: &[S]) -> TensorResult<TensorType> {
    if dimensions.is_empty() {
        return Err(TensorError::invalid("peeking no dimensions makes no sense"));
    }
    let mut remaining: Vec<Dimension> = input.dimensions().to_vec();
    for name in dimensions {
        let name = name.as_ref();
        let i = remaining
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| TensorError::unknown_dimension(name, input))?;
        remaining.remove(i);
    }
    if remaining.is_empty() {
        return Ok(TensorType::empty());
    }
    Ok(TensorType::from_sorted(input.value_type(), remaining))
}

/// Type of renaming `from[i]` to `to[i]`.
///
/// Source names not in `input` are reported as warnings and skipped.
///
/// # Errors
///
/// Fails if the lists are empty or of different lengths, if a new name is
/// invalid, or if the renaming would merge two dimensions into one.
pub fn rename<S: AsRef<str>, T: AsRef<str>>(
    input: &TensorType,
    from: &[S],
    to: &[T],
) -> TensorResult<Resolved<TensorType>> {
    if from.len() != to.len() {
        return Err(TensorError::invalid(format!(
            "Bad rename, from size {} != to size {}",
            from.len(),
            to.len()
        )));
    }
    if from.is_empty() {
        return Err(TensorError::invalid("Bad rename, no dimensions given"));
    }

    let mut old: BTreeMap<&str, &Dimension> =
        input.dimensions().iter().map(|d| (d.name(), d)).collect();
    let mut renamed: BTreeMap<String, Dimension> = BTreeMap::new();
    let mut warnings = Vec::new();
    for (old_name, new_name) in from.iter().zip(to) {
        let (old_name, new_name) = (old_name.as_ref(), new_name.as_ref());
        match old.remove(old_name) {
            Some(dimension) => {
                renamed.insert(new_name.to_string(), dimension.with_name(new_name));
            }
            None => warnings.push(TypeWarning::RenameMissingDimension {
                dimension: old_name.to_string(),
                tensor_type: input.to_string(),
            }),
        }
    }
    for (name, dimension) in old {
        renamed.insert(name.to_string(), dimension.clone());
    }
    if renamed.len() != input.rank() {
        return Err(TensorError::invalid(format!(
            "Bad rename of {}, lost some dimensions",
            input
        )));
    }
    let renamed = TensorType::new(input.value_type(), renamed.into_values())?;
    Ok(Resolved::with_warnings(renamed, warnings))
}

/// Type of joining two tensors over their shared dimensions.
///
/// # Errors
///
/// Fails if a shared indexed dimension has two different bound sizes.
pub fn join(lhs: &TensorType, rhs: &TensorType) -> TensorResult<TensorType> {
    let value_type = joined_value_type(lhs, rhs);
    let mut dimensions: BTreeMap<&str, Dimension> =
        lhs.dimensions().iter().map(|d| (d.name(), d.clone())).collect();
    for dimension in rhs.dimensions() {
        let combined = match dimensions.get(dimension.name()) {
            None => dimension.clone(),
            Some(existing) => join_dimension(existing, dimension)?,
        };
        dimensions.insert(dimension.name(), combined);
    }
    Ok(TensorType::from_sorted(
        value_type,
        dimensions.into_values().collect(),
    ))
}

fn joined_value_type(lhs: &TensorType, rhs: &TensorType) -> ValueType {
    match (lhs.rank() > 0, rhs.rank() > 0) {
        (true, true) => ValueType::largest_of(lhs.value_type(), rhs.value_type()).map(),
        (true, false) => lhs.value_type().map(),
        (false, true) => rhs.value_type().map(),
        (false, false) => ValueType::Double,
    }
}

fn join_dimension(a: &Dimension, b: &Dimension) -> TensorResult<Dimension> {
    if a == b {
        return Ok(a.clone());
    }
    if a.is_mapped() || b.is_mapped() {
        return Ok(Dimension::mapped(a.name()));
    }
    match (a.kind(), b.kind()) {
        (DimensionKind::IndexedBound(_), DimensionKind::IndexedBound(_)) => Err(
            TensorError::incompatible("join", format!("unequal dimension sizes {} vs {}", a, b)),
        ),
        _ => Ok(Dimension::indexed_unbound(a.name())),
    }
}

/// Type of merging two tensors: a join over identically named dimensions.
///
/// # Errors
///
/// Fails unless both types have the same dimension names in the same order,
/// or if the join of the two fails.
pub fn merge(lhs: &TensorType, rhs: &TensorType) -> TensorResult<TensorType> {
    let same_names =
        lhs.rank() == rhs.rank() && lhs.dimension_names().eq(rhs.dimension_names());
    if !same_names {
        return Err(TensorError::incompatible(
            "merge",
            format!("dimensions mismatch: {} != {}", lhs, rhs),
        ));
    }
    join(lhs, rhs).map_err(|e| match e {
        TensorError::IncompatibleTypes { reason, .. } => TensorError::incompatible("merge", reason),
        other => other,
    })
}

/// Type of concatenating two tensors along `dimension`.
///
/// An operand without `dimension` counts as size 1 along it.
///
/// # Errors
///
/// Fails if `dimension` is mapped in either operand, or if another shared
/// dimension cannot be combined (indexed against mapped).
pub fn concat(lhs: &TensorType, rhs: &TensorType, dimension: &str) -> TensorResult<TensorType> {
    if !is_valid_dimension_name(dimension) {
        return Err(TensorError::invalid(format!(
            "'{}' is not a valid dimension name",
            dimension
        )));
    }
    let value_type = match (lhs.rank() > 0, rhs.rank() > 0) {
        (true, true) if lhs.value_type() == rhs.value_type() => lhs.value_type(),
        (true, true) => ValueType::largest_of(lhs.value_type(), rhs.value_type()).map(),
        (true, false) => lhs.value_type(),
        (false, true) => rhs.value_type(),
        (false, false) => ValueType::Double,
    };

    let lhs_size = concat_operand_size(lhs, dimension)?;
    let rhs_size = concat_operand_size(rhs, dimension)?;
    let concat_dimension = match (lhs_size, rhs_size) {
        (Some(a), Some(b)) => {
            let size = a + b;
            if size > MAX_DIMENSION_SIZE {
                return Err(TensorError::incompatible(
                    "concat",
                    format!("size {} of dimension '{}' is too large", size, dimension),
                ));
            }
            Dimension::indexed(dimension, size)
        }
        _ => Dimension::indexed_unbound(dimension),
    };

    let mut dimensions: BTreeMap<&str, Dimension> = lhs
        .dimensions()
        .iter()
        .filter(|d| d.name() != dimension)
        .map(|d| (d.name(), d.clone()))
        .collect();
    for other in rhs.dimensions().iter().filter(|d| d.name() != dimension) {
        let combined = match dimensions.get(other.name()) {
            None => other.clone(),
            Some(existing) => concat_dimension_pair(existing, other)?,
        };
        dimensions.insert(other.name(), combined);
    }
    dimensions.insert(dimension, concat_dimension);

    Ok(TensorType::from_sorted(
        value_type,
        dimensions.into_values().collect(),
    ))
}

fn concat_operand_size(operand: &TensorType, dimension: &str) -> TensorResult<Option<u64>> {
    match operand.dimension(dimension) {
        None => Ok(Some(1)),
        Some(d) if d.is_mapped() => Err(TensorError::incompatible(
            "concat",
            format!("dimension '{}' is mapped in {}", dimension, operand),
        )),
        Some(d) => Ok(d.size()),
    }
}

fn concat_dimension_pair(a: &Dimension, b: &Dimension) -> TensorResult<Dimension> {
    if a == b {
        return Ok(a.clone());
    }
    match (a.kind(), b.kind()) {
        (DimensionKind::IndexedBound(x), DimensionKind::IndexedBound(y)) => {
            Ok(Dimension::indexed(a.name(), x.min(y)))
        }
        (DimensionKind::IndexedUnbound, DimensionKind::IndexedBound(_))
        | (DimensionKind::IndexedBound(_), DimensionKind::IndexedUnbound) => {
            Ok(Dimension::indexed_unbound(a.name()))
        }
        _ => Err(TensorError::incompatible(
            "concat",
            format!("incompatible dimensions {} and {}", a, b),
        )),
    }
}

/// Type of casting every cell to `value_type`.
///
/// # Errors
///
/// A scalar type can only be cast to `double`.
pub fn cell_cast(input: &TensorType, value_type: ValueType) -> TensorResult<TensorType> {
    if value_type != ValueType::Double && input.rank() == 0 {
        return Err(TensorError::invalid(format!(
            "Cannot cast {} to value type {}",
            input, value_type
        )));
    }
    Ok(input.with_value_type(value_type))
}
