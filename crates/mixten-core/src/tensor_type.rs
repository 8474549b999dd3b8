//! Tensor types: named dimensions plus a cell value type
//!
//! A [`TensorType`] is an ordered-by-name set of [`Dimension`]s and one
//! [`ValueType`]. Dimensions are either
//!
//! - **indexed bound** (`x[3]`): dense, integer labels in `0..size`
//! - **indexed unbound** (`x[]`): dense, size known only once data exists
//! - **mapped** (`x{}`): sparse, string labels, never sized
//!
//! Construction order is irrelevant: dimensions are sorted by name and type
//! equality is structural. A type with no dimensions is the scalar type and is
//! always `double`.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{TensorType, ValueType};
//!
//! let t: TensorType = "tensor<float>(y{},x[3])".parse().unwrap();
//! assert_eq!(t.rank(), 2);
//! assert_eq!(t.value_type(), ValueType::Float);
//! assert_eq!(t.to_string(), "tensor<float>(x[3],y{})");
//! assert_eq!(t.mapped_subtype().to_string(), "tensor<float>(y{})");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{TensorError, TensorResult};
use crate::value_type::ValueType;

/// Largest size an indexed bound dimension may declare
pub const MAX_DIMENSION_SIZE: u64 = i32::MAX as u64;

/// The kind of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DimensionKind {
    /// Dense dimension with a declared size
    IndexedBound(u64),
    /// Dense dimension whose size comes from the data
    IndexedUnbound,
    /// Sparse dimension with string labels
    Mapped,
}

/// One named dimension of a tensor type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
}

impl Dimension {
    /// An indexed dimension of a fixed size
    pub fn indexed(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::IndexedBound(size),
        }
    }

    /// An indexed dimension whose size is given by the data
    pub fn indexed_unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::IndexedUnbound,
        }
    }

    /// A mapped (sparse) dimension
    pub fn mapped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Mapped,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// The declared size, present only for indexed bound dimensions
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            DimensionKind::IndexedBound(size) => Some(size),
            _ => None,
        }
    }

    pub fn is_indexed(&self) -> bool {
        !self.is_mapped()
    }

    pub fn is_mapped(&self) -> bool {
        self.kind == DimensionKind::Mapped
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.kind, DimensionKind::IndexedBound(_))
    }

    /// A copy of this dimension under another name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: self.kind,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DimensionKind::IndexedBound(size) => write!(f, "{}[{}]", self.name, size),
            DimensionKind::IndexedUnbound => write!(f, "{}[]", self.name),
            DimensionKind::Mapped => write!(f, "{}{{}}", self.name),
        }
    }
}

/// Whether `name` is a legal dimension name (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_valid_dimension_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The type of a tensor.
///
/// See the [module documentation](self) for the type grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct TensorType {
    value_type: ValueType,
    dimensions: Vec<Dimension>,
}

impl TensorType {
    /// The scalar type: no dimensions, `double` cells
    pub fn empty() -> Self {
        Self {
            value_type: ValueType::Double,
            dimensions: Vec::new(),
        }
    }

    /// Create a type from a value type and dimensions in any order
    ///
    /// # Errors
    ///
    /// Fails on duplicate or invalid dimension names, or bound sizes above
    /// [`MAX_DIMENSION_SIZE`].
    pub fn new(
        value_type: ValueType,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> TensorResult<Self> {
        let mut dimensions: Vec<Dimension> = dimensions.into_iter().collect();
        for dimension in &dimensions {
            if !is_valid_dimension_name(&dimension.name) {
                return Err(TensorError::invalid(format!(
                    "'{}' is not a valid dimension name",
                    dimension.name
                )));
            }
            if let Some(size) = dimension.size() {
                if size > MAX_DIMENSION_SIZE {
                    return Err(TensorError::invalid(format!(
                        "Size {} of dimension '{}' exceeds {}",
                        size, dimension.name, MAX_DIMENSION_SIZE
                    )));
                }
            }
        }
        dimensions.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = dimensions.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(TensorError::DuplicateDimension(pair[0].name.clone()));
        }
        Ok(Self::from_sorted(value_type, dimensions))
    }

    /// Invariant: `dimensions` are valid, sorted and unique
    pub(crate) fn from_sorted(value_type: ValueType, dimensions: Vec<Dimension>) -> Self {
        let value_type = if dimensions.is_empty() {
            ValueType::Double
        } else {
            value_type
        };
        Self {
            value_type,
            dimensions,
        }
    }

    /// Start building a type with `double` cells
    pub fn builder() -> TensorTypeBuilder {
        TensorTypeBuilder::new(ValueType::Double)
    }

    /// Parse a type spec such as `tensor<float>(x[3],y{})`
    pub fn from_spec(spec: &str) -> TensorResult<Self> {
        crate::type_parser::parse(spec)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Dimensions sorted by name
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.index_of(name).map(|i| &self.dimensions[i])
    }

    /// Position of the named dimension
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.dimensions
            .binary_search_by(|d| d.name.as_str().cmp(name))
            .ok()
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    pub fn has_mapped_dimensions(&self) -> bool {
        self.dimensions.iter().any(Dimension::is_mapped)
    }

    pub fn has_indexed_dimensions(&self) -> bool {
        self.dimensions.iter().any(Dimension::is_indexed)
    }

    /// True if every dimension is indexed and bound (also true for the scalar type)
    pub fn has_only_indexed_bound_dimensions(&self) -> bool {
        self.dimensions.iter().all(Dimension::is_bound)
    }

    /// The sub-type of only the mapped dimensions (scalar if there are none)
    pub fn mapped_subtype(&self) -> TensorType {
        self.filtered(Dimension::is_mapped)
    }

    /// The sub-type of only the indexed dimensions (scalar if there are none)
    pub fn indexed_subtype(&self) -> TensorType {
        self.filtered(Dimension::is_indexed)
    }

    fn filtered(&self, keep: impl Fn(&Dimension) -> bool) -> TensorType {
        let dimensions = self.dimensions.iter().filter(|d| keep(d)).cloned().collect();
        Self::from_sorted(self.value_type, dimensions)
    }

    /// This type with another cell value type (the scalar type stays `double`)
    pub fn with_value_type(&self, value_type: ValueType) -> TensorType {
        Self::from_sorted(value_type, self.dimensions.clone())
    }

    /// Whether a tensor of this type can be assigned to `other` unchanged
    pub fn is_assignable_to(&self, other: &TensorType) -> bool {
        self.is_convertible_or_assignable_to(other, false, true)
    }

    /// Whether a tensor of this type can be zero-padded into `other`
    pub fn is_convertible_to(&self, other: &TensorType) -> bool {
        self.is_convertible_or_assignable_to(other, true, true)
    }

    /// Whether this type is assignable to `other` after renaming dimensions
    pub fn is_renamable_to(&self, other: &TensorType) -> bool {
        self.is_convertible_or_assignable_to(other, false, false)
    }

    fn is_convertible_or_assignable_to(
        &self,
        generalization: &TensorType,
        convertible: bool,
        consider_name: bool,
    ) -> bool {
        if !generalization
            .value_type
            .is_equal_or_larger_than(self.value_type)
        {
            return false;
        }
        if generalization.rank() != self.rank() {
            return false;
        }
        for (this, general) in self.dimensions.iter().zip(&generalization.dimensions) {
            if this.is_indexed() != general.is_indexed() {
                return false;
            }
            if consider_name && this.name != general.name {
                return false;
            }
            if let Some(general_size) = general.size() {
                let Some(this_size) = this.size() else {
                    return false;
                };
                if convertible {
                    if this_size > general_size {
                        return false;
                    }
                } else if this_size != general_size {
                    return false;
                }
            }
        }
        true
    }

    /// The most specific type both this and `other` are assignable to,
    /// compared position by position.
    ///
    /// Returns `None` when names differ at a position, when an indexed and a
    /// mapped dimension meet, or when two bound sizes differ.
    pub fn dimensionwise_generalization_with(&self, other: &TensorType) -> Option<TensorType> {
        if self == other {
            return Some(self.clone());
        }
        if self.rank() != other.rank() {
            return None;
        }
        let mut dimensions = Vec::with_capacity(self.rank());
        for (this, that) in self.dimensions.iter().zip(&other.dimensions) {
            if this.name != that.name {
                return None;
            }
            match (this.kind, that.kind) {
                (DimensionKind::IndexedBound(a), DimensionKind::IndexedBound(b)) => {
                    if a != b {
                        return None;
                    }
                    dimensions.push(this.clone());
                }
                (DimensionKind::IndexedBound(_), DimensionKind::IndexedUnbound) => {
                    dimensions.push(that.clone())
                }
                (DimensionKind::IndexedUnbound, DimensionKind::IndexedBound(_))
                | (DimensionKind::IndexedUnbound, DimensionKind::IndexedUnbound)
                | (DimensionKind::Mapped, DimensionKind::Mapped) => dimensions.push(this.clone()),
                _ => return None,
            }
        }
        Some(Self::from_sorted(
            ValueType::largest_of(self.value_type, other.value_type),
            dimensions,
        ))
    }

    /// Same dimension names and kinds (indexed/mapped), ignoring sizes and value type
    pub fn mathematically_equals(&self, other: &TensorType) -> bool {
        self.rank() == other.rank()
            && self
                .dimensions
                .iter()
                .zip(&other.dimensions)
                .all(|(a, b)| a.name == b.name && a.is_indexed() == b.is_indexed())
    }
}

impl Default for TensorType {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tensor")?;
        if self.value_type != ValueType::Double {
            write!(f, "<{}>", self.value_type)?;
        }
        f.write_str("(")?;
        for (i, dimension) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", dimension)?;
        }
        f.write_str(")")
    }
}

impl FromStr for TensorType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_spec(s)
    }
}

impl TryFrom<String> for TensorType {
    type Error = TensorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_spec(&value)
    }
}

impl From<TensorType> for String {
    fn from(value: TensorType) -> Self {
        value.to_string()
    }
}

/// Builder for [`TensorType`]
///
/// ```
/// use mixten_core::{TensorType, ValueType};
///
/// let t = TensorType::builder()
///     .value_type(ValueType::Float)
///     .indexed("x", 3)
///     .mapped("key")
///     .build()
///     .unwrap();
/// assert_eq!(t.to_string(), "tensor<float>(key{},x[3])");
/// ```
#[derive(Debug, Clone)]
pub struct TensorTypeBuilder {
    value_type: ValueType,
    dimensions: Vec<Dimension>,
}

impl TensorTypeBuilder {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            dimensions: Vec::new(),
        }
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn indexed(mut self, name: impl Into<String>, size: u64) -> Self {
        self.dimensions.push(Dimension::indexed(name, size));
        self
    }

    pub fn indexed_unbound(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::indexed_unbound(name));
        self
    }

    pub fn mapped(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::mapped(name));
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn build(self) -> TensorResult<TensorType> {
        TensorType::new(self.value_type, self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(spec: &str) -> TensorType {
        spec.parse().unwrap()
    }

    #[test]
    fn test_construction_order_is_irrelevant() {
        assert_eq!(t("tensor(y{},x[2])"), t("tensor(x[2],y{})"));
        assert_eq!(t("tensor(y{},x[2])").dimensions()[0].name(), "x");
    }

    #[test]
    fn test_duplicate_dimension_rejected() {
        let err = TensorType::builder().mapped("x").indexed("x", 2).build();
        assert_eq!(err, Err(TensorError::DuplicateDimension("x".to_string())));
    }

    #[test]
    fn test_scalar_is_always_double() {
        let scalar = TensorType::new(ValueType::Float, vec![]).unwrap();
        assert_eq!(scalar.value_type(), ValueType::Double);
        assert_eq!(scalar.to_string(), "tensor()");
    }

    #[test]
    fn test_subtypes() {
        let mixed = t("tensor<float>(a{},b[2],c{},d[])");
        assert_eq!(mixed.mapped_subtype(), t("tensor<float>(a{},c{})"));
        assert_eq!(mixed.indexed_subtype(), t("tensor<float>(b[2],d[])"));
        assert_eq!(t("tensor(x[2])").mapped_subtype(), TensorType::empty());
    }

    #[test]
    fn test_assignable() {
        assert!(t("tensor(x[3])").is_assignable_to(&t("tensor(x[3])")));
        assert!(t("tensor(x[3])").is_assignable_to(&t("tensor(x[])")));
        assert!(!t("tensor(x[])").is_assignable_to(&t("tensor(x[3])")));
        assert!(!t("tensor(x[2])").is_assignable_to(&t("tensor(x[3])")));
        assert!(t("tensor<float>(x[3])").is_assignable_to(&t("tensor(x[3])")));
        assert!(!t("tensor(x[3])").is_assignable_to(&t("tensor<float>(x[3])")));
        assert!(!t("tensor(x{})").is_assignable_to(&t("tensor(x[])")));
        assert!(!t("tensor(x[3])").is_assignable_to(&t("tensor(y[3])")));
    }

    #[test]
    fn test_convertible() {
        assert!(t("tensor(x[2])").is_convertible_to(&t("tensor(x[3])")));
        assert!(!t("tensor(x[4])").is_convertible_to(&t("tensor(x[3])")));
        assert!(!t("tensor(x[])").is_convertible_to(&t("tensor(x[3])")));
    }

    #[test]
    fn test_renamable() {
        assert!(t("tensor(x[3],y{})").is_renamable_to(&t("tensor(a[3],b{})")));
        assert!(!t("tensor(x[3],y{})").is_renamable_to(&t("tensor(a{},b[3])")));
    }

    #[test]
    fn test_dimensionwise_generalization() {
        assert_eq!(
            t("tensor(x[3],y{})").dimensionwise_generalization_with(&t("tensor(x[],y{})")),
            Some(t("tensor(x[],y{})"))
        );
        assert_eq!(
            t("tensor<float>(x[3])").dimensionwise_generalization_with(&t("tensor(x[3])")),
            Some(t("tensor(x[3])"))
        );
        assert_eq!(
            t("tensor(x[3])").dimensionwise_generalization_with(&t("tensor(x[4])")),
            None
        );
        assert_eq!(
            t("tensor(x[3])").dimensionwise_generalization_with(&t("tensor(x{})")),
            None
        );
        assert_eq!(
            t("tensor(x[3])").dimensionwise_generalization_with(&t("tensor(y[3])")),
            None
        );
    }

    #[test]
    fn test_mathematically_equals_ignores_sizes() {
        assert!(t("tensor(x[3],y{})").mathematically_equals(&t("tensor<float>(x[],y{})")));
        assert!(!t("tensor(x[3])").mathematically_equals(&t("tensor(x{})")));
    }

    #[test]
    fn test_invalid_name() {
        assert!(TensorType::builder().mapped("1x").build().is_err());
        assert!(TensorType::builder().mapped("").build().is_err());
    }
}
