//! Cell addresses
//!
//! A [`TensorAddress`] is an ordered tuple of labels, one per dimension of the
//! type it is interpreted against. The address itself holds no dimension
//! names. Two storage strategies sit behind one contract:
//!
//! - **numeric**: all labels are integers (dense addresses, no allocation for
//!   ranks up to 6)
//! - **text**: all labels are kept as strings (sparse and mixed addresses)
//!
//! Equality, hashing and ordering are element-wise over the string form of
//! each label, so the two strategies are interchangeable.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{TensorAddress, TensorType};
//!
//! let numeric = TensorAddress::of_numeric(&[1, 2]);
//! let text = TensorAddress::of_labels(["1", "2"]);
//! assert_eq!(numeric, text);
//!
//! let t: TensorType = "tensor(key{},x[3])".parse().unwrap();
//! let address = TensorAddress::builder(&t)
//!     .add("x", 2u64).unwrap()
//!     .add("key", "a").unwrap()
//!     .build()
//!     .unwrap();
//! assert_eq!(address.label(0), "a");
//! assert_eq!(address.numeric_label(1).unwrap(), 2);
//! assert!(address.numeric_label(0).is_err());
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::error::{TensorError, TensorResult};
use crate::label::{Decimal, Label};
use crate::tensor_type::TensorType;

/// Inline capacity for per-dimension buffers
pub type Coordinates = SmallVec<[u64; 6]>;

#[derive(Clone)]
enum Labels {
    Numeric(Coordinates),
    Text(Box<[String]>),
}

/// An immutable cell address.
///
/// See the [module documentation](self).
#[derive(Clone)]
pub struct TensorAddress {
    labels: Labels,
}

impl TensorAddress {
    /// The address of the single cell of a scalar
    pub fn empty() -> Self {
        Self {
            labels: Labels::Numeric(Coordinates::new()),
        }
    }

    /// An all-numeric address
    pub fn of_numeric(labels: &[u64]) -> Self {
        Self {
            labels: Labels::Numeric(Coordinates::from_slice(labels)),
        }
    }

    /// An all-numeric address from dense coordinates
    pub fn of_indexes(indexes: &[usize]) -> Self {
        Self {
            labels: Labels::Numeric(indexes.iter().map(|&i| i as u64).collect()),
        }
    }

    /// An address from arbitrary labels.
    ///
    /// Uses numeric storage when every label is stored numerically.
    pub fn of_labels<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        let labels: Vec<Label> = labels.into_iter().map(Into::into).collect();
        Self::from_label_vec(labels)
    }

    fn from_label_vec(labels: Vec<Label>) -> Self {
        if labels.iter().all(Label::is_numeric) {
            let numeric = labels.iter().filter_map(Label::as_numeric).collect();
            return Self {
                labels: Labels::Numeric(numeric),
            };
        }
        let text = labels
            .into_iter()
            .map(|l| match l {
                Label::Numeric(n) => n.to_string(),
                Label::Text(s) => s,
            })
            .collect();
        Self {
            labels: Labels::Text(text),
        }
    }

    /// Start building an address validated against `tensor_type`
    pub fn builder(tensor_type: &TensorType) -> AddressBuilder<'_> {
        AddressBuilder::new(tensor_type, false)
    }

    /// Start building a partial address: dimensions left unassigned are
    /// skipped instead of failing `build()`
    pub fn partial_builder(tensor_type: &TensorType) -> AddressBuilder<'_> {
        AddressBuilder::new(tensor_type, true)
    }

    /// Number of labels
    pub fn size(&self) -> usize {
        match &self.labels {
            Labels::Numeric(n) => n.len(),
            Labels::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The string form of label `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.size()`.
    pub fn label(&self, i: usize) -> Cow<'_, str> {
        match &self.labels {
            Labels::Numeric(n) => Cow::Owned(n[i].to_string()),
            Labels::Text(t) => Cow::Borrowed(t[i].as_str()),
        }
    }

    /// Label `i` as a [`Label`] value
    pub fn label_at(&self, i: usize) -> Label {
        match &self.labels {
            Labels::Numeric(n) => Label::Numeric(n[i]),
            Labels::Text(t) => Label::Text(t[i].clone()),
        }
    }

    /// The integer form of label `i`
    ///
    /// # Errors
    ///
    /// Fails if the label is not numeric or `i` is out of range.
    pub fn numeric_label(&self, i: usize) -> TensorResult<u64> {
        match &self.labels {
            Labels::Numeric(n) => n.get(i).copied().ok_or_else(|| {
                TensorError::invalid(format!("No label {} in an address of size {}", i, n.len()))
            }),
            Labels::Text(t) => {
                let label = t.get(i).ok_or_else(|| {
                    TensorError::invalid(format!(
                        "No label {} in an address of size {}",
                        i,
                        t.len()
                    ))
                })?;
                label.parse().map_err(|_| TensorError::NonNumericLabel {
                    label: label.clone(),
                    position: i,
                })
            }
        }
    }

    /// All labels as integers when the address uses numeric storage
    pub fn numeric_labels(&self) -> Option<&[u64]> {
        match &self.labels {
            Labels::Numeric(n) => Some(n),
            Labels::Text(_) => None,
        }
    }

    /// All labels converted to integers, or `None` if any label is non-numeric
    pub fn to_numeric(&self) -> Option<Coordinates> {
        match &self.labels {
            Labels::Numeric(n) => Some(n.clone()),
            Labels::Text(t) => t.iter().map(|s| s.parse().ok()).collect(),
        }
    }

    /// A copy of this address with label `i` replaced
    pub fn with_label(&self, i: usize, label: impl Into<Label>) -> TensorAddress {
        let label = label.into();
        match (&self.labels, &label) {
            (Labels::Numeric(n), Label::Numeric(value)) => {
                let mut n = n.clone();
                n[i] = *value;
                Self {
                    labels: Labels::Numeric(n),
                }
            }
            _ => {
                let mut labels = self.to_labels();
                labels[i] = label;
                Self::from_label_vec(labels)
            }
        }
    }

    /// The address made of the labels at `positions`, in that order
    pub fn project(&self, positions: &[usize]) -> TensorAddress {
        match &self.labels {
            Labels::Numeric(n) => Self {
                labels: Labels::Numeric(positions.iter().map(|&p| n[p]).collect()),
            },
            Labels::Text(t) => Self {
                labels: Labels::Text(positions.iter().map(|&p| t[p].clone()).collect()),
            },
        }
    }

    /// All labels as owned values
    pub fn to_labels(&self) -> Vec<Label> {
        (0..self.size()).map(|i| self.label_at(i)).collect()
    }

    /// Render as `{dim:label,...}` using the dimension names of `tensor_type`
    pub fn to_string_with_type(&self, tensor_type: &TensorType) -> String {
        let mut out = String::from("{");
        for (i, name) in tensor_type.dimension_names().enumerate().take(self.size()) {
            if i > 0 {
                out.push(',');
            }
            out.push_str(name);
            out.push(':');
            out.push_str(&self.label(i));
        }
        out.push('}');
        out
    }

    fn with_str<R>(&self, i: usize, f: impl FnOnce(&str) -> R) -> R {
        match &self.labels {
            Labels::Numeric(n) => f(Decimal::new(n[i]).as_str()),
            Labels::Text(t) => f(&t[i]),
        }
    }
}

impl PartialEq for TensorAddress {
    fn eq(&self, other: &Self) -> bool {
        match (&self.labels, &other.labels) {
            (Labels::Numeric(a), Labels::Numeric(b)) => a == b,
            (Labels::Text(a), Labels::Text(b)) => a == b,
            _ => {
                self.size() == other.size()
                    && (0..self.size())
                        .all(|i| self.with_str(i, |a| other.with_str(i, |b| a == b)))
            }
        }
    }
}

impl Eq for TensorAddress {}

impl Hash for TensorAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.size());
        for i in 0..self.size() {
            self.with_str(i, |s| s.hash(state));
        }
    }
}

impl PartialOrd for TensorAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TensorAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        let common = self.size().min(other.size());
        for i in 0..common {
            let ordering = self.with_str(i, |a| other.with_str(i, |b| a.cmp(b)));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.size().cmp(&other.size())
    }
}

impl fmt::Debug for TensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TensorAddress{}", self)
    }
}

impl fmt::Display for TensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for i in 0..self.size() {
            if i > 0 {
                f.write_str(",")?;
            }
            self.with_str(i, |s| f.write_str(s))?;
        }
        f.write_str(")")
    }
}

impl From<TensorAddress> for Vec<Label> {
    fn from(address: TensorAddress) -> Self {
        address.to_labels()
    }
}

impl From<Vec<Label>> for TensorAddress {
    fn from(labels: Vec<Label>) -> Self {
        Self::from_label_vec(labels)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TensorAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_labels(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TensorAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let labels: Vec<Label> = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::from_label_vec(labels))
    }
}

/// Accumulates `(dimension, label)` pairs validated against a tensor type.
///
/// Labels of indexed dimensions must be numeric and, for bound dimensions,
/// below the declared size.
#[derive(Debug, Clone)]
pub struct AddressBuilder<'t> {
    tensor_type: &'t TensorType,
    labels: Vec<Option<Label>>,
    partial: bool,
}

impl<'t> AddressBuilder<'t> {
    fn new(tensor_type: &'t TensorType, partial: bool) -> Self {
        Self {
            tensor_type,
            labels: vec![None; tensor_type.rank()],
            partial,
        }
    }

    /// Assign the label of one dimension
    pub fn add(mut self, dimension: &str, label: impl Into<Label>) -> TensorResult<Self> {
        let position = self
            .tensor_type
            .index_of(dimension)
            .ok_or_else(|| TensorError::unknown_dimension(dimension, self.tensor_type))?;
        let label = label.into();
        let dim = &self.tensor_type.dimensions()[position];
        let label = if dim.is_indexed() {
            let value = label.as_numeric().ok_or_else(|| TensorError::NonNumericLabel {
                label: label.to_string(),
                position,
            })?;
            if let Some(size) = dim.size() {
                if value >= size {
                    return Err(TensorError::LabelOutOfRange {
                        dimension: dimension.to_string(),
                        label: value,
                        size,
                    });
                }
            }
            Label::Numeric(value)
        } else {
            label
        };
        self.labels[position] = Some(label);
        Ok(self)
    }

    /// Finish the address.
    ///
    /// # Errors
    ///
    /// A complete builder fails if any dimension of the type lacks a label.
    pub fn build(self) -> TensorResult<TensorAddress> {
        let mut labels = Vec::with_capacity(self.labels.len());
        for (position, label) in self.labels.into_iter().enumerate() {
            match label {
                Some(label) => labels.push(label),
                None if self.partial => {}
                None => {
                    return Err(TensorError::MissingLabel {
                        dimension: self.tensor_type.dimensions()[position].name().to_string(),
                        tensor_type: self.tensor_type.to_string(),
                    })
                }
            }
        }
        Ok(TensorAddress::from_label_vec(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_representations_are_interchangeable() {
        let numeric = TensorAddress::of_numeric(&[3, 10]);
        let text = TensorAddress::of_labels(["3", "10"]);
        assert_eq!(numeric, text);
        assert_eq!(numeric.cmp(&text), Ordering::Equal);

        let set: HashSet<TensorAddress> = [numeric.clone()].into_iter().collect();
        assert!(set.contains(&text));
    }

    #[test]
    fn test_ordering_by_string_form() {
        let a = TensorAddress::of_numeric(&[10]);
        let b = TensorAddress::of_numeric(&[9]);
        assert!(a < b);
        let short = TensorAddress::of_labels(["a"]);
        let long = TensorAddress::of_labels(["a", "b"]);
        assert!(short < long);
    }

    #[test]
    fn test_with_label_is_copy_on_write() {
        let a = TensorAddress::of_numeric(&[1, 2]);
        let b = a.with_label(1, 5u64);
        let c = a.with_label(0, "x");
        assert_eq!(a, TensorAddress::of_numeric(&[1, 2]));
        assert_eq!(b, TensorAddress::of_numeric(&[1, 5]));
        assert_eq!(c, TensorAddress::of_labels(["x", "2"]));
    }

    #[test]
    fn test_numeric_label_failure() {
        let a = TensorAddress::of_labels(["a", "3"]);
        assert_eq!(a.numeric_label(1), Ok(3));
        assert!(matches!(
            a.numeric_label(0),
            Err(TensorError::NonNumericLabel { position: 0, .. })
        ));
    }

    #[test]
    fn test_builder_requires_all_dimensions() {
        let t: TensorType = "tensor(x[2],y{})".parse().unwrap();
        let result = TensorAddress::builder(&t).add("y", "a").unwrap().build();
        assert!(matches!(result, Err(TensorError::MissingLabel { .. })));

        let partial = TensorAddress::partial_builder(&t)
            .add("y", "a")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(partial, TensorAddress::of_labels(["a"]));
    }

    #[test]
    fn test_builder_validates_labels() {
        let t: TensorType = "tensor(x[2],y{})".parse().unwrap();
        assert!(matches!(
            TensorAddress::builder(&t).add("x", 2u64),
            Err(TensorError::LabelOutOfRange { .. })
        ));
        assert!(matches!(
            TensorAddress::builder(&t).add("x", "a"),
            Err(TensorError::NonNumericLabel { .. })
        ));
        assert!(matches!(
            TensorAddress::builder(&t).add("z", "a"),
            Err(TensorError::UnknownDimension { .. })
        ));
    }

    #[test]
    fn test_project_and_render() {
        let t: TensorType = "tensor(a{},b[2],c{})".parse().unwrap();
        let address = TensorAddress::of_labels(["k", "1", "m"]);
        assert_eq!(address.project(&[0, 2]), TensorAddress::of_labels(["k", "m"]));
        assert_eq!(address.to_string_with_type(&t), "{a:k,b:1,c:m}");
        assert_eq!(address.to_string(), "(k,1,m)");
    }
}
