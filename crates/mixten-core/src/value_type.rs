//! Cell value types
//!
//! A tensor type carries one scalar cell value type. Value types are ordered
//! by generality: `Float < Double`.

use std::fmt;
use std::str::FromStr;

use crate::error::TensorError;

/// The numeric type of every cell in a tensor.
///
/// The derived ordering follows precision, so `ValueType::Float < ValueType::Double`.
///
/// # Examples
///
/// ```
/// use mixten_core::ValueType;
///
/// assert!(ValueType::Float < ValueType::Double);
/// assert_eq!(ValueType::largest_of(ValueType::Float, ValueType::Double), ValueType::Double);
/// assert_eq!("float".parse::<ValueType>().unwrap(), ValueType::Float);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    /// 32-bit IEEE 754 cells
    Float,
    /// 64-bit IEEE 754 cells
    #[default]
    Double,
}

impl ValueType {
    /// The identifier used in type specs (`double` or `float`)
    pub fn id(self) -> &'static str {
        match self {
            ValueType::Double => "double",
            ValueType::Float => "float",
        }
    }

    /// Returns the more general of two value types
    pub fn largest_of(a: ValueType, b: ValueType) -> ValueType {
        a.max(b)
    }

    /// Whether this type can represent every value of `other`
    pub fn is_equal_or_larger_than(self, other: ValueType) -> bool {
        self >= other
    }

    /// The value type of a computed (non-identity) result: never below `Float`
    pub fn map(self) -> ValueType {
        ValueType::largest_of(self, ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ValueType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "double" => Ok(ValueType::Double),
            "float" => Ok(ValueType::Float),
            other => Err(TensorError::invalid(format!(
                "Unknown value type '{}', expected 'double' or 'float'",
                other
            ))),
        }
    }
}
