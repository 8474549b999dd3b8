//! Unified error type for tensor types, addresses and tensor construction
//!
//! Every fallible operation in the mixten stack reports a [`TensorError`].
//! The variants follow the failure taxonomy of the engine:
//!
//! - **Malformed input**: bad type specs, bad literals, wrong address arity,
//!   mismatched rename lists. Reported immediately, never coerced.
//! - **Strict contract violations**: peeking absent dimensions, incompatible
//!   operand types in join/merge/concat, casting a scalar to a non-double type.
//! - **Strict out-of-range access**: coordinate based lookups on dense storage.
//!
//! Tolerable conditions (reducing or renaming a dimension that is not present)
//! are *not* errors; they surface as [`TypeWarning`](crate::TypeWarning)s.
//!
//! # Examples
//!
//! ```
//! use mixten_core::{TensorError, TensorType};
//!
//! let err = "tensor(x[3]".parse::<TensorType>().unwrap_err();
//! assert!(matches!(err, TensorError::TypeSpec { .. }));
//! ```

use thiserror::Error;

/// Top-level error type for all mixten operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    /// A tensor type spec could not be parsed
    #[error("Malformed tensor type spec '{spec}': {reason}")]
    TypeSpec { spec: String, reason: String },

    /// A tensor literal could not be parsed
    #[error("Malformed tensor literal at position {position}: {reason}")]
    Literal { position: usize, reason: String },

    /// A numeric label was requested but the label is not a number
    #[error("Label '{label}' at position {position} is not numeric")]
    NonNumericLabel { label: String, position: usize },

    /// A label is outside the declared size of an indexed dimension
    #[error("Label {label} is out of range for dimension '{dimension}' of size {size}")]
    LabelOutOfRange {
        dimension: String,
        label: u64,
        size: u64,
    },

    /// An address has a different number of labels than the type has dimensions
    #[error("Address has {got} labels but the type has rank {expected}")]
    RankMismatch { expected: usize, got: usize },

    /// A dimension name is not part of the type
    #[error("Dimension '{dimension}' is not present in {tensor_type}")]
    UnknownDimension {
        dimension: String,
        tensor_type: String,
    },

    /// A dimension was added twice to a type
    #[error("Dimension '{0}' is already present")]
    DuplicateDimension(String),

    /// An address builder was finished without a label for some dimension
    #[error("Missing a label for dimension '{dimension}' in {tensor_type}")]
    MissingLabel {
        dimension: String,
        tensor_type: String,
    },

    /// Operand types cannot be combined by an operation
    #[error("Incompatible types in {operation}: {reason}")]
    IncompatibleTypes { operation: String, reason: String },

    /// A coordinate tuple is outside the dense storage
    #[error("Index out of bounds: index {index:?} exceeds sizes {sizes:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        sizes: Vec<usize>,
    },

    /// Generic illegal-argument condition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for mixten operations
pub type TensorResult<T> = Result<T, TensorError>;

// Convenience constructors for common error patterns
impl TensorError {
    /// Create a type spec error
    pub fn type_spec(spec: &str, reason: impl Into<String>) -> Self {
        TensorError::TypeSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a literal parse error at a byte position
    pub fn literal(position: usize, reason: impl Into<String>) -> Self {
        TensorError::Literal {
            position,
            reason: reason.into(),
        }
    }

    /// Create an incompatible-types error for an operation
    pub fn incompatible(operation: &str, reason: impl Into<String>) -> Self {
        TensorError::IncompatibleTypes {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an illegal-argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        TensorError::InvalidArgument(msg.into())
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: &[usize], sizes: &[usize]) -> Self {
        TensorError::IndexOutOfBounds {
            index: index.to_vec(),
            sizes: sizes.to_vec(),
        }
    }

    /// Create an unknown-dimension error
    pub fn unknown_dimension(dimension: &str, tensor_type: impl std::fmt::Display) -> Self {
        TensorError::UnknownDimension {
            dimension: dimension.to_string(),
            tensor_type: tensor_type.to_string(),
        }
    }
}
