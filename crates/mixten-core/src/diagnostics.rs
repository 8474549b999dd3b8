//! Non-fatal diagnostics from type resolution
//!
//! Reducing or renaming a dimension that is not present is tolerated so that
//! generic code can speculatively apply such operations across heterogeneous
//! input shapes. Instead of logging from deep inside the resolver, these cases
//! are returned as [`TypeWarning`]s next to the result; the caller decides
//! whether to inspect them or forward them to the `log` facade.

use thiserror::Error;

/// A tolerated problem encountered while resolving a type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeWarning {
    #[error("reducing non-existing dimension '{dimension}' in type {tensor_type}")]
    ReduceMissingDimension {
        dimension: String,
        tensor_type: String,
    },

    #[error("renaming non-existing dimension '{dimension}' in type {tensor_type}")]
    RenameMissingDimension {
        dimension: String,
        tensor_type: String,
    },
}

/// A value together with the warnings produced while computing it.
///
/// # Examples
///
/// ```
/// use mixten_core::{type_resolver, TensorType};
///
/// let t: TensorType = "tensor(x[3])".parse().unwrap();
/// let resolved = type_resolver::reduce(&t, &["y"]);
/// assert_eq!(resolved.warnings().len(), 1);
/// // forwards the warning to `log::warn!` and unwraps the type
/// assert_eq!(resolved.logged(), t);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Resolved<T> {
    value: T,
    warnings: Vec<TypeWarning>,
}

impl<T> Resolved<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<TypeWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn warnings(&self) -> &[TypeWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The value, discarding warnings
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<TypeWarning>) {
        (self.value, self.warnings)
    }

    /// The value, after forwarding every warning to `log::warn!`
    pub fn logged(self) -> T {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
