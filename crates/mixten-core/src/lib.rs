//! # mixten-core
//!
//! Tensor types, cell addressing and type resolution for mixten.
//!
//! This crate holds everything about tensors that does not depend on cell
//! data:
//!
//! - **Tensor types** ([`TensorType`]) with indexed bound (`x[3]`), indexed
//!   unbound (`x[]`) and mapped (`x{}`) dimensions
//! - **Labels and addresses** ([`Label`], [`TensorAddress`]) with validated
//!   construction through [`AddressBuilder`]
//! - **Dense layout** ([`DimensionSizes`]) and the iteration cursors
//!   [`Indexes`] and [`DirectIndexedAddress`]
//! - **Type resolution** ([`type_resolver`]) computing the result type of
//!   every primitive operation
//!
//! ## Core Principles
//!
//! ### Canonical Order
//!
//! Dimensions are always sorted by name. Addresses are positional against
//! that order, and dense storage is row-major over it (last dimension
//! fastest).
//!
//! ### Label Identity
//!
//! Labels compare by string form: the numeric label `3` and the text label
//! `"3"` are the same coordinate.
//!
//! ### Errors and Warnings
//!
//! Malformed input and broken contracts are [`TensorError`]s. Tolerated
//! oddities, such as reducing a dimension a type does not have, come back as
//! [`TypeWarning`]s inside a [`Resolved`] value.
//!
//! ## Quick Start
//!
//! ```
//! use mixten_core::{type_resolver, TensorAddress, TensorType};
//!
//! let t: TensorType = "tensor(key{},x[3])".parse().unwrap();
//! assert!(t.has_mapped_dimensions());
//!
//! let address = TensorAddress::builder(&t)
//!     .add("key", "a").unwrap()
//!     .add("x", 1u64).unwrap()
//!     .build()
//!     .unwrap();
//! assert_eq!(address.to_string_with_type(&t), "{key:a,x:1}");
//!
//! let summed = type_resolver::reduce(&t, &["x"]).logged();
//! assert_eq!(summed.to_string(), "tensor(key{})");
//! ```

pub mod address;
pub mod diagnostics;
pub mod dimension_sizes;
pub mod direct_address;
pub mod error;
pub mod indexes;
pub mod label;
pub mod tensor_type;
pub mod type_parser;
pub mod type_resolver;
pub mod value_type;

#[cfg(test)]
mod property_tests;

pub use address::{AddressBuilder, Coordinates, TensorAddress};
pub use diagnostics::{Resolved, TypeWarning};
pub use dimension_sizes::DimensionSizes;
pub use direct_address::DirectIndexedAddress;
pub use error::{TensorError, TensorResult};
pub use indexes::Indexes;
pub use label::Label;
pub use tensor_type::{Dimension, DimensionKind, TensorType, TensorTypeBuilder, MAX_DIMENSION_SIZE};
pub use value_type::ValueType;
