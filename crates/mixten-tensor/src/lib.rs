//! # mixten-tensor
//!
//! Tensor values over [`mixten_core`] types: three storage representations,
//! one [`Tensor`] enum over them, literals and primitive operations.
//!
//! ## Representations
//!
//! - **Dense** ([`IndexedTensor`]): a flat `f64` or `f32` array in row-major
//!   order over indexed dimensions. An address outside the tensor reads as
//!   NaN; [`IndexedTensor::get_at`] is the strict form.
//! - **Sparse** ([`MappedTensor`]): a hash map from address to value over
//!   mapped dimensions. Absent cells read as `0.0`.
//! - **Mixed** ([`MixedTensor`]): dense subspaces keyed by the mapped part of
//!   the address, stored contiguously with a [`MixedIndex`] from sparse
//!   address to subspace start. Absent cells read as `0.0`.
//!
//! The representation is picked by [`TensorBuilder`] from the type and never
//! changes afterwards. Built tensors are immutable and `Send + Sync`.
//!
//! ## Iteration
//!
//! [`CellCursor`] lends a [`CellView`] per step without allocating; call
//! [`CellView::detach`] to keep a cell. [`Cells`] is the owning iterator.
//!
//! ## Quick Start
//!
//! ```
//! use mixten_core::TensorAddress;
//! use mixten_tensor::{Aggregator, Tensor};
//!
//! let scores: Tensor = "tensor(user{},day[3]):{alice:[1,2,3],bob:[4,5,6]}".parse().unwrap();
//! assert_eq!(scores.get(&TensorAddress::of_labels(["2", "bob"])), 6.0);
//!
//! let totals = scores.reduce(Aggregator::Sum, &["day"]).unwrap();
//! assert_eq!(totals.to_string(), "tensor(user{}):{alice:6.0,bob:15.0}");
//! ```

pub mod cell;
pub mod hints;
pub mod indexed;
mod literal;
pub mod mapped;
pub mod mixed;
pub mod ops;
pub mod tensor;
pub mod values;


pub use cell::{Cell, CellCursor, CellView, Cells};
pub use hints::TensorHints;
pub use indexed::{IndexedBuilder, IndexedCursor, IndexedTensor, Subspaces};
pub use mapped::{MappedBuilder, MappedCursor, MappedTensor};
pub use mixed::{MixedBuilder, MixedCursor, MixedIndex, MixedTensor};
pub use ops::Aggregator;
pub use tensor::{CellBuilder, Tensor, TensorBuilder};
pub use values::{CellValue, CellValues, Values};
