//! # mixten - Multi-representation tensors
//!
//! Tensors whose dimensions are either **indexed** (dense, integer
//! coordinates) or **mapped** (sparse, string labels), with a type algebra
//! that computes the result type of every primitive operation.
//!
//! This is the **meta crate** that re-exports all mixten components for convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use mixten::prelude::*;
//!
//! let a: Tensor = "tensor(key{},x[2]):{a:[1,2],b:[3,4]}".parse()?;
//! let b: Tensor = "tensor(x[2]):[10,100]".parse()?;
//!
//! let scores = a.multiply(&b)?.reduce(Aggregator::Sum, &["x"])?;
//! assert_eq!(scores.to_string(), "tensor(key{}):{a:210.0,b:430.0}");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Types and Addressing ([`core`])
//!
//! Tensor types and their spec strings, labels, addresses, dense layout and
//! the result-type rules of all operations.
//!
//! ```
//! use mixten::core::{type_resolver, TensorType};
//!
//! let x3: TensorType = "tensor(x[3])".parse().unwrap();
//! let x: TensorType = "tensor(x[])".parse().unwrap();
//! assert_eq!(type_resolver::join(&x3, &x).unwrap(), x);
//! ```
//!
//! ### Tensor Values ([`tensor`])
//!
//! Dense, sparse and mixed storage behind one [`Tensor`](tensor::Tensor)
//! enum, builders, cursors, literals and the primitive operations.
//!
//! ```
//! use mixten::core::TensorAddress;
//! use mixten::tensor::Tensor;
//!
//! let sparse: Tensor = "tensor(tag{}):{news:1.5}".parse().unwrap();
//! assert_eq!(sparse.get(&TensorAddress::of_labels(["sports"])), 0.0);
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for types, labels, addresses and sizes

#![deny(warnings)]

// Re-export all components
pub use mixten_core as core;
pub use mixten_tensor as tensor;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use mixten::prelude::*;
    //!
    //! let t = TensorType::builder().mapped("key").indexed("x", 2).build().unwrap();
    //! let tensor = Tensor::builder(t).build().unwrap();
    //! assert!(tensor.is_empty());
    //! ```

    // Types and addressing
    pub use crate::core::{
        type_resolver, Dimension, Label, TensorAddress, TensorError, TensorResult, TensorType,
        ValueType,
    };

    // Tensor values
    pub use crate::tensor::{Aggregator, Cell, Tensor, TensorBuilder, TensorHints};
}
