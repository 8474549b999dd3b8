//! Integration tests for mixten-tensor
//!
//! These tests exercise the tensor representations, literals and operations
//! through the public API only.

use std::collections::HashSet;

use mixten_core::{DimensionSizes, Label, TensorAddress, TensorError, TensorType, ValueType};
use mixten_tensor::{Aggregator, Cell, IndexedTensor, MixedTensor, Tensor, TensorHints};

fn t(spec: &str) -> TensorType {
    spec.parse().unwrap()
}

fn tensor(literal: &str) -> Tensor {
    literal.parse().unwrap()
}

#[test]
fn test_literal_round_trip_all_forms() {
    for literal in [
        "tensor():3.5",
        "tensor(x[3]):[1.0,2.0,3.0]",
        "tensor<float>(x[2],y[2]):[[1.5,2.0],[3.0,-4.25]]",
        "tensor(x[]):[1.0,2.0]",
        "tensor(key{}):{a:1.0,b:NaN,c:inf}",
        "tensor(key{},x[2]):{a:[1.0,2.0],'b c':[3.0,4.0]}",
        "tensor(a{},b{}):{{a:p,b:q}:1.0,{a:r,b:s}:2.0}",
        "tensor(a{},b{},x[2]):{{a:p,b:q,x:0}:1.0,{a:p,b:q,x:1}:2.0}",
        "tensor(key{}):{}",
    ] {
        let parsed = tensor(literal);
        assert_eq!(parsed.to_string(), literal);
        assert_eq!(tensor(&parsed.to_string()), parsed);
    }
}

#[test]
fn test_missing_value_conventions() {
    let dense = tensor("tensor(x[2]):[1,2]");
    assert!(dense.get(&TensorAddress::of_numeric(&[2])).is_nan());
    assert!(dense.get(&TensorAddress::of_labels(["a"])).is_nan());
    let indexed = dense.as_indexed().unwrap();
    assert!(matches!(
        indexed.get_at(&[2]),
        Err(TensorError::IndexOutOfBounds { .. })
    ));
    assert!(indexed.get_at(&[0, 0]).is_err());

    let sparse = tensor("tensor(key{}):{a:1}");
    assert_eq!(sparse.get(&TensorAddress::of_labels(["b"])), 0.0);
    assert!(!sparse.has(&TensorAddress::of_labels(["b"])));

    let mixed = tensor("tensor(key{},x[2]):{a:[1,2]}");
    assert_eq!(mixed.get(&TensorAddress::of_labels(["b", "0"])), 0.0);
    assert_eq!(mixed.get(&TensorAddress::of_labels(["a", "7"])), 0.0);
    assert!(mixed.has(&TensorAddress::of_labels(["a", "1"])));
}

#[test]
fn test_representation_equivalence_across_builders() {
    let expected = tensor("tensor(x[3]):[1,0,3]");

    let mut bound =
        IndexedTensor::bound_builder(t("tensor(x[3])"), DimensionSizes::of(&[3])).unwrap();
    bound.cell_at(&[0], 1.0).unwrap();
    bound.cell_at(&[2], 3.0).unwrap();
    assert_eq!(Tensor::from(bound.build()), expected);

    let mut unbound = IndexedTensor::unbound_builder(t("tensor(x[])")).unwrap();
    unbound.cell(&TensorAddress::of_numeric(&[2]), 3.0).unwrap();
    unbound.cell(&TensorAddress::of_numeric(&[0]), 1.0).unwrap();
    unbound.cell(&TensorAddress::of_numeric(&[1]), 0.0).unwrap();
    assert_eq!(Tensor::from(unbound.build().unwrap()), expected);

    let from_values = IndexedTensor::from_values(
        t("tensor(x[3])"),
        DimensionSizes::of(&[3]),
        vec![1.0, 0.0, 3.0],
    )
    .unwrap();
    assert_eq!(Tensor::from(from_values), expected);
}

#[test]
fn test_mixed_builders_agree() {
    let mut bound = MixedTensor::builder(t("tensor(key{},x[2])"));
    bound.cell(TensorAddress::of_labels(["b", "1"]), 4.0).unwrap();
    bound.cell(TensorAddress::of_labels(["a", "0"]), 1.0).unwrap();

    let mut unbound = MixedTensor::builder(t("tensor(key{},x[])"));
    unbound.cell(TensorAddress::of_labels(["a", "0"]), 1.0).unwrap();
    unbound.cell(TensorAddress::of_labels(["b", "1"]), 4.0).unwrap();

    let bound = Tensor::from(bound.build().unwrap());
    let unbound = Tensor::from(unbound.build().unwrap());
    assert_eq!(unbound.tensor_type(), &t("tensor(key{},x[2])"));
    assert_eq!(bound, unbound);
    assert_eq!(bound, tensor("tensor(key{},x[2]):{a:[1,0],b:[0,4]}"));
}

#[test]
fn test_mixed_subspaces_are_contiguous_and_complete() {
    let mixed = tensor("tensor(key{},x[2],y[3]):{a:[[1,2,3],[4,5,6]],b:[[7,8,9],[1,2,3]]}");
    let mixed = mixed.as_mixed().unwrap();
    let dense_size = mixed.dense_subspace_size();
    assert_eq!(dense_size, 6);
    assert_eq!(mixed.index().len(), 2);

    for sparse in mixed.sparse_addresses() {
        let start = mixed.index().subspace_start(sparse).unwrap();
        let subspace = mixed.dense_subspace(sparse).unwrap();
        assert_eq!(subspace.len(), dense_size);
        let offsets: HashSet<usize> = subspace
            .iter()
            .map(|cell| {
                let x = cell.address().numeric_label(1).unwrap() as usize;
                let y = cell.address().numeric_label(2).unwrap() as usize;
                mixed.index().dense_sizes().to_value_index(&[x, y])
            })
            .collect();
        assert_eq!(offsets, (0..dense_size).collect::<HashSet<_>>());
        assert!(subspace
            .iter()
            .all(|cell| cell.address().label(0) == sparse.label(0)));
        assert!(start % dense_size == 0);
    }
}

#[test]
fn test_cursor_views_and_detached_cells() {
    let t = tensor("tensor(x[2],y[2]):[[1,2],[3,4]]");
    let mut kept: Vec<Cell> = Vec::new();
    let mut cursor = t.cursor();
    while let Some(view) = cursor.next() {
        if view.value() > 2.0 {
            kept.push(view.detach());
        }
    }
    assert_eq!(
        kept,
        vec![
            Cell::new(TensorAddress::of_numeric(&[1, 0]), 3.0),
            Cell::new(TensorAddress::of_numeric(&[1, 1]), 4.0),
        ]
    );
    assert_eq!(t.cells().count(), 4);
}

#[test]
fn test_tolerance_in_equality() {
    let a = tensor("tensor(x[2]):[1000.0,0.5]");
    let b = tensor("tensor(x[2]):[1000.05,0.50005]");
    assert_eq!(a, b);
    let strict = TensorHints::new().with_tolerance(1e-9);
    assert!(!a.approx_eq_with(&b, &strict));
    assert_ne!(a, tensor("tensor(x[2]):[1001.0,0.5]"));
}

#[test]
fn test_equality_requires_same_addresses() {
    let a = tensor("tensor(k{}):{a:0}");
    let b = tensor("tensor(k{}):{b:5}");
    assert_ne!(a, b);
    assert_ne!(b, a);

    let zero_a = tensor("tensor(k{}):{a:0}");
    let zero_b = tensor("tensor(k{}):{b:0}");
    assert_ne!(zero_a, zero_b);
    assert_ne!(zero_b, zero_a);

    let mixed_a = tensor("tensor(k{},x[2]):{a:[0,0]}");
    let mixed_b = tensor("tensor(k{},x[2]):{b:[0,0]}");
    assert_ne!(mixed_a, mixed_b);
    assert_ne!(mixed_b, mixed_a);

    assert_eq!(a, tensor("tensor(k{}):{a:0.0}"));
}

#[test]
fn test_operations_compose() {
    let embeddings = tensor("tensor(doc{},x[3]):{d1:[1,0,1],d2:[0,2,0]}");
    let query = tensor("tensor(x[3]):[2,1,1]");
    let scores = embeddings.multiply(&query).unwrap().sum(&["x"]).unwrap();
    assert_eq!(scores, tensor("tensor(doc{}):{d1:3,d2:2}"));

    let best = scores.reduce(Aggregator::Max, &[]).unwrap();
    assert_eq!(best.as_double(), Ok(3.0));

    let renamed = scores.rename(&["doc"], &["id"]).unwrap();
    assert_eq!(renamed.tensor_type(), &t("tensor(id{})"));

    let d2 = embeddings.peek(&[("doc", Label::from("d2"))]).unwrap();
    assert_eq!(d2, tensor("tensor(x[3]):[0,2,0]"));

    let halved = query.map(|v| v / 2.0).cell_cast(ValueType::Float).unwrap();
    assert_eq!(halved.to_string(), "tensor<float>(x[3]):[1.0,0.5,0.5]");
}

#[test]
fn test_concat_and_merge() {
    let a = tensor("tensor(x[2]):[1,2]");
    let b = tensor("tensor(x[]):[3]");
    let joined = a.concat(&b, "x").unwrap();
    assert_eq!(joined.tensor_type(), &t("tensor(x[])"));
    assert_eq!(joined, tensor("tensor(x[3]):[1,2,3]"));

    let old = tensor("tensor(k{}):{a:1,b:2}");
    let new = tensor("tensor(k{}):{b:5}");
    let updated = old.merge(&new, |_, replacement| replacement).unwrap();
    assert_eq!(updated, tensor("tensor(k{}):{a:1,b:5}"));
}

#[test]
fn test_literal_errors_carry_position() {
    match Tensor::from_literal("tensor(x{}):{a:1,b:}") {
        Err(TensorError::Literal { position, .. }) => assert_eq!(position, 19),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        Tensor::from_literal("tensor(x[2):[1,2]"),
        Err(TensorError::TypeSpec { .. })
    ));
}
