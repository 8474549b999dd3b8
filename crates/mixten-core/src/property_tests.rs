//! Property-based tests for dense addressing and type resolution
//!
//! This module uses proptest to check the layout and type algebra laws over
//! randomly generated shapes and types.

#[cfg(test)]
mod tests {
    use crate::{type_resolver, DimensionSizes, Indexes, TensorAddress, TensorType};
    use proptest::prelude::*;

    // Small dense shapes, rank 0-4
    fn sizes_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 0..=4)
    }

    fn type_strategy() -> impl Strategy<Value = TensorType> {
        let dimension = prop_oneof![
            (1u64..5).prop_map(|s| format!("[{}]", s)),
            Just("[]".to_string()),
            Just("{}".to_string()),
        ];
        prop::collection::btree_map(prop::sample::select(vec!["a", "b", "c", "d"]), dimension, 0..=4)
            .prop_map(|dims| {
                let body: Vec<String> = dims.iter().map(|(n, k)| format!("{}{}", n, k)).collect();
                format!("tensor({})", body.join(","))
                    .parse::<TensorType>()
                    .unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_value_index_is_a_bijection(sizes in sizes_strategy()) {
            let sizes = DimensionSizes::of(&sizes);
            for offset in 0..sizes.total_size() {
                let coords = sizes.from_value_index(offset);
                prop_assert_eq!(sizes.to_value_index(&coords), offset);
                prop_assert!(sizes.checked_value_index(&coords).is_ok());
            }
        }

        #[test]
        fn prop_all_indexes_visit_offsets_in_order(sizes in sizes_strategy()) {
            let sizes = DimensionSizes::of(&sizes);
            let mut indexes = Indexes::all(&sizes);
            let mut expected = 0;
            while indexes.next() {
                prop_assert_eq!(indexes.source_value_index(), expected);
                prop_assert_eq!(sizes.to_value_index(indexes.indexes()), expected);
                expected += 1;
            }
            prop_assert_eq!(expected, sizes.total_size());
        }

        #[test]
        fn prop_type_display_parses_back(t in type_strategy()) {
            let reparsed: TensorType = t.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, t);
        }

        #[test]
        fn prop_join_with_self_is_identity_on_dimensions(t in type_strategy()) {
            let joined = type_resolver::join(&t, &t).unwrap();
            prop_assert_eq!(joined.dimensions(), t.dimensions());
        }

        #[test]
        fn prop_join_is_commutative(a in type_strategy(), b in type_strategy()) {
            let ab = type_resolver::join(&a, &b).ok();
            let ba = type_resolver::join(&b, &a).ok();
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn prop_reduce_all_is_scalar(t in type_strategy()) {
            let names: Vec<&str> = t.dimension_names().collect();
            let reduced = type_resolver::reduce(&t, &names);
            prop_assert!(!reduced.has_warnings());
            prop_assert_eq!(reduced.into_value(), TensorType::empty());
        }

        #[test]
        fn prop_address_orders_like_labels(a in 0u64..200, b in 0u64..200) {
            let numeric = (TensorAddress::of_numeric(&[a]), TensorAddress::of_numeric(&[b]));
            let text = (
                TensorAddress::of_labels([a.to_string()]),
                TensorAddress::of_labels([b.to_string()]),
            );
            prop_assert_eq!(numeric.0.cmp(&numeric.1), a.to_string().cmp(&b.to_string()));
            prop_assert_eq!(numeric.0.cmp(&text.1), text.0.cmp(&numeric.1));
        }
    }
}
