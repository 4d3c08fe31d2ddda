// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: quantifier collapsing and serialization determinism.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use typegraph_core::{
    propagate_runtimes, Collector, Runtime, StringFormat, TypeGraph, TypeId,
};

fn scalar(g: &mut TypeGraph, pick: u8) -> TypeId {
    match pick % 5 {
        0 => g.boolean(),
        1 => g.integer(),
        2 => g.float(),
        3 => g.string(None),
        _ => g.string(Some(StringFormat::Uuid)),
    }
}

proptest! {
    #[test]
    fn optional_chains_collapse_to_one_level(pick in any::<u8>(), depth in 1usize..16) {
        let mut g = TypeGraph::new();
        let base = scalar(&mut g, pick);
        let first = g.optional(base).unwrap();
        let mut current = first;
        for _ in 1..depth {
            current = g.optional(current).unwrap();
        }
        // However deep the chain, every wrap returns the same node.
        prop_assert_eq!(current, first);
    }

    #[test]
    fn arrays_of_optionals_are_not_collapsed(pick in any::<u8>()) {
        let mut g = TypeGraph::new();
        let base = scalar(&mut g, pick);
        let opt = g.optional(base).unwrap();
        let arr = g.array(opt).unwrap();
        let opt_arr = g.optional(arr).unwrap();
        prop_assert_ne!(opt, arr);
        prop_assert_ne!(arr, opt_arr);
        prop_assert_ne!(opt, opt_arr);
    }

    #[test]
    fn collection_is_deterministic(
        picks in prop::collection::vec(any::<u8>(), 1..12),
        wrap in prop::collection::vec(0u8..3, 1..12),
    ) {
        let mut g = TypeGraph::new();
        let rt = g.add_runtime(Runtime::new("deno"));

        // A struct of randomly shaped fields, some shared between slots.
        let mut fields: Vec<(String, TypeId)> = Vec::new();
        let mut last = None;
        for (i, (pick, wrap)) in picks.iter().zip(&wrap).enumerate() {
            let base = scalar(&mut g, *pick);
            let ty = match wrap {
                0 => base,
                1 => g.optional(base).unwrap(),
                _ => g.array(base).unwrap(),
            };
            fields.push((format!("f{i}"), ty));
            if i % 3 == 0 {
                if let Some(shared) = last {
                    fields.push((format!("s{i}"), shared));
                }
            }
            last = Some(ty);
        }
        let root = g.struct_(fields);
        propagate_runtimes(&mut g, root, Some(rt)).unwrap();

        let mut first = Collector::new(&g);
        let first_root = first.collect_type(root).unwrap();
        let first_tables = first.finish().unwrap();

        let mut second = Collector::new(&g);
        let second_root = second.collect_type(root).unwrap();
        let second_tables = second.finish().unwrap();

        prop_assert_eq!(first_root, second_root);
        prop_assert_eq!(first_tables.types, second_tables.types);
        prop_assert_eq!(first_tables.runtimes, second_tables.runtimes);
    }
}
