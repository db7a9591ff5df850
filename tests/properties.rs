//! Property-based tests for serialized neighbor search.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Every row has exactly k slots, ascending, without duplicate indices
//! - Valid distances never exceed the mask threshold
//! - A window covering the whole cloud reproduces brute force exactly
//! - Quantization and curve keys are consistent

use proptest::prelude::*;
use serial_neighbor::validation::brute_force_neighbors;
use serial_neighbor::{
    quantize, serial_neighbor, serial_neighbor_with, serialize, CombineStrategy, CurveOrder,
    SearchConfig, WindowPolicy, NEIGHBOR_SENTINEL,
};

prop_compose! {
    fn arb_point()(x in -10.0f32..10.0, y in -10.0f32..10.0, z in -10.0f32..10.0) -> [f32; 3] {
        [x, y, z]
    }
}

fn arb_cloud(max: usize) -> impl Strategy<Value = Vec<[f32; 3]>> {
    prop::collection::vec(arb_point(), 1..max)
}

fn arb_orders() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["z", "z-trans", "hilbert", "hilbert-trans"], 1..=4)
}

mod search_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rows_are_fixed_width_sorted_and_unique(
            points in arb_cloud(120),
            queries in prop::collection::vec(arb_point(), 0..20),
            orders in arb_orders(),
            k in 1usize..12,
            grid_size in 0.05f32..5.0,
            mask in prop::option::of(0.0f32..8.0),
        ) {
            let table = serial_neighbor(&points, &queries, &orders, k, grid_size, mask).unwrap();
            prop_assert_eq!(table.shape(), (queries.len(), k));

            for (indices, distances) in table.rows() {
                prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));
                let mut valid: Vec<i64> = indices
                    .iter()
                    .copied()
                    .filter(|&i| i != NEIGHBOR_SENTINEL)
                    .collect();
                let count = valid.len();
                valid.sort_unstable();
                valid.dedup();
                prop_assert_eq!(valid.len(), count);
                prop_assert!(valid.iter().all(|&i| (i as usize) < points.len()));

                for (&i, &d) in indices.iter().zip(distances) {
                    if i == NEIGHBOR_SENTINEL {
                        prop_assert_eq!(d, f32::INFINITY);
                    } else if let Some(t) = mask {
                        prop_assert!(d <= t);
                    }
                }
            }
        }

        #[test]
        fn full_window_equals_brute_force(
            points in arb_cloud(80),
            queries in prop::collection::vec(arb_point(), 1..10),
            orders in arb_orders(),
            k in 1usize..10,
            grid_size in 0.05f32..5.0,
            mask in prop::option::of(0.0f32..8.0),
        ) {
            let config = SearchConfig::default().with_window(WindowPolicy::Fixed(points.len()));
            let out = serial_neighbor_with(&points, &queries, &orders, k, grid_size, mask, config)
                .unwrap();
            let exact = brute_force_neighbors(&points, &queries, k, mask).unwrap();
            prop_assert_eq!(out.neighbors, exact);
        }

        #[test]
        fn combine_strategies_agree(
            points in arb_cloud(150),
            queries in prop::collection::vec(arb_point(), 1..10),
            orders in arb_orders(),
            k in 1usize..8,
            radius in 1usize..10,
            mask in prop::option::of(0.0f32..8.0),
        ) {
            let union = SearchConfig::default().with_window(WindowPolicy::Fixed(radius));
            let merge = union.with_combine(CombineStrategy::MergeResults);
            let a = serial_neighbor_with(&points, &queries, &orders, k, 0.5, mask, union).unwrap();
            let b = serial_neighbor_with(&points, &queries, &orders, k, 0.5, mask, merge).unwrap();
            prop_assert_eq!(a.neighbors, b.neighbors);
        }
    }
}

mod encoding_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn quantize_floors(p in arb_point(), grid_size in 0.01f32..10.0) {
            let cell = quantize(&p, grid_size).unwrap();
            prop_assert_eq!(cell.x, (p[0] / grid_size).floor() as i32);
            prop_assert_eq!(cell.y, (p[1] / grid_size).floor() as i32);
            prop_assert_eq!(cell.z, (p[2] / grid_size).floor() as i32);
        }

        #[test]
        fn curve_keys_invert(
            x in -(1i32 << 20)..(1i32 << 20),
            y in -(1i32 << 20)..(1i32 << 20),
            z in -(1i32 << 20)..(1i32 << 20),
        ) {
            let cell = serial_neighbor::GridCell::new(x, y, z);
            for order in CurveOrder::ALL {
                let key = order.encode(cell);
                prop_assert!(key < 1u64 << 63);
                prop_assert_eq!(order.decode(key), cell);
            }
        }

        #[test]
        fn serialized_keys_sorted_and_permutation_bijective(points in arb_cloud(200), grid_size in 0.05f32..5.0) {
            for order in CurveOrder::ALL {
                let index = serialize(&points, grid_size, order.name()).unwrap();
                prop_assert!(index.sorted_keys().windows(2).all(|w| w[0] <= w[1]));
                let mut seen = vec![false; points.len()];
                for (pos, &idx) in index.sorted_indices().iter().enumerate() {
                    prop_assert!(!seen[idx as usize]);
                    seen[idx as usize] = true;
                    prop_assert_eq!(index.position_of(idx), pos);
                }
            }
        }
    }
}
