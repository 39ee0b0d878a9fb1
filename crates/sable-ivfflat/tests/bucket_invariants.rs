//! Structural invariants of the IVFFlat partition.

use proptest::prelude::*;
use sable_ivfflat::{IvfFlatIndex, IvfFlatOptions};
use sable_vector::{Metric, Rid, VectorIndex};

fn arb_points(dims: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-100.0..100.0f64, dims), 0..80)
}

proptest! {
    // The 500-iteration Lloyd budget makes each build meaningful work; keep
    // the case count modest.
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Build loses no point and duplicates none: the index holds exactly the
    /// input multiset, whichever buckets the points land in.
    #[test]
    fn build_partitions_the_input(points in arb_points(4), seed in any::<u64>()) {
        let options = IvfFlatOptions { lists: 4, probe_lists: 4 };
        let mut index = IvfFlatIndex::with_seed(Metric::L2, &options, seed);

        let data: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), Rid::new(0, i as u32)))
            .collect();
        let n = data.len();
        index.build(data).unwrap();

        if n < 4 {
            prop_assert_eq!(index.len(), 0);
        } else {
            prop_assert_eq!(index.len(), n);

            // Probing every bucket returns each rid exactly once.
            let query = vec![0.0; 4];
            let mut rids = index.scan(&query, n).unwrap();
            rids.sort();
            let expected: Vec<Rid> = (0..n).map(|i| Rid::new(0, i as u32)).collect();
            prop_assert_eq!(rids, expected);
        }
    }

    /// Scan results come back in non-decreasing distance order and never
    /// exceed `min(limit, n)`.
    #[test]
    fn scan_is_sorted_and_bounded(points in arb_points(4), limit in 0usize..20) {
        let options = IvfFlatOptions { lists: 4, probe_lists: 2 };
        let mut index = IvfFlatIndex::with_seed(Metric::L2, &options, 11);

        let data: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), Rid::new(0, i as u32)))
            .collect();
        index.build(data).unwrap();

        let query = vec![1.0; 4];
        let rids = index.scan(&query, limit).unwrap();
        prop_assert!(rids.len() <= limit.min(points.len()));

        let distances: Vec<f64> = rids
            .iter()
            .map(|rid| {
                let v = &points[rid.slot() as usize];
                sable_vector::l2_distance(&query, v)
            })
            .collect();
        for pair in distances.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
    }
}
