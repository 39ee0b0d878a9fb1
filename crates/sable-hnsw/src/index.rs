//! The HNSW index proper.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sable_vector::{
    check_dimension, check_query_dimension, Metric, Result, Rid, VectorError, VectorIndex,
};

use crate::graph::{Layer, VertexId};

/// HNSW construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswOptions {
    /// Target degree per vertex; also the upper-layer degree cap.
    pub m: usize,
    /// Beam width while wiring a new vertex in.
    pub ef_construction: usize,
    /// Beam width at layer 0 during a scan.
    pub ef_search: usize,
}

impl HnswOptions {
    /// Parse from `(name, value)` DDL option pairs. All three keys are
    /// required.
    pub fn from_pairs(pairs: &[(String, i64)]) -> Result<Self> {
        let mut m = None;
        let mut ef_construction = None;
        let mut ef_search = None;
        for (name, value) in pairs {
            match name.as_str() {
                "m" => m = Some(*value as usize),
                "ef_construction" => ef_construction = Some(*value as usize),
                "ef_search" => ef_search = Some(*value as usize),
                _ => {}
            }
        }
        let m = m.ok_or_else(|| VectorError::MissingOption("m".to_string()))?;
        let ef_construction = ef_construction
            .ok_or_else(|| VectorError::MissingOption("ef_construction".to_string()))?;
        let ef_search =
            ef_search.ok_or_else(|| VectorError::MissingOption("ef_search".to_string()))?;
        Ok(Self { m, ef_construction, ef_search })
    }
}

/// A vertex paired with its distance to the current query.
///
/// Ordering is by distance (`total_cmp`), so a `BinaryHeap<Candidate>` is a
/// max-heap on distance and `BinaryHeap<Reverse<Candidate>>` a min-heap.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    vertex: VertexId,
    distance: f64,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

/// Hierarchical navigable small world index.
///
/// The vertex arena (`vectors` + `rids`) is owned here; layers refer to it
/// by integer id only. Layer 0 contains every vertex, higher layers thin out
/// exponentially via the `floor(-ln(u) * m_l)` level draw.
pub struct HnswIndex {
    metric: Metric,
    m: usize,
    m_max: usize,
    m_max0: usize,
    ef_construction: usize,
    ef_search: usize,
    /// Level-scaling constant, `1 / ln(m)`.
    m_l: f64,
    dimension: Option<usize>,
    vectors: Vec<Vec<f64>>,
    rids: Vec<Rid>,
    /// Bottom layer first. Always at least one layer.
    layers: Vec<Layer>,
    rng: StdRng,
}

impl HnswIndex {
    /// Create an index seeded from system entropy.
    pub fn new(metric: Metric, options: &HnswOptions) -> Self {
        Self::from_rng(metric, options, StdRng::from_entropy())
    }

    /// Create an index with a deterministic PRNG seed.
    pub fn with_seed(metric: Metric, options: &HnswOptions, seed: u64) -> Self {
        Self::from_rng(metric, options, StdRng::seed_from_u64(seed))
    }

    fn from_rng(metric: Metric, options: &HnswOptions, rng: StdRng) -> Self {
        Self {
            metric,
            m: options.m,
            m_max: options.m,
            m_max0: options.m * options.m,
            ef_construction: options.ef_construction,
            ef_search: options.ef_search,
            m_l: 1.0 / (options.m as f64).ln(),
            dimension: None,
            vectors: Vec::new(),
            rids: Vec::new(),
            layers: vec![Layer::new()],
            rng,
        }
    }

    /// Number of layers currently in the stack.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Draw the top level for a new vertex: `floor(-ln(u) * m_l)`.
    ///
    /// Capped so a degenerate draw (`m = 1` makes `m_l` infinite) cannot
    /// explode the layer stack.
    fn random_level(&mut self) -> usize {
        const MAX_LEVEL: usize = 32;

        let u: f64 = self.rng.gen_range(f64::MIN_POSITIVE..1.0);
        ((-u.ln() * self.m_l).floor() as usize).min(MAX_LEVEL)
    }

    fn distance_to(&self, query: &[f64], vertex: VertexId) -> f64 {
        self.metric.distance(query, &self.vectors[vertex])
    }

    /// Greedy beam search within one layer.
    ///
    /// Candidates sit in a min-heap on distance; the running result set is a
    /// max-heap capped at `ef`, so evicting the farthest kept element is
    /// O(log ef). The loop stops once the nearest unexplored candidate is
    /// farther than the worst kept result and the result set is full.
    ///
    /// Returns the kept candidates sorted by ascending distance.
    fn search_layer(
        &self,
        level: usize,
        query: &[f64],
        ef: usize,
        entries: &[VertexId],
    ) -> Vec<Candidate> {
        let layer = &self.layers[level];
        let mut visited: HashSet<VertexId> = HashSet::new();
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &entry in entries {
            if !visited.insert(entry) {
                continue;
            }
            let seed = Candidate { vertex: entry, distance: self.distance_to(query, entry) };
            candidates.push(Reverse(seed.clone()));
            results.push(seed);
        }
        while results.len() > ef {
            results.pop();
        }

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef {
                if let Some(worst) = results.peek() {
                    if current.distance > worst.distance {
                        break;
                    }
                }
            }

            for &neighbor in layer.neighbors(current.vertex) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let distance = self.distance_to(query, neighbor);
                let admit = results.len() < ef
                    || results.peek().map_or(true, |worst| distance < worst.distance);
                if admit {
                    let candidate = Candidate { vertex: neighbor, distance };
                    candidates.push(Reverse(candidate.clone()));
                    results.push(candidate);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut kept = results.into_vec();
        kept.sort();
        kept
    }

    /// The `count` members of `ids` closest to `target`.
    fn closest(&self, target: &[f64], ids: &[VertexId], count: usize) -> Vec<VertexId> {
        let mut scored: Vec<Candidate> = ids
            .iter()
            .map(|&vertex| Candidate { vertex, distance: self.metric.distance(target, &self.vectors[vertex]) })
            .collect();
        scored.sort();
        scored.truncate(count);
        scored.into_iter().map(|c| c.vertex).collect()
    }

    fn insert_entry(&mut self, vector: Vec<f64>, rid: Rid) -> Result<()> {
        check_dimension(&mut self.dimension, &vector)?;
        let vertex = self.vectors.len();
        let target_level = self.random_level();
        self.vectors.push(vector);
        self.rids.push(rid);

        if self.vectors.len() == 1 {
            // First vertex: it alone seeds layer 0 and becomes every
            // search's starting point.
            self.layers[0].add_vertex(vertex);
            return Ok(());
        }

        let query = self.vectors[vertex].clone();
        let top = self.layers.len() - 1;
        let mut entries = vec![self.layers[top]
            .entry_point()
            .expect("nonempty index has an entry point")];

        // Greedy single-step descent above the target level: refine the
        // entry point, touch nothing.
        for level in ((target_level + 1)..=top).rev() {
            let found = self.search_layer(level, &query, 1, &entries);
            if let Some(best) = found.first() {
                entries = vec![best.vertex];
            }
        }

        // At and below the target level: wire the new vertex in.
        for level in (0..=target_level.min(top)).rev() {
            let found = self.search_layer(level, &query, self.ef_construction, &entries);
            let neighbors: Vec<VertexId> =
                found.iter().take(self.m).map(|c| c.vertex).collect();

            let cap = if level == 0 { self.m_max0 } else { self.m_max };
            self.layers[level].add_vertex(vertex);
            for &neighbor in &neighbors {
                self.layers[level].connect(vertex, neighbor);
            }
            for &neighbor in &neighbors {
                if self.layers[level].neighbors(neighbor).len() > cap {
                    let target = self.vectors[neighbor].clone();
                    let current = self.layers[level].neighbors(neighbor).to_vec();
                    let keep = self.closest(&target, &current, cap);
                    self.layers[level].shrink(neighbor, keep);
                }
            }
            entries = found.into_iter().map(|c| c.vertex).collect();
        }

        // A level draw above the current top extends the stack; the new
        // vertex is the only occupant (and entry point) of each new layer.
        for _ in self.layers.len()..=target_level {
            self.layers.push(Layer::with_vertex(vertex));
        }

        Ok(())
    }
}

impl VectorIndex for HnswIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn build(&mut self, mut data: Vec<(Vec<f64>, Rid)>) -> Result<()> {
        // Build is not a special path: shuffle for graph quality, then
        // insert one by one.
        use rand::seq::SliceRandom;
        data.shuffle(&mut self.rng);
        for (vector, rid) in data {
            self.insert_entry(vector, rid)?;
        }
        info!(
            points = self.vectors.len(),
            layers = self.layers.len(),
            "built hnsw index"
        );
        Ok(())
    }

    fn insert(&mut self, vector: Vec<f64>, rid: Rid) -> Result<()> {
        self.insert_entry(vector, rid)
    }

    fn scan(&self, query: &[f64], limit: usize) -> Result<Vec<Rid>> {
        if self.vectors.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        check_query_dimension(self.dimension, query)?;

        let top = self.layers.len() - 1;
        let mut entries = vec![self.layers[top]
            .entry_point()
            .expect("nonempty index has an entry point")];

        for level in (1..=top).rev() {
            let found = self.search_layer(level, query, 1, &entries);
            if let Some(best) = found.first() {
                entries = vec![best.vertex];
            }
        }

        let ef = self.ef_search.max(limit);
        let found = self.search_layer(0, query, ef, &entries);
        debug!(beam = ef, returned = found.len().min(limit), "hnsw scan");

        Ok(found
            .into_iter()
            .take(limit)
            .map(|c| self.rids[c.vertex])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rid(slot: u32) -> Rid {
        Rid::new(0, slot)
    }

    fn options() -> HnswOptions {
        HnswOptions { m: 4, ef_construction: 20, ef_search: 16 }
    }

    #[test]
    fn options_require_all_keys() {
        let pairs = vec![
            ("m".to_string(), 8),
            ("ef_construction".to_string(), 40),
        ];
        let err = HnswOptions::from_pairs(&pairs).unwrap_err();
        assert!(matches!(err, VectorError::MissingOption(name) if name == "ef_search"));

        let pairs = vec![
            ("m".to_string(), 8),
            ("ef_construction".to_string(), 40),
            ("ef_search".to_string(), 32),
        ];
        assert_eq!(
            HnswOptions::from_pairs(&pairs).unwrap(),
            HnswOptions { m: 8, ef_construction: 40, ef_search: 32 }
        );
    }

    #[test]
    fn empty_index_scans_empty() {
        let index = HnswIndex::with_seed(Metric::L2, &options(), 1);
        assert!(index.scan(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn single_point_answers_any_query() {
        let mut index = HnswIndex::with_seed(Metric::L2, &options(), 1);
        index.insert(vec![3.0, 4.0], rid(0)).unwrap();

        assert_eq!(index.scan(&[100.0, -50.0], 1).unwrap(), vec![rid(0)]);
        assert_eq!(index.scan(&[0.0, 0.0], 10).unwrap(), vec![rid(0)]);
        assert!(index.scan(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn nearest_point_comes_back_first() {
        let wide = HnswOptions { m: 4, ef_construction: 20, ef_search: 32 };
        let mut index = HnswIndex::with_seed(Metric::L2, &wide, 2);
        for i in 0..20 {
            index.insert(vec![f64::from(i), 0.0], rid(i as u32)).unwrap();
        }

        let hits = index.scan(&[5.2, 0.0], 3).unwrap();
        assert_eq!(hits[0], rid(5));
        assert!(hits.contains(&rid(6)) || hits.contains(&rid(4)));
    }

    #[test]
    fn scan_distances_are_non_decreasing() {
        let mut index = HnswIndex::with_seed(Metric::L2, &options(), 3);
        let points: Vec<Vec<f64>> = (0..100)
            .map(|i| vec![f64::from(i % 10), f64::from(i / 10)])
            .collect();
        for (i, point) in points.iter().enumerate() {
            index.insert(point.clone(), rid(i as u32)).unwrap();
        }

        let query = [4.3, 4.7];
        let hits = index.scan(&query, 10).unwrap();
        assert_eq!(hits.len(), 10);

        let distances: Vec<f64> = hits
            .iter()
            .map(|r| sable_vector::l2_distance(&query, &points[r.slot() as usize]))
            .collect();
        for pair in distances.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn build_shuffles_then_inserts_everything() {
        let wide = HnswOptions { m: 4, ef_construction: 20, ef_search: 64 };
        let mut index = HnswIndex::with_seed(Metric::L2, &wide, 4);
        let data: Vec<_> = (0..50)
            .map(|i| (vec![f64::from(i), 1.0], rid(i as u32)))
            .collect();
        index.build(data).unwrap();

        assert_eq!(index.len(), 50);
        let hits = index.scan(&[25.1, 1.0], 1).unwrap();
        assert_eq!(hits, vec![rid(25)]);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let mut index = HnswIndex::with_seed(Metric::L2, &options(), 5);
        index.insert(vec![1.0, 2.0], rid(0)).unwrap();

        assert!(index.insert(vec![1.0, 2.0, 3.0], rid(1)).is_err());
        assert!(index.scan(&[1.0], 1).is_err());
    }

    #[test]
    fn inner_product_convention() {
        let mut index = HnswIndex::with_seed(Metric::InnerProduct, &options(), 6);
        index
            .build(vec![
                (vec![1.0, 0.0], rid(0)),
                (vec![0.0, 1.0], rid(1)),
                (vec![1.0, 1.0], rid(2)),
                (vec![5.0, 5.0], rid(3)),
            ])
            .unwrap();

        assert_eq!(index.scan(&[1.0, 1.0], 1).unwrap(), vec![rid(3)]);
    }

    /// Every structural invariant the layered graph promises, checked after
    /// each insert of a random workload.
    fn assert_graph_invariants(index: &HnswIndex) {
        for (level, layer) in index.layers.iter().enumerate() {
            let cap = if level == 0 { index.m_max0 } else { index.m_max };
            for &vertex in layer.vertex_ids() {
                let neighbors = layer.neighbors(vertex);
                assert!(
                    neighbors.len() <= cap,
                    "degree {} over cap {} at layer {}",
                    neighbors.len(),
                    cap,
                    level
                );
                for &neighbor in neighbors {
                    assert!(
                        layer.neighbors(neighbor).contains(&vertex),
                        "asymmetric edge {} -> {} at layer {}",
                        vertex,
                        neighbor,
                        level
                    );
                }
                // Containment chain: present here means present one below.
                if level > 0 {
                    assert!(index.layers[level - 1].contains(vertex));
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn graph_invariants_hold_under_random_inserts(
            points in prop::collection::vec(prop::collection::vec(-50.0..50.0f64, 3), 1..60),
            seed in any::<u64>(),
        ) {
            let mut index = HnswIndex::with_seed(Metric::L2, &options(), seed);
            for (i, point) in points.into_iter().enumerate() {
                index.insert(point, rid(i as u32)).unwrap();
                assert_graph_invariants(&index);
            }

            // Layer 0 contains every vertex.
            prop_assert_eq!(index.layers[0].len(), index.len());
        }

        #[test]
        fn scan_returns_min_of_limit_and_len(
            points in prop::collection::vec(prop::collection::vec(-50.0..50.0f64, 3), 1..40),
            limit in 0usize..50,
        ) {
            let mut index = HnswIndex::with_seed(Metric::L2, &options(), 13);
            let n = points.len();
            for (i, point) in points.into_iter().enumerate() {
                index.insert(point, rid(i as u32)).unwrap();
            }

            let hits = index.scan(&[0.0, 0.0, 0.0], limit).unwrap();
            prop_assert_eq!(hits.len(), limit.min(n));
        }
    }
}
