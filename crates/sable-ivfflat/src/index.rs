//! The IVFFlat index proper.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sable_vector::{
    check_dimension, check_query_dimension, Metric, Result, Rid, VectorError, VectorIndex,
};

use crate::kmeans::{nearest_centroid, refine_centroids, sample_initial_centroids};

/// Fixed Lloyd iteration budget; no convergence early-exit.
const LLOYD_ITERATIONS: usize = 500;

/// IVFFlat construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfFlatOptions {
    /// Number of k-means centroids (buckets).
    pub lists: usize,
    /// Number of buckets probed per query.
    pub probe_lists: usize,
}

impl IvfFlatOptions {
    /// Parse from `(name, value)` DDL option pairs. Both `lists` and
    /// `probe_lists` are required.
    pub fn from_pairs(pairs: &[(String, i64)]) -> Result<Self> {
        let mut lists = None;
        let mut probe_lists = None;
        for (name, value) in pairs {
            match name.as_str() {
                "lists" => lists = Some(*value as usize),
                "probe_lists" => probe_lists = Some(*value as usize),
                _ => {}
            }
        }
        let lists = lists.ok_or_else(|| VectorError::MissingOption("lists".to_string()))?;
        let probe_lists =
            probe_lists.ok_or_else(|| VectorError::MissingOption("probe_lists".to_string()))?;
        Ok(Self { lists, probe_lists })
    }
}

/// Inverted-file flat index: k-means centroids plus one bucket of owned
/// `(vector, rid)` entries per centroid.
///
/// The index stays empty until [`VectorIndex::build`] succeeds with at least
/// `lists` points; scans against an unbuilt index return nothing.
pub struct IvfFlatIndex {
    metric: Metric,
    lists: usize,
    probe_lists: usize,
    dimension: Option<usize>,
    centroids: Vec<Vec<f64>>,
    buckets: Vec<Vec<(Vec<f64>, Rid)>>,
    rng: StdRng,
}

impl IvfFlatIndex {
    /// Create an index seeded from system entropy.
    pub fn new(metric: Metric, options: &IvfFlatOptions) -> Self {
        Self::from_rng(metric, options, StdRng::from_entropy())
    }

    /// Create an index with a deterministic PRNG seed.
    pub fn with_seed(metric: Metric, options: &IvfFlatOptions, seed: u64) -> Self {
        Self::from_rng(metric, options, StdRng::seed_from_u64(seed))
    }

    fn from_rng(metric: Metric, options: &IvfFlatOptions, rng: StdRng) -> Self {
        Self {
            metric,
            lists: options.lists,
            probe_lists: options.probe_lists,
            dimension: None,
            centroids: Vec::new(),
            buckets: Vec::new(),
            rng,
        }
    }

    /// Indices of the `count` centroids closest to `query`, nearest first.
    fn nearest_centroids(&self, query: &[f64], count: usize) -> Vec<usize> {
        let mut ranked: Vec<(f64, usize)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, centroid)| (self.metric.distance(query, centroid), i))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.truncate(count);
        ranked.into_iter().map(|(_, i)| i).collect()
    }
}

impl VectorIndex for IvfFlatIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    fn build(&mut self, data: Vec<(Vec<f64>, Rid)>) -> Result<()> {
        for (vector, _) in &data {
            check_dimension(&mut self.dimension, vector)?;
        }
        if self.lists == 0 || data.len() < self.lists {
            // Tolerated: tiny data sets leave the index empty and searchable.
            warn!(
                points = data.len(),
                lists = self.lists,
                "ivfflat build skipped: fewer points than lists"
            );
            return Ok(());
        }

        self.centroids = sample_initial_centroids(&data, self.lists, &mut self.rng);
        for iteration in 0..LLOYD_ITERATIONS {
            self.centroids = refine_centroids(&data, &self.centroids, self.metric);
            if iteration % 100 == 0 {
                debug!(iteration, "ivfflat refinement");
            }
        }

        self.buckets = vec![Vec::new(); self.lists];
        for (vector, rid) in data {
            let bucket = nearest_centroid(&vector, &self.centroids, self.metric);
            self.buckets[bucket].push((vector, rid));
        }

        info!(points = self.len(), lists = self.lists, "built ivfflat index");
        Ok(())
    }

    fn insert(&mut self, vector: Vec<f64>, rid: Rid) -> Result<()> {
        check_dimension(&mut self.dimension, &vector)?;
        if self.centroids.is_empty() {
            // The index is defined to be empty until a successful build.
            warn!(%rid, "ivfflat insert before build dropped");
            return Ok(());
        }
        let bucket = nearest_centroid(&vector, &self.centroids, self.metric);
        self.buckets[bucket].push((vector, rid));
        Ok(())
    }

    fn scan(&self, query: &[f64], limit: usize) -> Result<Vec<Rid>> {
        if self.centroids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        check_query_dimension(self.dimension, query)?;

        let probes = self.nearest_centroids(query, self.probe_lists.min(self.centroids.len()));
        let mut candidates: Vec<(f64, Rid)> = Vec::new();
        for bucket in &probes {
            for (vector, rid) in &self.buckets[*bucket] {
                candidates.push((self.metric.distance(query, vector), *rid));
            }
        }
        // Stable sort: ties keep bucket-scan order.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(limit);

        debug!(
            probed = probes.len(),
            returned = candidates.len(),
            "ivfflat scan"
        );
        Ok(candidates.into_iter().map(|(_, rid)| rid).collect())
    }
}
