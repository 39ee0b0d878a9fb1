//! Exhaustive flat index.
//!
//! Linear scan over every stored entry. O(n · d) per query, but exact: this
//! is the ground truth the ANN indexes are measured against in recall tests,
//! and the smallest implementation of the [`VectorIndex`] contract.

use tracing::debug;

use crate::traits::{check_dimension, check_query_dimension};
use crate::{Metric, Result, Rid, VectorIndex};

/// Exact nearest-neighbor index backed by a plain entry list.
pub struct FlatIndex {
    metric: Metric,
    dimension: Option<usize>,
    entries: Vec<(Vec<f64>, Rid)>,
}

impl FlatIndex {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            dimension: None,
            entries: Vec::new(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn build(&mut self, data: Vec<(Vec<f64>, Rid)>) -> Result<()> {
        for (vector, rid) in data {
            self.insert(vector, rid)?;
        }
        Ok(())
    }

    fn insert(&mut self, vector: Vec<f64>, rid: Rid) -> Result<()> {
        check_dimension(&mut self.dimension, &vector)?;
        self.entries.push((vector, rid));
        Ok(())
    }

    fn scan(&self, query: &[f64], limit: usize) -> Result<Vec<Rid>> {
        if self.entries.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        check_query_dimension(self.dimension, query)?;

        let mut scored: Vec<(f64, Rid)> = self
            .entries
            .iter()
            .map(|(vector, rid)| (self.metric.distance(query, vector), *rid))
            .collect();
        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(limit);

        debug!(candidates = self.entries.len(), returned = scored.len(), "flat scan");
        Ok(scored.into_iter().map(|(_, rid)| rid).collect())
    }
}
