//! The vector index contract.

use crate::{Metric, Result, Rid, VectorError};

/// Common interface for the ANN indexes.
///
/// Indexes are single-writer: `build` and `insert` take `&mut self` and run
/// lock-free in the caller's thread. Shared access (DDL vs. concurrent scans)
/// is the catalog's concern, not the index's.
///
/// The dimension of an index is fixed by the first vector it sees; every
/// later vector must match or the operation fails with
/// [`VectorError::DimensionMismatch`].
pub trait VectorIndex: Send + Sync {
    /// The metric this index was created with.
    fn metric(&self) -> Metric;

    /// The fixed dimension, or `None` before any vector has been seen.
    fn dimension(&self) -> Option<usize>;

    /// Number of `(vector, rid)` entries the index holds.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed the index with an initial set of entries.
    ///
    /// Called once, right after creation. Whether an underfull data set is an
    /// error or a tolerated no-op is up to the implementation.
    fn build(&mut self, data: Vec<(Vec<f64>, Rid)>) -> Result<()>;

    /// Add a single entry.
    fn insert(&mut self, vector: Vec<f64>, rid: Rid) -> Result<()>;

    /// Return the rids of (approximately) the `limit` entries nearest to
    /// `query`, ordered by ascending distance.
    ///
    /// A scan of an empty index returns an empty list, never an error.
    fn scan(&self, query: &[f64], limit: usize) -> Result<Vec<Rid>>;
}

/// Record the index dimension from the first vector seen, or verify a later
/// vector against it. Zero-length vectors are rejected outright.
pub fn check_dimension(dimension: &mut Option<usize>, vector: &[f64]) -> Result<()> {
    if vector.is_empty() {
        return Err(VectorError::DimensionMismatch {
            expected: dimension.unwrap_or(1),
            actual: 0,
        });
    }
    match *dimension {
        Some(expected) if expected != vector.len() => Err(VectorError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        Some(_) => Ok(()),
        None => {
            *dimension = Some(vector.len());
            Ok(())
        }
    }
}

/// Verify a query vector against an already-fixed dimension.
pub fn check_query_dimension(dimension: Option<usize>, vector: &[f64]) -> Result<()> {
    let mut dim = dimension;
    check_dimension(&mut dim, vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vector_fixes_dimension() {
        let mut dim = None;
        check_dimension(&mut dim, &[1.0, 2.0]).unwrap();
        assert_eq!(dim, Some(2));

        let err = check_dimension(&mut dim, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn empty_vector_rejected() {
        let mut dim = None;
        assert!(check_dimension(&mut dim, &[]).is_err());
        assert_eq!(dim, None);
    }
}
