//! Vector search primitives for SableDB.
//!
//! This crate is the leaf of the vector subsystem. It provides:
//!
//! - **Distance metrics**: L2, (negated) inner product, cosine distance
//! - **`Rid`**: the opaque row handle indexes hand back to the executor
//! - **`VectorIndex` trait**: the contract every ANN index implements
//! - **`FlatIndex`**: exhaustive linear scan, the correctness baseline
//!
//! # Architecture
//!
//! The index crates stack on top of this one:
//!
//! ```text
//! sable-query             planner rule + VectorIndexScan executor
//!      │
//!      ├── sable-ivfflat  k-means inverted file
//!      ├── sable-hnsw     layered proximity graph
//!      │
//!      └── sable-vector   distance kernel, Rid, trait, flat baseline
//! ```
//!
//! # Example
//!
//! ```
//! use sable_vector::{FlatIndex, Metric, Rid, VectorIndex};
//!
//! let mut index = FlatIndex::new(Metric::L2);
//! index.insert(vec![0.0, 0.0], Rid::new(0, 0)).unwrap();
//! index.insert(vec![3.0, 4.0], Rid::new(0, 1)).unwrap();
//!
//! let hits = index.scan(&[0.1, 0.1], 1).unwrap();
//! assert_eq!(hits, vec![Rid::new(0, 0)]);
//! ```

mod distance;
mod flat;
mod rid;
mod traits;

pub use distance::{cosine_distance, inner_product, l2_distance, Metric};
pub use flat::FlatIndex;
pub use rid::Rid;
pub use traits::{check_dimension, check_query_dimension, VectorIndex};

/// Error type shared by the vector subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// A required index option was absent at construction time.
    #[error("missing index option: {0}")]
    MissingOption(String),

    /// A vector's length differs from the index's fixed dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The index holds no entries. Scans translate this to an empty result
    /// instead of surfacing it.
    #[error("index is empty")]
    EmptyIndex,

    /// A distance function was requested that the index was not built for.
    #[error("unsupported distance metric: {0}")]
    UnsupportedMetric(String),

    /// A plan referenced an index that no longer exists.
    #[error("index not found: {0}")]
    IndexNotFound(String),
}

/// Result type for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;
