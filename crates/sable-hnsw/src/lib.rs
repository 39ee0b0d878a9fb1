//! HNSW index for SableDB.
//!
//! A hierarchical navigable small world graph: layer 0 holds every vertex,
//! each layer above holds an exponentially thinning subset, and every layer
//! is a small-world graph over the vertices present in it. A query descends
//! from the sparse top layer toward layer 0, narrowing a single entry point
//! greedily, then widens into a beam search over the bottom layer.
//!
//! # Parameters
//!
//! - `m`: target degree per vertex; also the upper-layer cap `M_max`.
//!   Layer 0 caps at `m * m`.
//! - `ef_construction`: beam width while wiring a new vertex in.
//! - `ef_search`: beam width at layer 0 during a scan (widened to the scan
//!   limit when the caller asks for more).
//!
//! # Example
//!
//! ```
//! use sable_hnsw::{HnswIndex, HnswOptions};
//! use sable_vector::{Metric, Rid, VectorIndex};
//!
//! let options = HnswOptions { m: 8, ef_construction: 40, ef_search: 32 };
//! let mut index = HnswIndex::with_seed(Metric::L2, &options, 7);
//!
//! index.insert(vec![0.0, 0.0], Rid::new(0, 0)).unwrap();
//! index.insert(vec![5.0, 5.0], Rid::new(0, 1)).unwrap();
//!
//! let hits = index.scan(&[0.2, 0.1], 1).unwrap();
//! assert_eq!(hits, vec![Rid::new(0, 0)]);
//! ```

mod graph;
mod index;

pub use index::{HnswIndex, HnswOptions};
