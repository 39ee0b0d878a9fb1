//! IVFFlat index for SableDB.
//!
//! An inverted-file flat index partitions the vector space with k-means and
//! stores every entry in the bucket of its nearest centroid. A query ranks
//! the centroids, probes only the closest `probe_lists` buckets, and sorts
//! the candidates it finds there exhaustively.
//!
//! Recall degrades gracefully with fewer probes; `probe_lists = lists` makes
//! the scan exact over the whole data set.
//!
//! # Example
//!
//! ```
//! use sable_ivfflat::{IvfFlatIndex, IvfFlatOptions};
//! use sable_vector::{Metric, Rid, VectorIndex};
//!
//! let options = IvfFlatOptions { lists: 2, probe_lists: 2 };
//! let mut index = IvfFlatIndex::with_seed(Metric::L2, &options, 42);
//!
//! let data = vec![
//!     (vec![0.0, 0.0], Rid::new(0, 0)),
//!     (vec![0.1, 0.0], Rid::new(0, 1)),
//!     (vec![9.0, 9.0], Rid::new(0, 2)),
//! ];
//! index.build(data).unwrap();
//!
//! let hits = index.scan(&[0.0, 0.1], 2).unwrap();
//! assert_eq!(hits, vec![Rid::new(0, 0), Rid::new(0, 1)]);
//! ```

mod index;
mod kmeans;

pub use index::{IvfFlatIndex, IvfFlatOptions};
