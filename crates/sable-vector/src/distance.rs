//! Distance metrics.
//!
//! All three metrics follow the smaller-is-closer convention used everywhere
//! in the engine:
//!
//! - **L2**: straight-line distance, `sqrt(sum((a[i] - b[i])^2))`
//! - **InnerProduct**: `-(a · b)`, negated so a larger dot product sorts first
//! - **Cosine**: `1 - (a · b) / (|a| * |b|)`, defined as `1.0` when either
//!   vector has zero norm
//!
//! Accumulation is in `f64` throughout. The cosine kernel runs a full single
//! pass over both operands; it never exits early on a zero partial sum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance metric for a vector index.
///
/// An index is created with one metric and uses it for both construction and
/// query. The SQL-level distance functions map onto the variants via
/// [`Metric::from_function_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Euclidean distance.
    L2,
    /// Negated dot product.
    InnerProduct,
    /// One minus cosine similarity.
    Cosine,
}

impl Metric {
    /// Compute the distance between two vectors under this metric.
    ///
    /// Lower means closer for every variant.
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::L2 => l2_distance(a, b),
            Metric::InnerProduct => -inner_product(a, b),
            Metric::Cosine => cosine_distance(a, b),
        }
    }

    /// Resolve a SQL distance-function name to its metric.
    ///
    /// ```
    /// use sable_vector::Metric;
    ///
    /// assert_eq!(Metric::from_function_name("l2_dist").unwrap(), Metric::L2);
    /// assert!(Metric::from_function_name("no_such_fn").is_err());
    /// ```
    pub fn from_function_name(name: &str) -> crate::Result<Metric> {
        match name {
            "l2_dist" => Ok(Metric::L2),
            "inner_product" => Ok(Metric::InnerProduct),
            "cosine_similarity" => Ok(Metric::Cosine),
            other => Err(crate::VectorError::UnsupportedMetric(other.to_string())),
        }
    }

    /// The SQL distance-function name this metric binds to.
    pub fn function_name(&self) -> &'static str {
        match self {
            Metric::L2 => "l2_dist",
            Metric::InnerProduct => "inner_product",
            Metric::Cosine => "cosine_similarity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// Euclidean (L2) distance between two vectors.
///
/// # Example
///
/// ```
/// use sable_vector::l2_distance;
///
/// let dist = l2_distance(&[0.0, 0.0], &[3.0, 4.0]);
/// assert!((dist - 5.0).abs() < 1e-12);
/// ```
#[inline]
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut sum = 0.0;
    for i in 0..a.len() {
        let d = a[i] - b[i];
        sum += d * d;
    }
    sum.sqrt()
}

/// Dot product of two vectors.
///
/// Higher means more similar; negate it for use as a distance.
///
/// # Example
///
/// ```
/// use sable_vector::inner_product;
///
/// let ip = inner_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
/// assert!((ip - 32.0).abs() < 1e-12);
/// ```
#[inline]
pub fn inner_product(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut sum = 0.0;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// Cosine distance: `1 - cosine_similarity`.
///
/// Ranges over `[0, 2]`: 0 for identical direction, 1 for orthogonal, 2 for
/// opposite. Defined as `1.0` when either operand has zero norm.
///
/// # Example
///
/// ```
/// use sable_vector::cosine_distance;
///
/// assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
/// ```
#[inline]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    // One pass for the dot product and both squared norms. Zero partial sums
    // are not a stopping condition: a later component can still contribute.
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        return 1.0;
    }
    1.0 - dot / denom
}
