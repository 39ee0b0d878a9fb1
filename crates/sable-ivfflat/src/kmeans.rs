//! Lloyd's algorithm pieces used by the IVFFlat build.

use rand::rngs::StdRng;
use rand::seq::index;

use sable_vector::{Metric, Rid};

/// Index of the centroid nearest to `vector` under `metric`.
///
/// Callers guarantee `centroids` is nonempty.
pub(crate) fn nearest_centroid(vector: &[f64], centroids: &[Vec<f64>], metric: Metric) -> usize {
    debug_assert!(!centroids.is_empty());

    let mut best = 0;
    let mut best_dist = metric.distance(vector, &centroids[0]);
    for (i, centroid) in centroids.iter().enumerate().skip(1) {
        let dist = metric.distance(vector, centroid);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Draw `k` distinct vectors from `data` as initial centroids.
///
/// Sampling is without replacement; callers guarantee `data.len() >= k`.
pub(crate) fn sample_initial_centroids(
    data: &[(Vec<f64>, Rid)],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f64>> {
    debug_assert!(data.len() >= k);

    index::sample(rng, data.len(), k)
        .into_iter()
        .map(|i| data[i].0.clone())
        .collect()
}

/// One Lloyd iteration: assign every point to its nearest centroid, then
/// replace each centroid with the mean of its assigned points.
///
/// A centroid that attracted no points keeps its previous position.
pub(crate) fn refine_centroids(
    data: &[(Vec<f64>, Rid)],
    centroids: &[Vec<f64>],
    metric: Metric,
) -> Vec<Vec<f64>> {
    let dim = centroids[0].len();
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (vector, _) in data {
        let assigned = nearest_centroid(vector, centroids, metric);
        for (acc, component) in sums[assigned].iter_mut().zip(vector.iter()) {
            *acc += component;
        }
        counts[assigned] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .map(|(i, (sum, count))| {
            if count == 0 {
                centroids[i].clone()
            } else {
                sum.into_iter().map(|component| component / count as f64).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn entry(v: Vec<f64>, slot: u32) -> (Vec<f64>, Rid) {
        (v, Rid::new(0, slot))
    }

    #[test]
    fn nearest_centroid_tracks_the_minimum() {
        let centroids = vec![vec![10.0, 10.0], vec![0.0, 0.0], vec![5.0, 5.0]];
        assert_eq!(nearest_centroid(&[0.2, 0.1], &centroids, Metric::L2), 1);
        assert_eq!(nearest_centroid(&[9.0, 9.5], &centroids, Metric::L2), 0);
    }

    #[test]
    fn sampling_is_without_replacement() {
        let data: Vec<_> = (0..10).map(|i| entry(vec![f64::from(i)], i as u32)).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let mut sampled = sample_initial_centroids(&data, 10, &mut rng);
        sampled.sort_by(|a, b| a[0].total_cmp(&b[0]));
        let values: Vec<f64> = sampled.into_iter().map(|v| v[0]).collect();
        assert_eq!(values, (0..10).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn refinement_moves_centroids_to_cluster_means() {
        let data = vec![
            entry(vec![0.0, 0.0], 0),
            entry(vec![2.0, 0.0], 1),
            entry(vec![10.0, 10.0], 2),
            entry(vec![12.0, 10.0], 3),
        ];
        let centroids = vec![vec![1.0, 1.0], vec![11.0, 9.0]];

        let refined = refine_centroids(&data, &centroids, Metric::L2);
        assert_eq!(refined[0], vec![1.0, 0.0]);
        assert_eq!(refined[1], vec![11.0, 10.0]);
    }

    #[test]
    fn starved_centroid_keeps_its_position() {
        let data = vec![entry(vec![0.0], 0), entry(vec![1.0], 1)];
        // Both points are closest to the first centroid.
        let centroids = vec![vec![0.5], vec![100.0]];

        let refined = refine_centroids(&data, &centroids, Metric::L2);
        assert_eq!(refined[1], vec![100.0]);
    }
}
