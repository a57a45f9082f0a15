//! Exhaustive k-nearest-neighbor ranking.
//!
//! Every stored vector is scored against the query; there is no index. For
//! the database sizes this crate targets (a few thousand images) a linear
//! scan is both exact and fast enough.
//!
//! With the `parallel` feature the scan runs on rayon. Scores are collected
//! in store order either way, and the sort that follows is stable and
//! single-threaded, so equal scores always keep store order.

use serde::{Deserialize, Serialize};

use crate::distance::Metric;
use crate::error::{CbirError, Result};
use crate::store::{FeatureStore, ImageId};

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: ImageId,
    pub score: f32,
}

/// Rank the whole store against `query` and keep the best `k`.
///
/// `k` larger than the store returns the entire sorted store. Fails with
/// [`CbirError::InvalidInput`] for `k == 0` and with whatever the metric
/// reports for any stored vector.
pub fn rank(query: &[f32], store: &FeatureStore, metric: Metric, k: usize) -> Result<Vec<Neighbor>> {
    if k == 0 {
        return Err(CbirError::InvalidInput("k must be positive".into()));
    }

    let mut scored = score_all(query, store, metric)?;
    let order = metric.sort_order();
    scored.sort_by(|a, b| order.compare(a.1, b.1));
    scored.truncate(k);

    tracing::debug!(
        model = store.model(),
        %metric,
        scanned = store.len(),
        returned = scored.len(),
        "ranked feature store"
    );

    Ok(scored
        .into_iter()
        .map(|(i, score)| Neighbor {
            id: store.ids()[i].clone(),
            score,
        })
        .collect())
}

/// Rank with the metric named at runtime.
pub fn rank_by_name(
    query: &[f32],
    store: &FeatureStore,
    metric_name: &str,
    k: usize,
) -> Result<Vec<Neighbor>> {
    rank(query, store, metric_name.parse()?, k)
}

#[cfg(feature = "parallel")]
fn score_all(query: &[f32], store: &FeatureStore, metric: Metric) -> Result<Vec<(usize, f32)>> {
    use rayon::prelude::*;

    (0..store.len())
        .into_par_iter()
        .map(|i| metric.score(query, store.vector(i)).map(|s| (i, s)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn score_all(query: &[f32], store: &FeatureStore, metric: Metric) -> Result<Vec<(usize, f32)>> {
    (0..store.len())
        .map(|i| metric.score(query, store.vector(i)).map(|s| (i, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FeatureStore {
        FeatureStore::from_entries(
            "test",
            vec![
                ("img1", vec![1.0, 0.0, 0.0]),
                ("img2", vec![0.0, 1.0, 0.0]),
                ("img3", vec![1.0, 0.0, 0.0]),
            ],
        )
        .unwrap()
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<&str> {
        neighbors.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn ties_keep_store_order() {
        let result = rank(&[1.0, 0.0, 0.0], &store(), Metric::Euclidean, 2).unwrap();
        assert_eq!(ids(&result), vec!["img1", "img3"]);
        assert!(result.iter().all(|n| n.score == 0.0));
    }

    #[test]
    fn similarity_metrics_sort_descending() {
        let result = rank(&[0.0, 1.0, 0.0], &store(), Metric::Cosine, 3).unwrap();
        assert_eq!(result[0].id.as_str(), "img2");
        assert!((result[0].score - 1.0).abs() < 1e-6);
        assert_eq!(ids(&result[1..]), vec!["img1", "img3"]);
    }

    #[test]
    fn k_larger_than_store() {
        let result = rank(&[1.0, 0.0, 0.0], &store(), Metric::Euclidean, 50).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[2].id.as_str(), "img2");
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(matches!(
            rank(&[1.0, 0.0, 0.0], &store(), Metric::Euclidean, 0),
            Err(CbirError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_metric_name() {
        assert!(matches!(
            rank_by_name(&[1.0, 0.0, 0.0], &store(), "Chebyshev", 2),
            Err(CbirError::UnsupportedMetric(_))
        ));
    }

    #[test]
    fn metric_errors_abort_the_scan() {
        // Bhattacharyya on a zero-sum query.
        assert!(matches!(
            rank(&[0.0, 0.0, 0.0], &store(), Metric::Bhattacharyya, 2),
            Err(CbirError::Numeric { .. })
        ));
    }
}
