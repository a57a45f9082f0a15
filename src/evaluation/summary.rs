//! Aggregate evaluation over many queries.
//!
//! [`evaluate_store`] uses every image of a store as a query in turn (the
//! query itself stays in the database, exactly as in an interactive search)
//! and summarizes the per-query curves.

use std::time::Instant;

use serde::Serialize;

use super::curve::{evaluate, RecallPrecisionSeries};
use crate::distance::Metric;
use crate::error::{CbirError, Result};
use crate::knn::rank;
use crate::store::{FeatureStore, ImageId};

/// Evaluation result for a single query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryEvaluation {
    pub query: ImageId,
    pub average_precision: f32,
    pub r_precision: f32,
    pub final_recall: f32,
    pub latency_us: u64,
}

/// Aggregated evaluation results.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub model: String,
    pub metric: Metric,
    pub n_queries: usize,
    pub window: usize,

    /// Mean average precision.
    pub map: f32,
    pub mean_r_precision: f32,
    pub mean_final_recall: f32,

    pub mean_latency_us: f64,
    pub p50_latency_us: u64,
    pub p99_latency_us: u64,

    /// Per-rank mean of the query curves.
    pub mean_curve: RecallPrecisionSeries,
}

impl EvaluationSummary {
    /// One-line summary string.
    pub fn summary(&self) -> String {
        format!(
            "{}[{}]: queries={}, mAP={:.3}, R-prec={:.3}, recall@{}={:.3}, p50={}us",
            self.model,
            self.metric,
            self.n_queries,
            self.map,
            self.mean_r_precision,
            self.window,
            self.mean_final_recall,
            self.p50_latency_us,
        )
    }
}

/// Per-rank mean of several curves; ranks missing from shorter curves are
/// averaged over the curves that have them.
pub fn mean_curve(curves: &[RecallPrecisionSeries]) -> RecallPrecisionSeries {
    let len = curves.iter().map(RecallPrecisionSeries::len).max().unwrap_or(0);
    let mut out = RecallPrecisionSeries {
        recall: vec![0.0; len],
        precision: vec![0.0; len],
    };
    let mut counts = vec![0u32; len];
    for c in curves {
        for i in 0..c.len() {
            out.recall[i] += c.recall[i];
            out.precision[i] += c.precision[i];
            counts[i] += 1;
        }
    }
    for (i, &n) in counts.iter().enumerate() {
        out.recall[i] /= n as f32;
        out.precision[i] /= n as f32;
    }
    out
}

/// Use every stored image as a query and summarize.
pub fn evaluate_store(
    store: &FeatureStore,
    metric: Metric,
    window: usize,
    class_size: u64,
) -> Result<EvaluationSummary> {
    if window == 0 {
        return Err(CbirError::InvalidInput("evaluation window must be positive".into()));
    }

    let mut evaluations = Vec::with_capacity(store.len());
    let mut curves = Vec::with_capacity(store.len());

    for (id, vector) in store.iter() {
        let start = Instant::now();
        let ranked = rank(vector, store, metric, window)?;
        let elapsed = start.elapsed();

        let curve = evaluate(&ranked, id.class(class_size)?, class_size)?;
        evaluations.push(QueryEvaluation {
            query: id.clone(),
            average_precision: curve.average_precision(class_size),
            r_precision: curve.r_precision(class_size),
            final_recall: curve.final_recall(),
            latency_us: elapsed.as_micros() as u64,
        });
        curves.push(curve);
    }

    let summary = summarize(store.model(), metric, window, &evaluations, mean_curve(&curves));
    tracing::info!(summary = %summary.summary(), "evaluated feature store");
    Ok(summary)
}

fn summarize(
    model: &str,
    metric: Metric,
    window: usize,
    evaluations: &[QueryEvaluation],
    mean_curve: RecallPrecisionSeries,
) -> EvaluationSummary {
    let n = evaluations.len();
    let mean = |f: fn(&QueryEvaluation) -> f32| -> f32 {
        if n == 0 {
            0.0
        } else {
            evaluations.iter().map(f).sum::<f32>() / n as f32
        }
    };

    let mut latencies: Vec<u64> = evaluations.iter().map(|e| e.latency_us).collect();
    latencies.sort_unstable();
    let (mean_latency_us, p50_latency_us, p99_latency_us) = if n == 0 {
        (0.0, 0, 0)
    } else {
        (
            latencies.iter().sum::<u64>() as f64 / n as f64,
            latencies[n / 2],
            latencies[(n * 99) / 100],
        )
    };

    EvaluationSummary {
        model: model.to_string(),
        metric,
        n_queries: n,
        window,
        map: mean(|e| e.average_precision),
        mean_r_precision: mean(|e| e.r_precision),
        mean_final_recall: mean(|e| e.final_recall),
        mean_latency_us,
        p50_latency_us,
        p99_latency_us,
        mean_curve,
    }
}
