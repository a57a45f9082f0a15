//! Cumulative recall-precision curves over a ranked list.
//!
//! Relevance comes from the dataset's naming convention: image `n` belongs
//! to class `n / class_size`, and a neighbor is relevant when its class
//! equals the query's. Recall divides by `class_size`, i.e. it assumes every
//! class has exactly `class_size` members. That is true of the datasets the
//! stored indexes come from, not of datasets in general.

use serde::{Deserialize, Serialize};

use crate::error::{CbirError, Result};
use crate::knn::Neighbor;
use crate::store::ImageId;

/// Images per ground-truth class in the reference datasets.
pub const DEFAULT_CLASS_SIZE: u64 = 100;

/// One point of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub recall: f32,
    pub precision: f32,
}

/// Recall and precision after each rank position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallPrecisionSeries {
    pub recall: Vec<f32>,
    pub precision: Vec<f32>,
}

impl RecallPrecisionSeries {
    pub fn len(&self) -> usize {
        self.recall.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recall.is_empty()
    }

    /// `(recall, precision)` pairs in rank order.
    pub fn points(&self) -> Vec<CurvePoint> {
        self.recall
            .iter()
            .zip(self.precision.iter())
            .map(|(&recall, &precision)| CurvePoint { recall, precision })
            .collect()
    }

    /// Precision after the first `n` results (`n` clamped to the length).
    pub fn precision_at(&self, n: usize) -> f32 {
        match n.min(self.len()) {
            0 => 0.0,
            n => self.precision[n - 1],
        }
    }

    /// Recall after the whole list.
    pub fn final_recall(&self) -> f32 {
        self.recall.last().copied().unwrap_or(0.0)
    }

    /// Mean of the precision values at the ranks where recall increased,
    /// divided by the number of relevant items (`class_size`).
    pub fn average_precision(&self, class_size: u64) -> f32 {
        if class_size == 0 {
            return 0.0;
        }
        let mut prev = 0.0;
        let mut total = 0.0;
        for (&r, &p) in self.recall.iter().zip(self.precision.iter()) {
            if r > prev {
                total += p;
                prev = r;
            }
        }
        total / class_size as f32
    }

    /// Precision at rank `class_size` (R-precision).
    pub fn r_precision(&self, class_size: u64) -> f32 {
        self.precision_at(class_size as usize)
    }
}

/// Build the curve for a ranked list.
///
/// Fails with [`CbirError::IdentifierParse`] on a neighbor id without a
/// numeric prefix and with [`CbirError::InvalidInput`] for `class_size == 0`.
pub fn evaluate(neighbors: &[Neighbor], query_class: u64, class_size: u64) -> Result<RecallPrecisionSeries> {
    evaluate_ids(neighbors.iter().map(|n| &n.id), query_class, class_size)
}

/// [`evaluate`] over bare ids.
pub fn evaluate_ids<'a, I>(ids: I, query_class: u64, class_size: u64) -> Result<RecallPrecisionSeries>
where
    I: IntoIterator<Item = &'a ImageId>,
{
    if class_size == 0 {
        return Err(CbirError::InvalidInput("class size must be positive".into()));
    }

    let ids = ids.into_iter();
    let (lower, _) = ids.size_hint();
    let mut series = RecallPrecisionSeries {
        recall: Vec::with_capacity(lower),
        precision: Vec::with_capacity(lower),
    };

    let mut true_positive = 0u64;
    let mut false_positive = 0u64;
    for id in ids {
        if id.class(class_size)? == query_class {
            true_positive += 1;
        } else {
            false_positive += 1;
        }
        series.recall.push(true_positive as f32 / class_size as f32);
        series
            .precision
            .push(true_positive as f32 / (true_positive + false_positive) as f32);
    }
    Ok(series)
}
