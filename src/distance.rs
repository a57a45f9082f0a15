//! Similarity and distance metrics between feature vectors.
//!
//! Five metrics are supported. Two are distances (lower is more similar) and
//! three are similarities (higher is more similar); each declares its
//! [`SortOrder`] so the ranker never has to guess.
//!
//! | Metric | Formula | Order |
//! |--------|---------|-------|
//! | Euclidean | $\sqrt{\sum (a_i - b_i)^2}$ over the shared prefix | ascending |
//! | Bhattacharyya | $\sqrt{1 - \sqrt{\sum a_i b_i} / \sqrt{\sum a \cdot \sum b}}$ | ascending |
//! | Cosine | $\langle a,b \rangle / (\lVert a \rVert \lVert b \rVert)$ | descending |
//! | Correlation | Pearson correlation of the two histograms | descending |
//! | Intersection | $\sum \min(a_i, b_i)$ | descending |
//!
//! ## Important nuance
//!
//! The Bhattacharyya variant here takes the square root of the summed
//! products, not the sum of per-bin square roots. It is the form the stored
//! indexes were evaluated with, so it is kept. Its inner term is clamped to
//! `[0, 1]` before the outer square root; without the clamp, floating-point
//! noise on near-identical histograms produces NaN, which would silently
//! corrupt a sort.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CbirError, Result};
use crate::ops;

/// Direction in which scores are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smaller scores first (distances).
    Ascending,
    /// Larger scores first (similarities).
    Descending,
}

impl SortOrder {
    /// Compare two scores so that the more relevant one sorts first.
    #[inline]
    pub fn compare(self, a: f32, b: f32) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => a.total_cmp(&b),
            SortOrder::Descending => b.total_cmp(&a),
        }
    }
}

/// Metric used to compare a query against stored vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Bhattacharyya distance, clamped.
    Bhattacharyya,
    /// Cosine similarity.
    Cosine,
    /// Histogram correlation.
    Correlation,
    /// Histogram intersection.
    Intersection,
}

impl Metric {
    /// Every supported metric, in display order.
    pub const ALL: [Metric; 5] = [
        Metric::Euclidean,
        Metric::Cosine,
        Metric::Bhattacharyya,
        Metric::Correlation,
        Metric::Intersection,
    ];

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Euclidean => "Euclidean",
            Metric::Bhattacharyya => "Bhattacharyya",
            Metric::Cosine => "Cosine",
            Metric::Correlation => "Correlation",
            Metric::Intersection => "Intersection",
        }
    }

    /// Declared ranking direction.
    #[inline]
    pub fn sort_order(self) -> SortOrder {
        match self {
            Metric::Euclidean | Metric::Bhattacharyya => SortOrder::Ascending,
            Metric::Cosine | Metric::Correlation | Metric::Intersection => SortOrder::Descending,
        }
    }

    /// Whether lower scores mean more similar.
    #[inline]
    pub fn is_distance(self) -> bool {
        self.sort_order() == SortOrder::Ascending
    }

    /// Score `b` against `a`.
    ///
    /// Never returns a non-finite value: NaN or infinity is reported as
    /// [`CbirError::Numeric`].
    pub fn score(self, a: &[f32], b: &[f32]) -> Result<f32> {
        let s = match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Bhattacharyya => bhattacharyya(a, b)?,
            Metric::Cosine => cosine_similarity(a, b)?,
            Metric::Correlation => correlation(a, b)?,
            Metric::Intersection => intersection(a, b)?,
        };
        if !s.is_finite() {
            return Err(CbirError::numeric(self.as_str(), format!("non-finite score {s}")));
        }
        Ok(s)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CbirError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "euclidienne" | "l2" => Ok(Metric::Euclidean),
            "bhattacharyya" => Ok(Metric::Bhattacharyya),
            "cosine" | "cosinesimilarity" | "cosine_similarity" => Ok(Metric::Cosine),
            "correlation" => Ok(Metric::Correlation),
            "intersection" => Ok(Metric::Intersection),
            _ => Err(CbirError::UnsupportedMetric(s.to_string())),
        }
    }
}

/// Score two vectors under a metric named at runtime.
pub fn score(a: &[f32], b: &[f32], metric_name: &str) -> Result<f32> {
    metric_name.parse::<Metric>()?.score(a, b)
}

fn same_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(CbirError::DimensionMismatch {
            query_dim: a.len(),
            doc_dim: b.len(),
        });
    }
    Ok(())
}

/// Euclidean distance over `min(|a|, |b|)` components.
#[inline]
#[must_use]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    ops::l2_distance(a, b)
}

/// Bhattacharyya distance, in `[0, 1]`.
///
/// Fails when either histogram sums to zero (or the sums have opposite sign).
pub fn bhattacharyya(a: &[f32], b: &[f32]) -> Result<f32> {
    same_len(a, b)?;
    let den = ops::sum(a) * ops::sum(b);
    if den <= 0.0 || !den.is_finite() {
        return Err(CbirError::numeric(
            "Bhattacharyya",
            format!("histogram sum product is {den}"),
        ));
    }
    let num = ops::dot(a, b).max(0.0).sqrt();
    let inner = (1.0 - num / den.sqrt()).clamp(0.0, 1.0);
    Ok(inner.sqrt())
}

/// Cosine similarity; 0 when either vector has zero norm.
///
/// Accumulates in f64 so tiny and very large components keep `cos(v, v) == 1`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    same_len(a, b)?;
    let na = ops::dot_f64(a, a).sqrt();
    let nb = ops::dot_f64(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok((ops::dot_f64(a, b) / (na * nb)) as f32)
}

/// Pearson correlation between two histograms, accumulated in f64.
///
/// A constant histogram has no variance; the result is then 1.0, which is
/// what histogram-compare routines conventionally return.
pub fn correlation(a: &[f32], b: &[f32]) -> Result<f32> {
    same_len(a, b)?;
    let ma = ops::mean_f64(a);
    let mb = ops::mean_f64(b);
    let (mut sab, mut saa, mut sbb) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let da = f64::from(*x) - ma;
        let db = f64::from(*y) - mb;
        sab += da * db;
        saa += da * da;
        sbb += db * db;
    }
    let den = saa * sbb;
    if den <= f64::EPSILON {
        return Ok(1.0);
    }
    Ok((sab / den.sqrt()) as f32)
}

/// Histogram intersection.
pub fn intersection(a: &[f32], b: &[f32]) -> Result<f32> {
    same_len(a, b)?;
    Ok(ops::min_sum(a, b))
}
