//! Error types for cbir-core.

use thiserror::Error;

/// Errors that can occur while loading features, ranking or evaluating.
#[derive(Debug, Error)]
pub enum CbirError {
    /// Malformed or out-of-range request field (k, window sizes, model name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The repository holds no records for the requested model.
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// The query identifier does not resolve to a stored vector.
    #[error("query image not in store: {0}")]
    QueryNotFound(String),

    /// A record could not be turned into a feature vector.
    #[error("corrupt record {source_name}: {reason}")]
    CorruptRecord { source_name: String, reason: String },

    /// Metric name outside the supported set.
    #[error("unsupported metric: {0}")]
    UnsupportedMetric(String),

    /// A metric hit an invalid numeric domain (zero division, NaN, infinity).
    #[error("numeric error in {metric}: {reason}")]
    Numeric {
        metric: &'static str,
        reason: String,
    },

    /// An image identifier carries no numeric id.
    #[error("cannot parse image id from {0:?}")]
    IdentifierParse(String),

    /// Two vectors compared by a histogram metric differ in length.
    #[error("dimension mismatch: query has {query_dim} dimensions, stored vector has {doc_dim}")]
    DimensionMismatch { query_dim: usize, doc_dim: usize },

    /// I/O error while reading the vector repository.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CbirError {
    pub(crate) fn numeric(metric: &'static str, reason: impl Into<String>) -> Self {
        CbirError::Numeric {
            metric,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CbirError::CorruptRecord {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CbirError>;
