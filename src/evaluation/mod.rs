//! Retrieval quality evaluation.
//!
//! - [`curve`]: per-query cumulative recall/precision from class labels
//! - [`summary`]: mean average precision and mean curves over a whole store
//! - [`synthetic`]: clustered stores with the dataset's numbering convention

pub mod curve;
pub mod summary;
pub mod synthetic;

pub use curve::{evaluate, evaluate_ids, CurvePoint, RecallPrecisionSeries, DEFAULT_CLASS_SIZE};
pub use summary::{evaluate_store, mean_curve, EvaluationSummary, QueryEvaluation};
pub use synthetic::{clustered_store, SyntheticParams};
