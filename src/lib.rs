//! cbir-core: content-based image retrieval over precomputed features.
//!
//! Given a feature vector for a query image and a database of feature
//! vectors extracted offline (one collection per extraction model), rank
//! the database by similarity, keep the top k, and measure the ranking with
//! a recall-precision curve whose ground truth comes from image numbering.
//!
//! ```text
//! FeatureStore::load ─▶ resolve_query ─▶ knn::rank ─▶ evaluation::evaluate
//! ```
//!
//! - [`store`]: repositories, record parsing, canonical image ids
//! - [`distance`]: the five metrics and their sort directions
//! - [`knn`]: exhaustive, stable k-NN ranking
//! - [`evaluation`]: recall-precision curves and store-wide summaries
//! - [`search`]: the request pipeline tying them together
//!
//! # Example
//!
//! ```rust
//! use cbir_core::{distance::Metric, evaluation, knn, store::FeatureStore};
//!
//! let store = FeatureStore::from_entries(
//!     "demo",
//!     vec![
//!         ("image/1.jpg", vec![1.0, 0.0]),
//!         ("image/2.jpg", vec![0.9, 0.1]),
//!         ("image/150.jpg", vec![0.0, 1.0]),
//!     ],
//! )?;
//!
//! let query = store.resolve_query("uploads/1.png")?;
//! let ranked = knn::rank(query, &store, Metric::Cosine, 2)?;
//! assert_eq!(ranked[0].id.as_str(), "image/1.jpg");
//!
//! let curve = evaluation::evaluate(&ranked, 0, 100)?;
//! assert_eq!(curve.precision, vec![1.0, 1.0]);
//! # Ok::<(), cbir_core::CbirError>(())
//! ```
//!
//! # When exhaustive search is the right call
//!
//! The databases this crate targets hold a few thousand images. At that
//! size a linear scan is exact and cheap, so no index is built.

pub mod config;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod knn;
pub mod ops;
pub mod search;
pub mod store;

// Re-exports
pub use config::SearchConfig;
pub use distance::{Metric, SortOrder};
pub use error::{CbirError, Result};
pub use evaluation::{evaluate, RecallPrecisionSeries};
pub use knn::{rank, Neighbor};
pub use search::{Query, SearchRequest, SearchResponse, Searcher};
pub use store::{FeatureModel, FeatureStore, FsRepository, ImageId, MemoryRepository, VectorRepository};
