//! End-to-end similarity search: validate, load, resolve, rank, evaluate.
//!
//! The ranking is computed over `max(eval_window, k)` neighbors. The curve
//! covers the first `eval_window` of them and the response carries the
//! first `k`; the two sizes are independent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::distance::Metric;
use crate::error::{CbirError, Result};
use crate::evaluation::{evaluate, CurvePoint, RecallPrecisionSeries};
use crate::knn::{rank, Neighbor};
use crate::store::{FeatureModel, FeatureStore, ImageId, StoreCache, VectorRepository};

/// What to search with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// A database image, by file name or key.
    Image(String),
    /// A raw feature vector. Without a class no curve is produced.
    Vector { values: Vec<f32>, class: Option<u64> },
}

/// A search request as received from a caller; fields are unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub model: String,
    pub metric: String,
    pub k: usize,
    pub query: Query,
}

/// Neighbors to display plus the recall-precision curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub model: FeatureModel,
    pub metric: Metric,
    /// Resolved query id, for image queries.
    pub query: Option<ImageId>,
    pub neighbors: Vec<Neighbor>,
    pub curve: Option<Vec<CurvePoint>>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
struct ValidRequest {
    model: FeatureModel,
    metric: Metric,
    k: usize,
}

/// Runs searches against a repository under one configuration.
pub struct Searcher<R> {
    repo: R,
    config: SearchConfig,
    cache: Option<StoreCache>,
}

impl<R: VectorRepository> Searcher<R> {
    /// Searcher that loads the store fresh for every request.
    pub fn new(repo: R, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repo,
            config,
            cache: None,
        })
    }

    /// Keep loaded stores across requests (see [`StoreCache`]).
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(StoreCache::new(self.config.keys.clone()));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&StoreCache> {
        self.cache.as_ref()
    }

    fn validate(&self, request: &SearchRequest) -> Result<ValidRequest> {
        let model: FeatureModel = request.model.parse()?;
        let metric: Metric = request.metric.parse()?;
        if !self.config.accepts_k(request.k) {
            return Err(CbirError::InvalidInput(format!(
                "k = {} not in {:?}",
                request.k, self.config.allowed_k
            )));
        }
        match &request.query {
            Query::Image(name) if name.trim().is_empty() => {
                return Err(CbirError::InvalidInput("empty query image name".into()));
            }
            Query::Vector { values, .. } if values.is_empty() => {
                return Err(CbirError::InvalidInput("empty query vector".into()));
            }
            _ => {}
        }
        Ok(ValidRequest {
            model,
            metric,
            k: request.k,
        })
    }

    fn store(&self, model: FeatureModel) -> Result<Arc<FeatureStore>> {
        match &self.cache {
            Some(cache) => cache.get_or_load(&self.repo, model.as_str()),
            None => Ok(Arc::new(FeatureStore::load_with(
                &self.repo,
                model.as_str(),
                self.config.keys.clone(),
            )?)),
        }
    }

    /// Run one search.
    ///
    /// The request is validated before anything is loaded; any load error
    /// aborts the whole search.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let valid = self.validate(request).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected search request");
        })?;
        let store = self.store(valid.model)?;

        let (query_id, query_vector, query_class) = match &request.query {
            Query::Image(name) => {
                let id = store.resolve_id(name)?;
                let class = id.class(self.config.class_size)?;
                (Some(id.clone()), store.resolve_query(name)?, Some(class))
            }
            Query::Vector { values, class } => (None, values.as_slice(), *class),
        };

        let window = self.config.eval_window;
        let mut ranked = rank(query_vector, &store, valid.metric, window.max(valid.k))?;

        let curve = match query_class {
            Some(class) => {
                let evaluated = &ranked[..window.min(ranked.len())];
                let series: RecallPrecisionSeries = evaluate(evaluated, class, self.config.class_size)?;
                Some(series.points())
            }
            None => None,
        };

        ranked.truncate(valid.k);
        tracing::info!(
            model = %valid.model,
            metric = %valid.metric,
            k = valid.k,
            query = query_id.as_ref().map(ImageId::as_str).unwrap_or("<vector>"),
            "search complete"
        );

        Ok(SearchResponse {
            model: valid.model,
            metric: valid.metric,
            query: query_id,
            neighbors: ranked,
            curve,
        })
    }
}
