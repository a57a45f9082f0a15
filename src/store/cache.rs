//! Read-through cache of loaded feature stores.
//!
//! Stores are immutable once built, so cached entries are shared as
//! `Arc<FeatureStore>`. Nothing is evicted automatically: callers invalidate
//! a model when its records change on disk.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{FeatureStore, KeyScheme, VectorRepository};
use crate::error::Result;

/// Cache of stores keyed by model name.
#[derive(Debug, Default)]
pub struct StoreCache {
    scheme: KeyScheme,
    stores: RwLock<HashMap<String, Arc<FeatureStore>>>,
}

impl StoreCache {
    pub fn new(scheme: KeyScheme) -> Self {
        Self {
            scheme,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Cached store for `model`, loading it on a miss.
    ///
    /// Load errors are returned and not cached.
    pub fn get_or_load(&self, repo: &dyn VectorRepository, model: &str) -> Result<Arc<FeatureStore>> {
        if let Some(store) = self.stores.read().get(model) {
            return Ok(Arc::clone(store));
        }

        // Loading happens outside the lock; a concurrent miss may load twice,
        // the first insert wins.
        let loaded = Arc::new(FeatureStore::load_with(repo, model, self.scheme.clone())?);
        let mut stores = self.stores.write();
        let entry = stores.entry(model.to_string()).or_insert(loaded);
        Ok(Arc::clone(entry))
    }

    /// Drop the cached store of `model`. Returns whether one was cached.
    pub fn invalidate(&self, model: &str) -> bool {
        let removed = self.stores.write().remove(model).is_some();
        if removed {
            tracing::debug!(model, "invalidated cached feature store");
        }
        removed
    }

    pub fn clear(&self) {
        self.stores.write().clear();
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}
