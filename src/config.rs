//! Search configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CbirError, Result};
use crate::evaluation::DEFAULT_CLASS_SIZE;
use crate::store::KeyScheme;

/// Parameters of the search pipeline.
///
/// All fields have defaults, so a JSON config only needs the ones it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Root of the on-disk index (`<root>/<model>/<records>`).
    pub index_root: PathBuf,
    /// Canonical key spelling.
    pub keys: KeyScheme,
    /// Accepted display sizes; empty accepts any positive k.
    pub allowed_k: Vec<usize>,
    /// Number of neighbors the curve is computed over, independent of k.
    pub eval_window: usize,
    /// Images per ground-truth class.
    pub class_size: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_root: PathBuf::from("public/index"),
            keys: KeyScheme::default(),
            allowed_k: vec![20, 50],
            eval_window: 100,
            class_size: DEFAULT_CLASS_SIZE,
        }
    }
}

impl SearchConfig {
    /// Read a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            CbirError::InvalidInput(format!("config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.eval_window == 0 {
            return Err(CbirError::InvalidInput("eval_window must be positive".into()));
        }
        if self.class_size == 0 {
            return Err(CbirError::InvalidInput("class_size must be positive".into()));
        }
        if self.allowed_k.contains(&0) {
            return Err(CbirError::InvalidInput("allowed_k must not contain 0".into()));
        }
        if self.keys.namespace.is_empty() || self.keys.extension.is_empty() {
            return Err(CbirError::InvalidInput("key namespace and extension must be set".into()));
        }
        Ok(())
    }

    /// Whether `k` is an acceptable display size.
    pub fn accepts_k(&self, k: usize) -> bool {
        k > 0 && (self.allowed_k.is_empty() || self.allowed_k.contains(&k))
    }
}
