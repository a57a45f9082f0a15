//! Synthetic feature stores for tests and benchmarks.
//!
//! Images are numbered consecutively and grouped into classes of
//! `per_class`, matching the naming convention of the real datasets, so the
//! evaluator's class derivation works on them unchanged.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::store::{FeatureStore, KeyScheme};

/// Parameters of a clustered synthetic store.
#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub n_classes: usize,
    pub per_class: usize,
    pub dimension: usize,
    /// Standard deviation of the Gaussian noise around each class center.
    pub class_std: f32,
    pub seed: u64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            n_classes: 10,
            per_class: 100,
            dimension: 64,
            class_std: 0.05,
            seed: 42,
        }
    }
}

/// Build a store whose image `n` is drawn around the center of class
/// `n / per_class`.
///
/// Values are clamped to `[0, 1]` so every histogram metric applies.
pub fn clustered_store(model: &str, params: &SyntheticParams) -> Result<FeatureStore> {
    let mut rng = StdRng::seed_from_u64(params.seed);

    let centers: Vec<Vec<f32>> = (0..params.n_classes)
        .map(|_| (0..params.dimension).map(|_| rng.random::<f32>()).collect())
        .collect();

    let scheme = KeyScheme::default();
    let mut entries = Vec::with_capacity(params.n_classes * params.per_class);
    for (class, center) in centers.iter().enumerate() {
        for j in 0..params.per_class {
            let n = class * params.per_class + j;
            let vector = center
                .iter()
                .map(|&c| {
                    // Box-Muller
                    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
                    let u2: f32 = rng.random();
                    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
                    (c + z * params.class_std).clamp(0.0, 1.0)
                })
                .collect();
            entries.push((scheme.key_for(&n.to_string()).as_str().to_string(), vector));
        }
    }

    FeatureStore::from_entries(model, entries)
}
