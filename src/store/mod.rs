//! In-memory feature stores.
//!
//! A [`FeatureStore`] holds every feature vector of one extraction model,
//! keyed by a canonical [`ImageId`]. Stores are built once from a
//! [`VectorRepository`] and are immutable afterwards.
//!
//! # Record format
//!
//! One record per image: decimal numbers separated by newlines. Writers
//! terminate every value with a newline, so splitting yields an empty
//! trailing field. [`parse_record`] always drops the last field, then parses
//! what is left; a record with nothing left is corrupt.
//!
//! # Keys
//!
//! A record named `path/to/123.txt` is stored under `image/123.jpg`: the base
//! name with its extension normalized, under a fixed namespace
//! ([`KeyScheme`]). Query names are reduced the same way, so `123.png`,
//! `uploads/123.jpg` and `123` all resolve to the same entry.

pub mod cache;
pub mod repository;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CbirError, Result};

pub use cache::StoreCache;
pub use repository::{format_record, FsRepository, MemoryRepository, VectorRepository};

/// Feature-extraction models the indexes were built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureModel {
    InceptionV3,
    MobileNet,
    ResNet50,
    #[serde(rename = "VGG16")]
    Vgg16,
    Xception,
}

impl FeatureModel {
    pub const ALL: [FeatureModel; 5] = [
        FeatureModel::InceptionV3,
        FeatureModel::MobileNet,
        FeatureModel::ResNet50,
        FeatureModel::Vgg16,
        FeatureModel::Xception,
    ];

    /// Name of the model, which is also its repository collection.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureModel::InceptionV3 => "InceptionV3",
            FeatureModel::MobileNet => "MobileNet",
            FeatureModel::ResNet50 => "ResNet50",
            FeatureModel::Vgg16 => "VGG16",
            FeatureModel::Xception => "Xception",
        }
    }
}

impl fmt::Display for FeatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureModel {
    type Err = CbirError;

    fn from_str(s: &str) -> Result<Self> {
        FeatureModel::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CbirError::InvalidInput(format!("unknown model {s:?}")))
    }
}

/// How canonical keys are spelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyScheme {
    /// Logical directory every key lives under.
    pub namespace: String,
    /// Extension every key carries, without the dot.
    pub extension: String,
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self {
            namespace: "image".into(),
            extension: "jpg".into(),
        }
    }
}

impl KeyScheme {
    /// Canonical key for any file name or path.
    pub fn key_for(&self, raw: &str) -> ImageId {
        ImageId(format!("{}/{}.{}", self.namespace, stem(raw), self.extension))
    }
}

/// Strip directory components (either separator).
pub fn base_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Base name without its extension.
pub fn stem(raw: &str) -> &str {
    let base = base_name(raw);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// Canonical identifier of a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Use `key` verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        ImageId(key.into())
    }

    /// Canonical key for a file name under the default [`KeyScheme`].
    pub fn from_file_name(raw: &str) -> Self {
        KeyScheme::default().key_for(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base name without extension.
    pub fn stem(&self) -> &str {
        stem(&self.0)
    }

    /// The number the stem starts with.
    ///
    /// `"image/347.jpg"` and `"347_b.png"` both give 347.
    pub fn numeric_id(&self) -> Result<u64> {
        numeric_prefix(self.stem()).ok_or_else(|| CbirError::IdentifierParse(self.0.clone()))
    }

    /// Ground-truth class: `numeric_id / class_size`.
    pub fn class(&self, class_size: u64) -> Result<u64> {
        if class_size == 0 {
            return Err(CbirError::InvalidInput("class size must be positive".into()));
        }
        Ok(self.numeric_id()? / class_size)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn numeric_prefix(s: &str) -> Option<u64> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Parse one record into a feature vector.
///
/// The last newline-separated field is always discarded (see the module
/// docs). Every remaining field must be a finite decimal number.
pub fn parse_record(source_name: &str, contents: &str) -> Result<Vec<f32>> {
    let mut fields: Vec<&str> = contents.split('\n').map(str::trim).collect();
    fields.pop();
    if fields.is_empty() {
        return Err(CbirError::corrupt(
            source_name,
            "no values left after dropping the trailing field",
        ));
    }

    fields
        .iter()
        .enumerate()
        .map(|(line, field)| match field.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(CbirError::corrupt(
                source_name,
                format!("line {}: {field:?} is not a finite number", line + 1),
            )),
        })
        .collect()
}

/// Every feature vector of one model, in load order.
///
/// Vectors are stored contiguously (`len * dimension` floats).
#[derive(Debug, Clone)]
pub struct FeatureStore {
    model: String,
    scheme: KeyScheme,
    dimension: usize,
    ids: Vec<ImageId>,
    vectors: Vec<f32>,
    index: HashMap<ImageId, usize>,
}

impl FeatureStore {
    /// Load every record of `model` with the default key scheme.
    pub fn load(repo: &dyn VectorRepository, model: &str) -> Result<Self> {
        Self::load_with(repo, model, KeyScheme::default())
    }

    /// Load every record of `model`.
    ///
    /// Fails with [`CbirError::ModelNotFound`] when there are no records and
    /// with [`CbirError::CorruptRecord`] when any record cannot be parsed,
    /// has a different dimensionality from the first one, or collides with
    /// another record's key. Nothing is returned on partial failure.
    pub fn load_with(repo: &dyn VectorRepository, model: &str, scheme: KeyScheme) -> Result<Self> {
        let names = repo.list_records(model)?;
        if names.is_empty() {
            return Err(CbirError::ModelNotFound {
                model: model.to_string(),
            });
        }

        let mut store = Self::empty(model, scheme);
        for name in &names {
            let contents = repo.read_record(model, name).map_err(|err| match err {
                CbirError::Io(io) if io.kind() == std::io::ErrorKind::InvalidData => {
                    CbirError::corrupt(name.as_str(), "record is not valid UTF-8")
                }
                other => other,
            })?;
            let vector = parse_record(name, &contents)?;
            let id = store.scheme.key_for(name);
            store.push(name, id, &vector)?;
        }

        tracing::debug!(
            model,
            records = store.len(),
            dimension = store.dimension,
            "loaded feature store"
        );
        Ok(store)
    }

    /// Build a store from in-memory pairs; keys are used verbatim.
    pub fn from_entries<K, I>(model: &str, entries: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<f32>)>,
    {
        let mut store = Self::empty(model, KeyScheme::default());
        for (key, vector) in entries {
            let key = key.into();
            if vector.is_empty() {
                return Err(CbirError::corrupt(key, "empty vector"));
            }
            if let Some(bad) = vector.iter().find(|v| !v.is_finite()) {
                return Err(CbirError::corrupt(key, format!("non-finite value {bad}")));
            }
            let id = ImageId::new(key.clone());
            store.push(&key, id, &vector)?;
        }
        if store.is_empty() {
            return Err(CbirError::ModelNotFound {
                model: model.to_string(),
            });
        }
        Ok(store)
    }

    fn empty(model: &str, scheme: KeyScheme) -> Self {
        Self {
            model: model.to_string(),
            scheme,
            dimension: 0,
            ids: Vec::new(),
            vectors: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, source_name: &str, id: ImageId, vector: &[f32]) -> Result<()> {
        if self.ids.is_empty() {
            self.dimension = vector.len();
        } else if vector.len() != self.dimension {
            return Err(CbirError::corrupt(
                source_name,
                format!("expected {} values, found {}", self.dimension, vector.len()),
            ));
        }
        if self.index.contains_key(&id) {
            return Err(CbirError::corrupt(
                source_name,
                format!("duplicate key {id}"),
            ));
        }
        self.index.insert(id.clone(), self.ids.len());
        self.ids.push(id);
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn scheme(&self) -> &KeyScheme {
        &self.scheme
    }

    /// Dimensionality shared by every vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ImageId] {
        &self.ids
    }

    /// Vector at load position `i`.
    #[inline]
    pub fn vector(&self, i: usize) -> &[f32] {
        let start = i * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Exact key lookup.
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.index
            .get(&ImageId::new(key))
            .map(|&i| self.vector(i))
    }

    /// `(id, vector)` pairs in load order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ImageId, &[f32])> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(move |(i, id)| (id, self.vector(i)))
    }

    /// Resolve a query file name (or key) to its canonical id.
    ///
    /// An exact key match wins; otherwise directory components and the
    /// extension are stripped and the canonical key is rebuilt. Queries must
    /// already be in the store: there is no out-of-database path.
    pub fn resolve_id(&self, raw: &str) -> Result<&ImageId> {
        let exact = ImageId::new(raw);
        if let Some(&i) = self.index.get(&exact) {
            return Ok(&self.ids[i]);
        }
        let canonical = self.scheme.key_for(raw);
        self.index
            .get(&canonical)
            .map(|&i| &self.ids[i])
            .ok_or_else(|| CbirError::QueryNotFound(raw.to_string()))
    }

    /// Resolve a query file name to its stored vector.
    pub fn resolve_query(&self, raw: &str) -> Result<&[f32]> {
        let id = self.resolve_id(raw)?;
        Ok(self.vector(self.index[id]))
    }
}
