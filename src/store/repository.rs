//! Vector repositories: where per-image feature records come from.
//!
//! A repository groups records by model name. Each record is the text
//! serialization of one image's feature vector (see
//! [`parse_record`](super::parse_record)) and is addressed by its source
//! name, typically the file name it was written to.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CbirError, Result};

/// Read-only source of feature records.
pub trait VectorRepository: Send + Sync {
    /// Source names of every record of `model`, sorted.
    ///
    /// An unknown model yields an empty list; the store turns that into
    /// [`CbirError::ModelNotFound`].
    fn list_records(&self, model: &str) -> Result<Vec<String>>;

    /// Raw contents of one record.
    fn read_record(&self, model: &str, source_name: &str) -> Result<String>;
}

fn check_component(kind: &str, name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(CbirError::InvalidInput(format!("invalid {kind} name {name:?}")));
    }
    Ok(())
}

/// Filesystem layout: `<root>/<model>/<record file>`.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Model directories present under the root, sorted.
    pub fn models(&self) -> Result<Vec<String>> {
        let mut models = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                models.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        models.sort();
        Ok(models)
    }
}

impl VectorRepository for FsRepository {
    fn list_records(&self, model: &str) -> Result<Vec<String>> {
        check_component("model", model)?;
        let dir = self.root.join(model);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // dotfiles (.DS_Store and friends)
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read_record(&self, model: &str, source_name: &str) -> Result<String> {
        check_component("model", model)?;
        check_component("record", source_name)?;
        Ok(fs::read_to_string(self.root.join(model).join(source_name))?)
    }
}

/// In-memory repository, for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    models: HashMap<String, BTreeMap<String, String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a raw record.
    pub fn insert(
        &mut self,
        model: impl Into<String>,
        source_name: impl Into<String>,
        contents: impl Into<String>,
    ) {
        self.models
            .entry(model.into())
            .or_default()
            .insert(source_name.into(), contents.into());
    }

    /// Add a vector, serialized one value per line with a trailing newline.
    pub fn insert_vector(
        &mut self,
        model: impl Into<String>,
        source_name: impl Into<String>,
        vector: &[f32],
    ) {
        self.insert(model, source_name, format_record(vector));
    }
}

impl VectorRepository for MemoryRepository {
    fn list_records(&self, model: &str) -> Result<Vec<String>> {
        Ok(self
            .models
            .get(model)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_record(&self, model: &str, source_name: &str) -> Result<String> {
        self.models
            .get(model)
            .and_then(|records| records.get(source_name))
            .cloned()
            .ok_or_else(|| {
                CbirError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{model}/{source_name}"),
                ))
            })
    }
}

/// Serialize a vector in the record format: one value per line, newline
/// terminated.
pub fn format_record(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 12);
    for v in vector {
        out.push_str(&v.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_repository_lists_sorted() {
        let mut repo = MemoryRepository::new();
        repo.insert_vector("VGG16", "20.txt", &[1.0]);
        repo.insert_vector("VGG16", "100.txt", &[2.0]);
        repo.insert_vector("VGG16", "3.txt", &[3.0]);
        assert_eq!(
            repo.list_records("VGG16").unwrap(),
            vec!["100.txt", "20.txt", "3.txt"]
        );
        assert!(repo.list_records("ResNet50").unwrap().is_empty());
    }

    #[test]
    fn format_record_has_trailing_newline() {
        assert_eq!(format_record(&[1.0, 0.5]), "1\n0.5\n");
    }

    #[test]
    fn fs_repository_reads_layout() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("MobileNet");
        fs::create_dir(&model_dir).unwrap();
        fs::write(model_dir.join("b.txt"), "2\n").unwrap();
        fs::write(model_dir.join("a.txt"), "1\n").unwrap();
        fs::write(model_dir.join(".DS_Store"), "junk").unwrap();
        fs::create_dir(model_dir.join("nested")).unwrap();

        let repo = FsRepository::new(dir.path());
        assert_eq!(repo.models().unwrap(), vec!["MobileNet"]);
        assert_eq!(repo.list_records("MobileNet").unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(repo.read_record("MobileNet", "a.txt").unwrap(), "1\n");
        assert!(repo.list_records("Xception").unwrap().is_empty());
    }

    #[test]
    fn fs_repository_rejects_traversal() {
        let repo = FsRepository::new("/nonexistent");
        assert!(matches!(
            repo.list_records("../etc"),
            Err(CbirError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.read_record("VGG16", "../../passwd"),
            Err(CbirError::InvalidInput(_))
        ));
    }
}
