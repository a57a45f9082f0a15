//! Edge case tests for cbir-core.
//!
//! Tests unusual inputs and boundary conditions that could cause failures.

use std::fs;

use cbir_core::distance::{bhattacharyya, correlation, cosine_similarity, score};
use cbir_core::evaluation::evaluate;
use cbir_core::knn::{rank, Neighbor};
use cbir_core::store::{FeatureStore, FsRepository, ImageId, MemoryRepository, VectorRepository};
use cbir_core::{CbirError, Metric};

// =============================================================================
// Numeric guards
// =============================================================================

#[test]
fn bhattacharyya_one_hot_self_is_zero() {
    let a: Vec<f32> = (0..512).map(|i| if i == 3 { 1.0 } else { 0.0 }).collect();
    assert_eq!(bhattacharyya(&a, &a).unwrap(), 0.0);
}

#[test]
fn bhattacharyya_negative_inner_term_clamps_to_zero() {
    // Negative bins push sqrt(dot) / sqrt(sum product) above 1.
    let a = [1.0_f32, -0.5];
    assert_eq!(bhattacharyya(&a, &a).unwrap(), 0.0);

    let store = FeatureStore::from_entries("clamp", vec![("image/1.jpg", vec![1.0, -0.5])]).unwrap();
    let ranked = rank(&a, &store, Metric::Bhattacharyya, 1).unwrap();
    assert_eq!(ranked[0].score, 0.0);
}

#[test]
fn bhattacharyya_all_zero_is_numeric_error() {
    let z = vec![0.0_f32; 8];
    let h = vec![0.125_f32; 8];
    for (a, b) in [(&z, &h), (&h, &z), (&z, &z)] {
        assert!(matches!(
            bhattacharyya(a, b),
            Err(CbirError::Numeric { metric: "Bhattacharyya", .. })
        ));
    }
}

#[test]
fn cosine_and_correlation_on_zero_vectors() {
    let z = vec![0.0_f32; 4];
    assert_eq!(cosine_similarity(&z, &z).unwrap(), 0.0);
    // Constant histograms have no variance.
    assert_eq!(correlation(&z, &z).unwrap(), 1.0);
}

#[test]
fn overflowing_scores_are_errors() {
    let a = vec![f32::MAX; 4];
    let b = vec![-f32::MAX; 4];
    assert!(matches!(
        Metric::Euclidean.score(&a, &b),
        Err(CbirError::Numeric { metric: "Euclidean", .. })
    ));
}

#[test]
fn unsupported_metric_name() {
    assert!(matches!(
        score(&[1.0], &[1.0], "Mahalanobis"),
        Err(CbirError::UnsupportedMetric(name)) if name == "Mahalanobis"
    ));
}

// =============================================================================
// Ranking
// =============================================================================

#[test]
fn single_item_store() {
    let store = FeatureStore::from_entries("one", vec![("image/0.jpg", vec![0.5, 0.5])]).unwrap();
    let ranked = rank(&[0.5, 0.5], &store, Metric::Intersection, 20).unwrap();
    assert_eq!(ranked.len(), 1);
    assert!((ranked[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn query_dimension_mismatch() {
    let store = FeatureStore::from_entries("two", vec![("image/0.jpg", vec![0.5, 0.5])]).unwrap();
    assert!(matches!(
        rank(&[0.5, 0.5, 0.5], &store, Metric::Cosine, 1),
        Err(CbirError::DimensionMismatch { query_dim: 3, doc_dim: 2 })
    ));
    // Euclidean compares the shared prefix.
    let ranked = rank(&[0.5, 0.5, 9.0], &store, Metric::Euclidean, 1).unwrap();
    assert_eq!(ranked[0].score, 0.0);
}

#[test]
fn zero_sum_stored_vector_aborts_bhattacharyya_ranking() {
    let store = FeatureStore::from_entries(
        "zeros",
        vec![("image/0.jpg", vec![0.5, 0.5]), ("image/1.jpg", vec![0.0, 0.0])],
    )
    .unwrap();
    assert!(matches!(
        rank(&[0.5, 0.5], &store, Metric::Bhattacharyya, 2),
        Err(CbirError::Numeric { .. })
    ));
    // Other metrics are fine with it.
    assert_eq!(rank(&[0.5, 0.5], &store, Metric::Cosine, 2).unwrap().len(), 2);
}

#[test]
fn many_ties_are_deterministic() {
    let entries: Vec<(String, Vec<f32>)> = (0..200)
        .map(|i| (format!("image/{i}.jpg"), vec![1.0, 1.0]))
        .collect();
    let store = FeatureStore::from_entries("ties", entries).unwrap();
    let ranked = rank(&[1.0, 1.0], &store, Metric::Cosine, 200).unwrap();
    for (i, n) in ranked.iter().enumerate() {
        assert_eq!(n.id.as_str(), format!("image/{i}.jpg"));
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn empty_model_directory_is_model_not_found() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("ResNet50")).unwrap();
    let repo = FsRepository::new(dir.path());
    assert!(matches!(
        FeatureStore::load(&repo, "ResNet50"),
        Err(CbirError::ModelNotFound { .. })
    ));
}

#[test]
fn record_empty_after_drop_is_corrupt() {
    let mut repo = MemoryRepository::new();
    repo.insert_vector("VGG16", "1.txt", &[0.1, 0.2]);
    repo.insert("VGG16", "2.txt", "0.3");
    match FeatureStore::load(&repo, "VGG16") {
        Err(CbirError::CorruptRecord { source_name, .. }) => assert_eq!(source_name, "2.txt"),
        other => panic!("expected CorruptRecord, got {other:?}"),
    }
}

#[test]
fn non_utf8_record_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("VGG16");
    fs::create_dir(&model_dir).unwrap();
    fs::write(model_dir.join("1.txt"), [0xff_u8, 0xfe, b'\n']).unwrap();
    match FeatureStore::load(&FsRepository::new(dir.path()), "VGG16") {
        Err(CbirError::CorruptRecord { source_name, .. }) => assert_eq!(source_name, "1.txt"),
        other => panic!("expected CorruptRecord, got {other:?}"),
    }
}

#[test]
fn missing_record_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("VGG16");
    fs::create_dir(&model_dir).unwrap();
    fs::write(model_dir.join("1.txt"), "0.5\n").unwrap();
    let repo = FsRepository::new(dir.path());
    assert!(matches!(repo.read_record("VGG16", "missing.txt"), Err(CbirError::Io(_))));
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn identifier_without_number() {
    let ranked = vec![
        Neighbor {
            id: ImageId::new("image/1.jpg"),
            score: 0.0,
        },
        Neighbor {
            id: ImageId::new("image/thumbnail.jpg"),
            score: 0.1,
        },
    ];
    assert!(matches!(
        evaluate(&ranked, 0, 100),
        Err(CbirError::IdentifierParse(id)) if id == "image/thumbnail.jpg"
    ));
}

#[test]
fn huge_numeric_id_is_parse_error() {
    let id = ImageId::new("image/99999999999999999999999.jpg");
    assert!(matches!(id.numeric_id(), Err(CbirError::IdentifierParse(_))));
}
