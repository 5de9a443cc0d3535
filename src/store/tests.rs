//! Tests for artifact stores

use super::*;
use crate::types::{Algorithm, Variant};

fn key(component: Component) -> ArtifactKey {
    ArtifactKey::new("aapl", Algorithm::Ensemble, component)
}

#[test]
fn test_component_names() {
    assert_eq!(Component::FeatureScaler.name(), "X_scaler");
    assert_eq!(Component::LabelScaler.name(), "y_scaler");
    assert_eq!(Component::Model(Variant::RandomForest).name(), "rf_model");
    assert_eq!(Component::Report.name(), "report");
}

#[test]
fn test_key_file_name_and_display() {
    let k = key(Component::Model(Variant::Kernel));
    assert_eq!(k.symbol, "AAPL");
    assert_eq!(k.file_name(), "ensemble_svm_model.json");
    assert_eq!(k.to_string(), "AAPL/ensemble_svm_model.json");
}

#[test]
fn test_memory_store_roundtrip_and_counter() {
    let store = MemoryArtifactStore::new();
    let k = key(Component::FeatureScaler);

    assert!(!store.exists(&k));
    assert!(store.get(&k).unwrap().is_none());

    store.put(&k, b"{}").unwrap();
    store.put(&k, b"{\"v\":2}").unwrap();

    assert!(store.exists(&k));
    assert_eq!(store.get(&k).unwrap().unwrap(), b"{\"v\":2}".to_vec());
    assert_eq!(store.writes(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.keys_for("AAPL").len(), 1);
    assert!(store.keys_for("MSFT").is_empty());
}

#[test]
fn test_fs_store_creates_symbol_dir_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path().join("models"));
    let k = key(Component::LabelScaler);

    assert!(!store.symbol_dir("AAPL").unwrap().exists());
    assert!(store.get(&k).unwrap().is_none());
    assert!(!store.exists(&k));

    store.put(&k, b"[1,2,3]").unwrap();

    assert!(store.symbol_dir("AAPL").unwrap().is_dir());
    assert!(store.exists(&k));
    assert_eq!(
        store.path_for(&k).unwrap(),
        dir.path().join("models").join("AAPL").join("ensemble_y_scaler.json")
    );
    assert_eq!(store.get(&k).unwrap().unwrap(), b"[1,2,3]".to_vec());
}

#[test]
fn test_fs_store_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    let k = key(Component::Model(Variant::Linear));

    store.put(&k, b"old").unwrap();
    store.put(&k, b"new").unwrap();
    assert_eq!(store.get(&k).unwrap().unwrap(), b"new".to_vec());
}

#[test]
fn test_fs_store_rejects_escaping_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path().join("models"));
    let k = ArtifactKey::new("../evil", Algorithm::Ensemble, Component::LabelScaler);

    assert!(store.symbol_dir("../evil").is_err());
    assert!(store.put(&k, b"{}").is_err());
    assert!(store.get(&k).is_err());
    assert!(!store.exists(&k));
    assert!(!dir.path().join("EVIL").exists());
}
