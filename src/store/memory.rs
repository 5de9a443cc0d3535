//! In-memory artifact store

use super::{ArtifactKey, ArtifactStore};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<ArtifactKey, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `put` calls so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }

    /// Artifact keys currently stored for a symbol
    pub fn keys_for(&self, symbol: &str) -> Vec<ArtifactKey> {
        let symbol = symbol.to_uppercase();
        self.artifacts
            .read()
            .keys()
            .filter(|k| k.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn remove(&self, key: &ArtifactKey) -> Option<Vec<u8>> {
        self.artifacts.write().remove(key)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.read().get(key).cloned())
    }

    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.artifacts.write().insert(key.clone(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exists(&self, key: &ArtifactKey) -> bool {
        self.artifacts.read().contains_key(key)
    }
}
