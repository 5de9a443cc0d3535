//! Model artifact storage
//!
//! Trained regressors and scalers are persisted per (symbol, algorithm,
//! component). The store is injected into the model bank so tests can use
//! the in-memory variant.
//!
//! Writes are not locked across processes: concurrent training of the same
//! (symbol, algorithm) pair can race and callers must serialize those.

mod fs;
mod memory;
#[cfg(test)]
mod tests;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;

use crate::error::Result;
use crate::types::{Algorithm, Variant};
use std::fmt;

/// Persisted piece of a trained model set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    FeatureScaler,
    LabelScaler,
    Model(Variant),
    /// Hold-out metrics of the last fit (optional on load)
    Report,
}

impl Component {
    pub fn name(&self) -> String {
        match self {
            Component::FeatureScaler => "X_scaler".to_string(),
            Component::LabelScaler => "y_scaler".to_string(),
            Component::Model(variant) => format!("{}_model", variant.stem()),
            Component::Report => "report".to_string(),
        }
    }
}

/// Address of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub symbol: String,
    pub algorithm: Algorithm,
    pub component: Component,
}

impl ArtifactKey {
    pub fn new(symbol: &str, algorithm: Algorithm, component: Component) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            algorithm,
            component,
        }
    }

    /// File name within the symbol's directory
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.algorithm.as_str(), self.component.name())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.symbol, self.file_name())
    }
}

/// Byte-level artifact persistence
pub trait ArtifactStore: Send + Sync {
    /// Read an artifact; `Ok(None)` when it does not exist
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite an artifact
    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;

    fn exists(&self, key: &ArtifactKey) -> bool;
}
