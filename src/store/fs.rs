//! Filesystem artifact store: `<root>/<SYMBOL>/<algorithm>_<component>.json`

use super::{ArtifactKey, ArtifactStore};
use crate::error::{ForecastError, Result};
use crate::types::check_symbol;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn symbol_dir(&self, symbol: &str) -> Result<PathBuf> {
        check_symbol(symbol)?;
        Ok(self.root.join(symbol.to_uppercase()))
    }

    pub fn path_for(&self, key: &ArtifactKey) -> Result<PathBuf> {
        Ok(self.symbol_dir(&key.symbol)?.join(key.file_name()))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ForecastError::Persistence(format!("read {}: {}", key, e))),
        }
    }

    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        let dir = self.symbol_dir(&key.symbol)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| ForecastError::Persistence(format!("create {}: {}", dir.display(), e)))?;

        // Write-then-rename so a reader never sees a half-written artifact
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)
            .map_err(|e| ForecastError::Persistence(format!("write {}: {}", key, e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| ForecastError::Persistence(format!("rename {}: {}", key, e)))?;
        Ok(())
    }

    fn exists(&self, key: &ArtifactKey) -> bool {
        self.path_for(key).is_ok_and(|p| p.is_file())
    }
}
