//! Persistence of the registry as a tsconfig `paths` fragment.

mod codec;
mod error;
mod writer;

pub use codec::{CompilerOptions, PersistedConfig, compare_keys, deserialize, serialize};
pub use error::{PersistError, PersistResult};
pub use writer::{PendingWrite, PersistWriter};

use std::path::{Path, PathBuf};

use crate::registry::FileMap;

/// Location of the persisted config plus the base directory its paths are relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    path: PathBuf,
    base: PathBuf,
}

impl PersistedFile {
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Read and parse the file. Any parse failure is reported as `Malformed`.
    pub async fn load(&self) -> PersistResult<FileMap> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| PersistError::Read {
                    path: self.path.clone(),
                    source,
                })?;

        deserialize(&content, &self.base).map_err(|e| PersistError::Malformed {
            path: self.path.clone(),
            reason: match e {
                PersistError::Parse(inner) => inner.to_string(),
                other => other.to_string(),
            },
        })
    }

    /// Serialize the registry relative to this file's base directory.
    pub fn render(&self, map: &FileMap) -> PersistResult<String> {
        serialize(map, &self.base)
    }

    /// Write an empty config if the file does not exist yet.
    ///
    /// Returns true when a file was created.
    pub fn ensure_exists(&self) -> PersistResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Write {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        let empty = self.render(&FileMap::new())?;
        std::fs::write(&self.path, empty).map_err(|e| PersistError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let file = PersistedFile::new(dir.path().join("missing.json"), dir.path());

        let err = file.load().await.unwrap_err();
        assert!(matches!(err, PersistError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paths.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file = PersistedFile::new(&path, dir.path());

        let err = file.load().await.unwrap_err();
        assert!(matches!(err, PersistError::Malformed { .. }));
        assert!(err.to_string().contains("paths.json"));
    }

    #[tokio::test]
    async fn test_ensure_exists_writes_loadable_empty_config() {
        let dir = TempDir::new().unwrap();
        let file = PersistedFile::new(dir.path().join("cfg/paths.json"), dir.path());

        assert!(file.ensure_exists().unwrap());
        assert!(!file.ensure_exists().unwrap());

        let map = file.load().await.unwrap();
        assert!(map.is_empty());
    }
}
