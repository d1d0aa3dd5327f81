//! Deterministic JSON codec for the registry.
//!
//! The on-disk shape is a tsconfig fragment:
//!
//! ```json
//! {
//!   "compilerOptions": {
//!     "paths": {
//!       "@components/App": ["./src/components/App.tsx"]
//!     }
//!   }
//! }
//! ```
//!
//! Keys are written in case-insensitive order and every candidate is kept, so a
//! warm start sees the same duplicates a cold scan did.

use std::cmp::Ordering;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::PersistResult;
use crate::paths;
use crate::registry::FileMap;

/// Compiler options subset that carries the alias table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    #[serde(default)]
    pub paths: IndexMap<String, Vec<String>>,
}

/// Persisted representation of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

/// Case-insensitive key order; ties fall back to ordinal order of the raw keys.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl PersistedConfig {
    /// Build the persisted form, with paths relative to `base`.
    pub fn from_registry(map: &FileMap, base: &Path) -> Self {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort_by(|a, b| compare_keys(a, b));

        let mut table = IndexMap::with_capacity(keys.len());
        for key in keys {
            let candidates = map
                .get(key)
                .unwrap_or_default()
                .iter()
                .map(|path| paths::relative_dot_path(path, base))
                .collect();
            table.insert(key.clone(), candidates);
        }

        Self {
            compiler_options: CompilerOptions { paths: table },
        }
    }

    /// Rebuild a registry, resolving every stored path against `base`.
    pub fn into_registry(self, base: &Path) -> FileMap {
        let mut map = FileMap::new();
        for (key, candidates) in self.compiler_options.paths {
            let resolved = candidates
                .iter()
                .map(|rel| paths::absolutize(Path::new(rel), base))
                .collect();
            map.insert_candidates(key, resolved);
        }
        map
    }
}

/// Serialize the registry to pretty JSON with a trailing newline.
pub fn serialize(map: &FileMap, base: &Path) -> PersistResult<String> {
    let config = PersistedConfig::from_registry(map, base);
    let mut text = serde_json::to_string_pretty(&config)?;
    text.push('\n');
    Ok(text)
}

/// Parse persisted text back into a registry. Array order is preserved.
pub fn deserialize(content: &str, base: &Path) -> PersistResult<FileMap> {
    let config: PersistedConfig = serde_json::from_str(content)?;
    Ok(config.into_registry(base))
}
