//! Per-root watch descriptors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use serde::{Deserialize, Serialize};

use super::error::{SourceError, SourceResult};
use super::ignore_rule::{IgnoreRule, OneOrMany};
use crate::paths;
use crate::registry::ModuleKey;

/// Separator between a configured prefix and the file's basename.
pub const KEY_SEPARATOR: &str = "/";

/// Source root as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
    /// Root directory, relative to the base directory or absolute.
    pub path: PathBuf,

    /// File extensions that make a file aliasable (with or without leading dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Optional key prefix, e.g. `@components`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Ignore rules; merged into the global ignore set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored: Option<OneOrMany<IgnoreRule>>,
}

fn default_extensions() -> Vec<String> {
    vec!["ts".to_string(), "tsx".to_string()]
}

impl SourceInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: default_extensions(),
            prefix: None,
            ignored: None,
        }
    }

    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_ignored(mut self, ignored: OneOrMany<IgnoreRule>) -> Self {
        self.ignored = Some(ignored);
        self
    }
}

/// Normalized, watch-ready descriptor for one root.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    root: PathBuf,
    extensions: BTreeSet<String>,
    prefix: Option<String>,
    include: Override,
}

impl SourceSpec {
    /// Resolve the root against `base` and compile the include globs.
    ///
    /// The root is not required to exist.
    pub fn from_input(input: &SourceInput, base: &Path) -> SourceResult<Self> {
        let root = paths::absolutize(&input.path, base);

        let extensions: BTreeSet<String> = input
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        let mut builder = OverrideBuilder::new(&root);
        for ext in &extensions {
            builder
                .add(&format!("**/*.{ext}"))
                .map_err(|e| SourceError::InvalidInclude {
                    root: root.display().to_string(),
                    reason: e.to_string(),
                })?;
        }
        let include = builder.build().map_err(|e| SourceError::InvalidInclude {
            root: root.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            root,
            extensions,
            prefix: input.prefix.clone().filter(|p| !p.is_empty()),
            include,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Glob describing every file this root accepts, e.g. `/app/src/**/*.{ts,tsx}`.
    pub fn glob(&self) -> String {
        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let root = paths::to_slash(&self.root);
        match exts.as_slice() {
            [single] => format!("{root}/**/*.{single}"),
            many => format!("{root}/**/*.{{{}}}", many.join(",")),
        }
    }

    /// Root-relative include globs, one per extension.
    pub(crate) fn include(&self) -> &Override {
        &self.include
    }

    /// Whether `path` lies under the root and has an accepted extension.
    pub fn includes(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && self.include.matched(path, false).is_whitelist()
    }

    /// Derive the module key for a file under this root.
    pub fn module_key(&self, path: &Path) -> Option<ModuleKey> {
        let stem = path.file_stem()?.to_str()?;
        Some(match &self.prefix {
            Some(prefix) => format!("{prefix}{KEY_SEPARATOR}{stem}"),
            None => stem.to_string(),
        })
    }
}
