//! Ignore predicates shared by every watched root.
//!
//! Rules are written as plain strings in configuration and classified by shape:
//!
//! | Written as        | Kind    | Matched against                              |
//! |-------------------|---------|----------------------------------------------|
//! | `/\.stories\./`   | Regex   | absolute path (`/` separators)               |
//! | `**/*.test.tsx`   | Glob    | absolute path and path relative to base dir  |
//! | `node_modules`    | Literal | path prefix, or any single path component    |

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{SourceError, SourceResult};
use crate::paths;

/// Type-declaration and environment files never become aliasable modules.
pub const DECLARATION_FILE_PATTERN: &str = r"\.d\.[mc]?ts$";

/// A single ignore predicate as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IgnoreRule {
    Regex(String),
    Glob(String),
    Literal(String),
}

impl IgnoreRule {
    /// Classify a raw rule string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('/') && trimmed.ends_with('/') {
            return IgnoreRule::Regex(trimmed[1..trimmed.len() - 1].to_string());
        }
        if trimmed.contains(['*', '?', '[', '{']) {
            return IgnoreRule::Glob(trimmed.to_string());
        }
        IgnoreRule::Literal(trimmed.to_string())
    }
}

impl From<String> for IgnoreRule {
    fn from(raw: String) -> Self {
        IgnoreRule::parse(&raw)
    }
}

impl From<&str> for IgnoreRule {
    fn from(raw: &str) -> Self {
        IgnoreRule::parse(raw)
    }
}

impl From<IgnoreRule> for String {
    fn from(rule: IgnoreRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Regex(pattern) => write!(f, "/{pattern}/"),
            IgnoreRule::Glob(pattern) | IgnoreRule::Literal(pattern) => f.write_str(pattern),
        }
    }
}

/// Either a single value or a list of values.
///
/// Lets configuration write `ignored = "dist"` as well as `ignored = ["dist", "/\.spec\./"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Regex(Regex),
    Glob(glob::Pattern),
    Literal { resolved: PathBuf, component: Option<String> },
}

/// Flattened, compiled ignore rules shared across all roots.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    rules: Vec<CompiledRule>,
    base: PathBuf,
}

impl IgnoreSet {
    /// Compile the given rules plus the built-in declaration-file exclusion.
    pub fn new<'a>(
        rules: impl IntoIterator<Item = &'a IgnoreRule>,
        base: &Path,
    ) -> SourceResult<Self> {
        let builtin = IgnoreRule::Regex(DECLARATION_FILE_PATTERN.to_string());
        let mut compiled = vec![compile(&builtin, base)?];
        for rule in rules {
            compiled.push(compile(rule, base)?);
        }

        Ok(Self {
            rules: compiled,
            base: base.to_path_buf(),
        })
    }

    /// Check whether an absolute path is excluded by any rule.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let slash_path = paths::to_slash(path);
        let relative = path
            .strip_prefix(&self.base)
            .ok()
            .map(paths::to_slash);

        self.rules.iter().any(|rule| match rule {
            CompiledRule::Regex(regex) => regex.is_match(&slash_path),
            CompiledRule::Glob(pattern) => {
                pattern.matches(&slash_path)
                    || relative.as_deref().is_some_and(|rel| pattern.matches(rel))
            }
            CompiledRule::Literal {
                resolved,
                component,
            } => {
                path.starts_with(resolved)
                    || component
                        .as_deref()
                        .is_some_and(|name| path.components().any(|c| c.as_os_str() == name))
            }
        })
    }

    /// Number of compiled rules, including the built-in one.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile(rule: &IgnoreRule, base: &Path) -> SourceResult<CompiledRule> {
    match rule {
        IgnoreRule::Regex(pattern) => Regex::new(pattern)
            .map(CompiledRule::Regex)
            .map_err(|e| SourceError::InvalidIgnore {
                rule: rule.to_string(),
                reason: e.to_string(),
            }),
        IgnoreRule::Glob(pattern) => glob::Pattern::new(pattern)
            .map(CompiledRule::Glob)
            .map_err(|e| SourceError::InvalidIgnore {
                rule: rule.to_string(),
                reason: e.to_string(),
            }),
        IgnoreRule::Literal(literal) => {
            let single_component = !literal.is_empty() && !literal.contains(['/', '\\']);
            Ok(CompiledRule::Literal {
                resolved: paths::absolutize(Path::new(literal), base),
                component: single_component.then(|| literal.clone()),
            })
        }
    }
}
