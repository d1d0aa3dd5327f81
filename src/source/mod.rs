//! Source specification and matching.
//!
//! Normalizes caller-supplied watch configuration (roots, extensions, optional
//! key prefix, ignore rules) into absolute, watch-ready descriptors, and
//! answers the single question the rest of the crate cares about: which module
//! key, if any, does this path produce?

mod error;
mod ignore_rule;
mod spec;

pub use error::{SourceError, SourceResult};
pub use ignore_rule::{DECLARATION_FILE_PATTERN, IgnoreRule, IgnoreSet, OneOrMany};
pub use spec::{KEY_SEPARATOR, SourceInput, SourceSpec};

use std::path::Path;

use crate::registry::ModuleKey;

/// All roots plus the global ignore set.
#[derive(Debug, Clone)]
pub struct MatcherSet {
    specs: Vec<SourceSpec>,
    ignore: IgnoreSet,
}

impl MatcherSet {
    /// Normalize inputs into specs and flatten every ignore rule into one set.
    ///
    /// `global` rules apply to every root, as do each input's own `ignored` rules.
    pub fn build(inputs: &[SourceInput], global: &[IgnoreRule], base: &Path) -> SourceResult<Self> {
        let specs = inputs
            .iter()
            .map(|input| SourceSpec::from_input(input, base))
            .collect::<SourceResult<Vec<_>>>()?;

        let per_source = inputs
            .iter()
            .filter_map(|input| input.ignored.as_ref())
            .flat_map(|rules| rules.iter());
        let ignore = IgnoreSet::new(global.iter().chain(per_source), base)?;

        Ok(Self { specs, ignore })
    }

    pub fn specs(&self) -> &[SourceSpec] {
        &self.specs
    }

    pub fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Module key for `path`, or `None` when no root accepts it.
    ///
    /// The first spec (configuration order) that includes the path decides the prefix.
    pub fn key_for(&self, path: &Path) -> Option<ModuleKey> {
        if self.ignore.is_ignored(path) {
            return None;
        }
        self.specs
            .iter()
            .find(|spec| spec.includes(path))
            .and_then(|spec| spec.module_key(path))
    }
}
