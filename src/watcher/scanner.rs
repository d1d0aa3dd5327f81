//! Initial directory scan for cold starts.
//!
//! Walks every existing root once and reports each file that would produce a
//! module key. Roots are visited in configuration order and entries in file
//! name order, which makes cold-start discovery order reproducible.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::source::MatcherSet;

/// Walks source roots to find aliasable files.
pub struct Scanner<'a> {
    matchers: &'a MatcherSet,
}

impl<'a> Scanner<'a> {
    pub fn new(matchers: &'a MatcherSet) -> Self {
        Self { matchers }
    }

    /// Visit every aliasable file, in discovery order.
    ///
    /// Files reachable from several (nested) roots are reported once.
    /// Missing roots are skipped.
    pub fn scan(&self, mut visit: impl FnMut(PathBuf)) -> usize {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for spec in self.matchers.specs() {
            let root = spec.root();
            if !root.is_dir() {
                crate::debug_event!("scan", "skipping missing root", "{}", root.display());
                continue;
            }

            for path in self.walk_root(root, spec.include().clone()) {
                if self.matchers.key_for(&path).is_none() {
                    continue;
                }
                if seen.insert(path.clone()) {
                    visit(path);
                }
            }
        }

        seen.len()
    }

    /// Collect every aliasable file into a vector.
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        self.scan(|path| files.push(path));
        files
    }

    /// Aliasable files at or below `dir`, for a directory that appeared
    /// while watching.
    ///
    /// A root nested inside `dir` is walked from the root itself.
    pub fn collect_under(&self, dir: &Path) -> Vec<PathBuf> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();

        for spec in self.matchers.specs() {
            let start = if dir.starts_with(spec.root()) {
                dir
            } else if spec.root().starts_with(dir) {
                spec.root()
            } else {
                continue;
            };
            if !start.is_dir() {
                continue;
            }

            for path in self.walk_root(start, spec.include().clone()) {
                if self.matchers.key_for(&path).is_some() && seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        files
    }

    fn walk_root(
        &self,
        root: &Path,
        include: ignore::overrides::Override,
    ) -> Vec<PathBuf> {
        let ignore_set = self.matchers.ignore_set().clone();

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false) // every file counts, hidden or gitignored
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .overrides(include)
            .filter_entry(move |entry| !ignore_set.is_ignored(entry.path()));

        builder
            .build()
            .filter_map(|result| match result {
                Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => {
                    Some(entry.into_path())
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("[scan] skipping unreadable entry: {e}");
                    None
                }
            })
            .collect()
    }
}
