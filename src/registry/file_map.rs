//! Mapping from module key to ordered candidate paths.
//!
//! Keys keep insertion order so that the alias projection reflects discovery
//! order on a cold scan, or document order on a warm start.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tokio::sync::RwLock;

use super::ModuleKey;

/// Registry shared between the event loop and readers.
pub type SharedRegistry = Arc<RwLock<FileMap>>;

/// Outcome of a mutation, used to decide whether a re-persist is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Path appended; `new_key` is true when the key did not exist before.
    Added { new_key: bool },
    /// Path filtered out; `key_removed` is true when the sequence became empty.
    Removed { key_removed: bool },
    /// Nothing matched.
    Unchanged,
}

impl Mutation {
    pub fn changed(self) -> bool {
        !matches!(self, Mutation::Unchanged)
    }
}

/// Key to candidate-path registry.
///
/// Invariant: every stored sequence is non-empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileMap {
    entries: IndexMap<ModuleKey, Vec<PathBuf>>,
}

impl FileMap {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Append `path` to the key's candidates, creating the key if absent.
    ///
    /// Identical paths are not deduplicated: a repeated add event appends a
    /// second entry, and the projection still picks the first.
    pub fn add(&mut self, key: impl Into<ModuleKey>, path: PathBuf) -> Mutation {
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().push(path);
                Mutation::Added { new_key: false }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(vec![path]);
                Mutation::Added { new_key: true }
            }
        }
    }

    /// Filter `path` out of the key's candidates, dropping the key when empty.
    pub fn remove(&mut self, key: &str, path: &Path) -> Mutation {
        let Some(candidates) = self.entries.get_mut(key) else {
            return Mutation::Unchanged;
        };

        let before = candidates.len();
        candidates.retain(|candidate| candidate != path);
        if candidates.len() == before {
            return Mutation::Unchanged;
        }

        if candidates.is_empty() {
            self.entries.shift_remove(key);
            Mutation::Removed { key_removed: true }
        } else {
            Mutation::Removed { key_removed: false }
        }
    }

    /// Insert a whole candidate list, as read from a persisted file.
    ///
    /// Empty lists are skipped to keep the non-empty invariant.
    pub fn insert_candidates(&mut self, key: impl Into<ModuleKey>, candidates: Vec<PathBuf>) {
        if candidates.is_empty() {
            return;
        }
        self.entries.insert(key.into(), candidates);
    }

    pub fn get(&self, key: &str) -> Option<&[PathBuf]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The path an alias for `key` resolves to (first wins).
    pub fn winner(&self, key: &str) -> Option<&Path> {
        self.entries
            .get(key)
            .and_then(|candidates| candidates.first())
            .map(PathBuf::as_path)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate keys and candidates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &[PathBuf])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
        self.entries.keys()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of candidate paths across all keys.
    pub fn path_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_add_creates_and_appends() {
        let mut map = FileMap::new();

        assert_eq!(
            map.add("App", p("/a/App.tsx")),
            Mutation::Added { new_key: true }
        );
        assert_eq!(
            map.add("App", p("/b/App.tsx")),
            Mutation::Added { new_key: false }
        );

        assert_eq!(map.len(), 1);
        assert_eq!(map.path_count(), 2);
        assert_eq!(map.winner("App"), Some(Path::new("/a/App.tsx")));
    }

    #[test]
    fn test_add_then_remove_restores_prior_state() {
        let mut map = FileMap::new();
        map.add("Button", p("/src/Button.tsx"));
        map.add("Card", p("/src/Card.tsx"));
        let before = map.clone();

        map.add("Modal", p("/src/Modal.tsx"));
        map.remove("Modal", Path::new("/src/Modal.tsx"));
        assert_eq!(map, before);
        assert!(!map.contains_key("Modal"));

        map.add("Button", p("/lib/Button.tsx"));
        map.remove("Button", Path::new("/lib/Button.tsx"));
        assert_eq!(map, before);
    }

    #[test]
    fn test_remove_last_path_drops_key_without_reordering() {
        let mut map = FileMap::new();
        map.add("A", p("/a.ts"));
        map.add("B", p("/b.ts"));
        map.add("C", p("/c.ts"));

        assert_eq!(
            map.remove("B", Path::new("/b.ts")),
            Mutation::Removed { key_removed: true }
        );

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn test_remove_keeps_key_while_candidates_remain() {
        let mut map = FileMap::new();
        map.add("App", p("/a/App.tsx"));
        map.add("App", p("/b/App.tsx"));

        assert_eq!(
            map.remove("App", Path::new("/a/App.tsx")),
            Mutation::Removed { key_removed: false }
        );
        assert_eq!(map.winner("App"), Some(Path::new("/b/App.tsx")));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut map = FileMap::new();
        map.add("App", p("/a/App.tsx"));

        assert_eq!(map.remove("App", Path::new("/x/App.tsx")), Mutation::Unchanged);
        assert_eq!(map.remove("Nope", Path::new("/a/App.tsx")), Mutation::Unchanged);
        assert!(!Mutation::Unchanged.changed());
        assert_eq!(map.path_count(), 1);
    }

    #[test]
    fn test_duplicate_add_is_not_deduplicated() {
        let mut map = FileMap::new();
        map.add("App", p("/a/App.tsx"));
        map.add("App", p("/a/App.tsx"));

        assert_eq!(map.get("App").map(<[PathBuf]>::len), Some(2));

        // A single unlink clears every copy of the path.
        map.remove("App", Path::new("/a/App.tsx"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert_candidates_skips_empty() {
        let mut map = FileMap::new();
        map.insert_candidates("Empty", Vec::new());
        map.insert_candidates("Full", vec![p("/x.ts")]);

        assert!(!map.contains_key("Empty"));
        assert!(map.contains_key("Full"));
    }
}
