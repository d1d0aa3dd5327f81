//! Consumer-facing alias list and duplicate diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{FileMap, ModuleKey};

/// A resolved `(key, winning path)` pair handed to the build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub find: ModuleKey,
    pub replacement: PathBuf,
}

/// A key with more than one candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub key: ModuleKey,
    /// All candidates; the first one is in use.
    pub candidates: Vec<PathBuf>,
}

impl DuplicateReport {
    pub fn in_use(&self) -> &PathBuf {
        &self.candidates[0]
    }
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "duplicate module key '{}' ({} candidates):",
            self.key,
            self.candidates.len()
        )?;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let marker = if i == 0 { " (in use)" } else { "" };
            writeln!(f, "  - {}{marker}", candidate.display())?;
        }
        Ok(())
    }
}

/// Aliases in registry order plus every ambiguous key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub aliases: Vec<AliasEntry>,
    pub duplicates: Vec<DuplicateReport>,
}

impl Projection {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Emit one warning per ambiguous key. Does not affect the chosen paths.
    pub fn report_duplicates(&self) {
        for report in &self.duplicates {
            tracing::warn!("[registry] {}", report.to_string().trim_end());
        }
    }
}

/// Project the registry into aliases (first candidate wins).
pub fn project(map: &FileMap) -> Projection {
    let mut projection = Projection::default();

    for (key, candidates) in map.iter() {
        let Some(first) = candidates.first() else {
            continue;
        };
        projection.aliases.push(AliasEntry {
            find: key.clone(),
            replacement: first.clone(),
        });
        if candidates.len() > 1 {
            projection.duplicates.push(DuplicateReport {
                key: key.clone(),
                candidates: candidates.to_vec(),
            });
        }
    }

    projection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_follows_insertion_order() {
        let mut map = FileMap::new();
        map.add("Zeta", PathBuf::from("/z.ts"));
        map.add("alpha", PathBuf::from("/a.ts"));

        let projection = project(&map);
        let keys: Vec<&str> = projection.aliases.iter().map(|a| a.find.as_str()).collect();
        assert_eq!(keys, vec!["Zeta", "alpha"]);
        assert!(!projection.has_duplicates());
    }

    #[test]
    fn test_duplicates_use_first_candidate() {
        let mut map = FileMap::new();
        map.add("@components/App", PathBuf::from("/src/a/App.tsx"));
        map.add("@components/App", PathBuf::from("/src/b/App.tsx"));

        let projection = project(&map);
        assert_eq!(projection.aliases.len(), 1);
        assert_eq!(
            projection.aliases[0].replacement,
            PathBuf::from("/src/a/App.tsx")
        );

        assert_eq!(projection.duplicates.len(), 1);
        let report = &projection.duplicates[0];
        assert_eq!(report.in_use(), &PathBuf::from("/src/a/App.tsx"));

        let text = report.to_string();
        assert!(text.contains("/src/a/App.tsx (in use)"));
        assert!(text.contains("/src/b/App.tsx"));
        assert!(!text.contains("/src/b/App.tsx (in use)"));
    }

    #[test]
    fn test_empty_registry_projects_nothing() {
        let projection = project(&FileMap::new());
        assert!(projection.aliases.is_empty());
        assert!(projection.duplicates.is_empty());
    }
}
