//! In-memory alias registry and its projection.

mod file_map;
mod projection;

pub use file_map::{FileMap, Mutation, SharedRegistry};
pub use projection::{AliasEntry, DuplicateReport, Projection, project};

/// Logical import name, e.g. `@components/App`.
pub type ModuleKey = String;
