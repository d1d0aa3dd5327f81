pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;
pub mod paths;
pub mod persist;
pub mod registry;
pub mod source;
pub mod watcher;

pub use bootstrap::{
    BootstrapError, BootstrapMode, BootstrapOutcome, BootstrapState, Bootstrapper, ProcessFlag,
    bootstrap,
};
pub use config::Settings;
pub use persist::{PersistError, PersistedFile};
pub use registry::{AliasEntry, DuplicateReport, FileMap, ModuleKey, SharedRegistry, project};
pub use source::{IgnoreRule, MatcherSet, SourceInput, SourceSpec};
pub use watcher::{AliasWatcher, RegistryEvent, WatchError};
