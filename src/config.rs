//! Configuration for the alias registry.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.aliasmap/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ALIASMAP_` and use double
//! underscores to separate nested levels:
//! - `ALIASMAP_PERSISTED_PATH=paths.json` sets `persisted_path`
//! - `ALIASMAP_WATCHER__EVENT_BUFFER=1024` sets `watcher.event_buffer`
//! - `ALIASMAP_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::persist::PersistedFile;
use crate::source::{IgnoreRule, MatcherSet, OneOrMany, SourceInput, SourceResult};

/// Directory that marks a workspace and holds `settings.toml`.
pub const LOCAL_DIR_NAME: &str = ".aliasmap";

/// File name of the settings inside [`LOCAL_DIR_NAME`].
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .aliasmap is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Persisted alias config, relative to the workspace root
    #[serde(default = "default_persisted_path")]
    pub persisted_path: PathBuf,

    /// Directory persisted paths are relative to, and source roots resolve against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Ignore rules applied to every source root
    #[serde(default)]
    pub ignored: OneOrMany<IgnoreRule>,

    /// Source roots to watch
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceInput>,

    /// Watcher tuning
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Capacity of the channel between the filesystem watcher and the event loop
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Capacity of the registry change broadcast
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `"aliasmap::watcher" = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_persisted_path() -> PathBuf {
    PathBuf::from("tsconfig.paths.json")
}
fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_sources() -> Vec<SourceInput> {
    vec![SourceInput::new("src")]
}
fn default_event_buffer() -> usize {
    256
}
fn default_broadcast_capacity() -> usize {
    128
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            persisted_path: default_persisted_path(),
            base_dir: default_base_dir(),
            ignored: OneOrMany::default(),
            sources: default_sources(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(LOCAL_DIR_NAME).join(SETTINGS_FILE_NAME));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, plus defaults and environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("ALIASMAP_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::root_for_config(path).or_else(Self::workspace_root);
                }
                settings
            })
    }

    /// Workspace root implied by a settings file at `.aliasmap/settings.toml`
    fn root_for_config(path: &Path) -> Option<PathBuf> {
        let dir = path.parent()?;
        if dir.file_name()? != LOCAL_DIR_NAME || !path.exists() {
            return None;
        }
        let root = dir.parent()?;
        if root.as_os_str().is_empty() {
            std::env::current_dir().ok()
        } else {
            Some(paths::absolutize(root, &std::env::current_dir().ok()?))
        }
    }

    /// Find the workspace config by looking for a .aliasmap directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(LOCAL_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Get the workspace root directory (where .aliasmap is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(LOCAL_DIR_NAME);
            if config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Directory relative settings paths resolve against
    pub fn root_dir(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Absolute base directory for persisted paths and source roots
    pub fn resolved_base_dir(&self) -> PathBuf {
        paths::absolutize(&self.base_dir, &self.root_dir())
    }

    /// Absolute location of the persisted config
    pub fn resolved_persisted_path(&self) -> PathBuf {
        paths::absolutize(&self.persisted_path, &self.root_dir())
    }

    pub fn persisted_file(&self) -> PersistedFile {
        PersistedFile::new(self.resolved_persisted_path(), self.resolved_base_dir())
    }

    /// Normalize the configured sources and ignore rules
    pub fn matchers(&self) -> SourceResult<MatcherSet> {
        let global: Vec<IgnoreRule> = self.ignored.iter().cloned().collect();
        MatcherSet::build(&self.sources, &global, &self.resolved_base_dir())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in `root`
    pub fn init_config_file(root: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(LOCAL_DIR_NAME).join(SETTINGS_FILE_NAME);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        // workspace_root is detected at load time, not stored
        let settings = Settings::default();
        settings.save(&config_path)?;

        Ok(config_path)
    }
}
