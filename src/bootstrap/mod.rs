//! Bootstrap state machine.
//!
//! ```text
//! Uninitialized ──Warm──> Rehydrating ──> Ready   (parse persisted file, no watch)
//!       │
//!       └──────Cold──> Scanning ──> Ready         (watch + scan, watch keeps running)
//! ```
//!
//! The host decides the mode. Hosts that reload in-process can derive it from
//! [`ProcessFlag`] via [`BootstrapMode::for_process`].

mod error;
mod flag;

pub use error::BootstrapError;
pub use flag::ProcessFlag;

use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::persist::PersistedFile;
use crate::registry::{AliasEntry, DuplicateReport, FileMap, SharedRegistry, project};
use crate::source::{MatcherSet, SourceInput};
use crate::watcher::AliasWatcher;

/// How the registry is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    /// Scan the filesystem from scratch and keep watching it.
    Cold,
    /// Rebuild from the persisted file without touching source roots.
    Warm,
}

impl BootstrapMode {
    /// Cold for the first bootstrap in this process, Warm afterwards.
    pub fn for_process() -> Self {
        if ProcessFlag::is_set() {
            BootstrapMode::Warm
        } else {
            BootstrapMode::Cold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Rehydrating,
    Scanning,
    Ready,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapState::Uninitialized => "uninitialized",
            BootstrapState::Rehydrating => "rehydrating",
            BootstrapState::Scanning => "scanning",
            BootstrapState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Everything a host needs once the registry is ready.
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub mode: BootstrapMode,
    /// Aliases in registry order, first candidate wins.
    pub aliases: Vec<AliasEntry>,
    /// Keys with more than one candidate.
    pub duplicates: Vec<DuplicateReport>,
    /// Registry backing the aliases; live when `watcher` is present.
    pub registry: SharedRegistry,
    /// Running watcher for cold starts.
    pub watcher: Option<AliasWatcher>,
}

/// Drives one bootstrap from `Uninitialized` to `Ready`.
#[derive(Debug)]
pub struct Bootstrapper {
    matchers: Arc<MatcherSet>,
    file: PersistedFile,
    event_buffer: usize,
    broadcast_capacity: usize,
    state: BootstrapState,
}

impl Bootstrapper {
    pub fn new(matchers: MatcherSet, file: PersistedFile) -> Self {
        Self {
            matchers: Arc::new(matchers),
            file,
            event_buffer: 256,
            broadcast_capacity: 128,
            state: BootstrapState::Uninitialized,
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, BootstrapError> {
        let matchers = settings.matchers()?;
        Ok(Self::new(matchers, settings.persisted_file())
            .with_event_buffer(settings.watcher.event_buffer)
            .with_broadcast_capacity(settings.watcher.broadcast_capacity))
    }

    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    pub fn with_broadcast_capacity(mut self, size: usize) -> Self {
        self.broadcast_capacity = size;
        self
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn persisted_file(&self) -> &PersistedFile {
        &self.file
    }

    fn transition(&mut self, next: BootstrapState) {
        crate::debug_event!("bootstrap", "state", "{} -> {next}", self.state);
        self.state = next;
    }

    /// Run the bootstrap in the given mode.
    ///
    /// A failure leaves the bootstrapper `Uninitialized` so it can be retried.
    pub async fn run(&mut self, mode: BootstrapMode) -> Result<BootstrapOutcome, BootstrapError> {
        if self.state != BootstrapState::Uninitialized {
            return Err(BootstrapError::AlreadyRan { state: self.state });
        }

        let result = match mode {
            BootstrapMode::Warm => self.rehydrate().await,
            BootstrapMode::Cold => self.scan().await,
        };

        match result {
            Ok(outcome) => {
                self.transition(BootstrapState::Ready);
                crate::log_event!(
                    "bootstrap",
                    "ready",
                    "{} aliases ({mode:?})",
                    outcome.aliases.len()
                );
                Ok(outcome)
            }
            Err(e) => {
                self.transition(BootstrapState::Uninitialized);
                Err(e)
            }
        }
    }

    async fn rehydrate(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        self.transition(BootstrapState::Rehydrating);

        let map = self.file.load().await?;
        let projection = project(&map);
        projection.report_duplicates();

        Ok(BootstrapOutcome {
            mode: BootstrapMode::Warm,
            aliases: projection.aliases,
            duplicates: projection.duplicates,
            registry: map.into_shared(),
            watcher: None,
        })
    }

    async fn scan(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        self.transition(BootstrapState::Scanning);

        let registry = FileMap::new().into_shared();
        let (watcher, ready) = AliasWatcher::builder()
            .matchers(Arc::clone(&self.matchers))
            .persisted_file(self.file.clone())
            .registry(Arc::clone(&registry))
            .event_buffer(self.event_buffer)
            .broadcast_capacity(self.broadcast_capacity)
            .start()?;

        let ready = ready.await.map_err(|_| BootstrapError::Aborted)?;
        ready.write?.wait().await?;

        let token = ProcessFlag::mark();
        crate::debug_event!("bootstrap", "process flag", "{token}");
        crate::log_event!("bootstrap", "scanned", "{} files", ready.files);

        let projection = ready.projection;
        projection.report_duplicates();

        Ok(BootstrapOutcome {
            mode: BootstrapMode::Cold,
            aliases: projection.aliases,
            duplicates: projection.duplicates,
            registry,
            watcher: Some(watcher),
        })
    }
}

/// One-call entry point: normalize `sources` and bootstrap against `file`.
///
/// Source roots resolve against the persisted file's base directory.
pub async fn bootstrap(
    sources: &[SourceInput],
    file: PersistedFile,
    mode: BootstrapMode,
) -> Result<BootstrapOutcome, BootstrapError> {
    let matchers = MatcherSet::build(sources, &[], file.base())?;
    Bootstrapper::new(matchers, file).run(mode).await
}
