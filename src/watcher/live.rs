//! Long-lived alias watcher.
//!
//! One `notify::RecommendedWatcher` covers every source root. Raw events, the
//! initial scan and the scan-complete marker all flow through one channel into
//! a single event-loop task, which is the only place the registry is mutated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::error::WatchError;
use super::event::{FsChange, changes_from_event};
use super::notifications::{NotificationBroadcaster, RegistryEvent};
use super::scanner::Scanner;
use crate::persist::{PendingWrite, PersistResult, PersistWriter, PersistedFile};
use crate::registry::{
    AliasEntry, FileMap, ModuleKey, Mutation, Projection, SharedRegistry, project,
};
use crate::source::MatcherSet;

enum LoopMessage {
    Change(FsChange),
    WatchFailed(String),
    ScanComplete {
        files: usize,
        reply: oneshot::Sender<ScanReady>,
    },
}

/// State captured when the initial scan completes.
#[derive(Debug)]
pub struct ScanReady {
    /// Projection of the registry right after the last scanned file.
    pub projection: Projection,
    /// Final persist of that state.
    pub write: PersistResult<PendingWrite>,
    /// Number of files the scan reported.
    pub files: usize,
}

/// Handle to a running watcher.
///
/// Dropping the handle does not stop watching: the event loop owns the
/// underlying `notify` watcher and runs until the runtime shuts down.
#[derive(Debug)]
pub struct AliasWatcher {
    registry: SharedRegistry,
    broadcaster: NotificationBroadcaster,
    roots: Vec<PathBuf>,
}

impl AliasWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> AliasWatcherBuilder {
        AliasWatcherBuilder::new()
    }

    /// Live registry, updated as files come and go.
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Current alias projection.
    pub async fn aliases(&self) -> Vec<AliasEntry> {
        project(&*self.registry.read().await).aliases
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.broadcaster.subscribe()
    }

    /// Directories with an active recursive watch.
    pub fn watched_roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

struct EventLoop {
    matchers: Arc<MatcherSet>,
    registry: SharedRegistry,
    file: PersistedFile,
    writer: PersistWriter,
    broadcaster: NotificationBroadcaster,
    rx: mpsc::Receiver<LoopMessage>,
    /// The underlying file watcher (kept alive by storing it).
    _watcher: notify::RecommendedWatcher,
}

/// One registry mutation that went through, for logging and notification.
struct Applied {
    mutation: Mutation,
    key: ModuleKey,
    path: PathBuf,
}

impl EventLoop {
    async fn run(mut self) {
        crate::debug_event!("watcher", "event loop started");

        while let Some(message) = self.rx.recv().await {
            match message {
                LoopMessage::Change(change) => self.apply(change).await,
                LoopMessage::WatchFailed(reason) => {
                    tracing::error!("[watcher] file watch error: {reason}");
                }
                LoopMessage::ScanComplete { files, reply } => {
                    let ready = self.snapshot_for_ready(files).await;
                    self.broadcaster.send(RegistryEvent::ScanComplete { files });
                    if reply.send(ready).is_err() {
                        crate::debug_event!("watcher", "ready signal dropped");
                    }
                }
            }
        }

        crate::debug_event!("watcher", "event loop stopped");
    }

    async fn snapshot_for_ready(&self, files: usize) -> ScanReady {
        let map = self.registry.read().await;
        let projection = project(&map);
        let write = self.file.render(&map).map(|text| self.writer.submit(text));
        ScanReady {
            projection,
            write,
            files,
        }
    }

    async fn apply(&self, change: FsChange) {
        match change {
            FsChange::Add(path) if path.is_dir() => self.add_directory(path).await,
            FsChange::Add(path) if path.is_file() => self.add_paths(vec![path]).await,
            FsChange::Add(path) => {
                crate::debug_event!("watcher", "vanished before add", "{}", path.display());
            }
            FsChange::Unlink(path) => self.remove_under(&path).await,
        }
    }

    /// A directory moved (or created) inside a root: register what it holds.
    async fn add_directory(&self, dir: PathBuf) {
        let matchers = Arc::clone(&self.matchers);
        let scan_dir = dir.clone();
        let found =
            tokio::task::spawn_blocking(move || Scanner::new(&matchers).collect_under(&scan_dir))
                .await;

        match found {
            Ok(files) => {
                crate::debug_event!("watcher", "directory added", "{} ({} files)", dir.display(), files.len());
                self.add_paths(files).await;
            }
            Err(e) => tracing::error!("[watcher] scan of {} failed: {e}", dir.display()),
        }
    }

    /// Register files, persisting once for the whole batch.
    ///
    /// A path its key already holds is a content change (editor save, rename
    /// over an existing file, scan overlapping the watch) and leaves the
    /// registry alone.
    async fn add_paths(&self, paths: Vec<PathBuf>) {
        let mut applied = Vec::new();
        let snapshot = {
            let mut map = self.registry.write().await;
            for path in paths {
                let Some(key) = self.matchers.key_for(&path) else {
                    crate::debug_event!("watcher", "unmatched", "add {}", path.display());
                    continue;
                };
                if map.get(&key).is_some_and(|candidates| candidates.contains(&path)) {
                    crate::debug_event!("registry", "content change", "{key} {}", path.display());
                    continue;
                }
                let mutation = map.add(key.clone(), path.clone());
                applied.push(Applied { mutation, key, path });
            }
            if applied.is_empty() {
                return;
            }
            self.file.render(&map)
        };

        self.publish(applied, snapshot);
    }

    /// Drop every registered path at or below `target`.
    ///
    /// Covers a single deleted file as well as a directory moved out of a root,
    /// which arrives as one event for the directory itself.
    async fn remove_under(&self, target: &Path) {
        let mut applied = Vec::new();
        let snapshot = {
            let mut map = self.registry.write().await;
            let doomed: Vec<(ModuleKey, PathBuf)> = map
                .iter()
                .flat_map(|(key, candidates)| {
                    candidates
                        .iter()
                        .filter(|path| path.starts_with(target))
                        .map(move |path| (key.clone(), path.clone()))
                })
                .collect();

            for (key, path) in doomed {
                let mutation = map.remove(&key, &path);
                if mutation.changed() {
                    applied.push(Applied { mutation, key, path });
                }
            }
            if applied.is_empty() {
                crate::debug_event!("registry", "unchanged", "unlink {}", target.display());
                return;
            }
            self.file.render(&map)
        };

        self.publish(applied, snapshot);
    }

    /// Log and broadcast applied mutations, then persist the snapshot.
    fn publish(&self, applied: Vec<Applied>, snapshot: PersistResult<String>) {
        for Applied { mutation, key, path } in &applied {
            match mutation {
                Mutation::Added { new_key } => {
                    crate::log_event!("registry", "added", "{key} -> {}", path.display());
                    if !*new_key {
                        tracing::warn!(
                            "[registry] '{key}' now has several candidates; {} is not in use",
                            path.display()
                        );
                    }
                    self.broadcaster.send(RegistryEvent::AliasAdded {
                        key: key.clone(),
                        path: path.clone(),
                    });
                }
                Mutation::Removed { key_removed } => {
                    crate::log_event!("registry", "removed", "{key} -> {}", path.display());
                    if *key_removed {
                        crate::debug_event!("registry", "key dropped", "{key}");
                    }
                    self.broadcaster.send(RegistryEvent::AliasRemoved {
                        key: key.clone(),
                        path: path.clone(),
                    });
                }
                Mutation::Unchanged => {}
            }
        }

        let pending = match snapshot {
            Ok(text) => self.writer.submit(text),
            Err(e) => {
                tracing::error!("[persist] failed to render registry: {e}");
                self.broadcaster.send(RegistryEvent::PersistFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        // The loop moves on; completion is reported asynchronously.
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            match pending.wait().await {
                Ok(()) => {
                    for Applied { key, path, .. } in applied {
                        broadcaster.send(RegistryEvent::Synced { key, path });
                    }
                }
                Err(e) => broadcaster.send(RegistryEvent::PersistFailed {
                    reason: e.to_string(),
                }),
            }
        });
    }
}

/// Compute the minimal set of existing roots to watch recursively.
fn watch_roots(matchers: &MatcherSet) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for spec in matchers.specs() {
        let root = spec.root();
        if root.is_dir() {
            roots.push(root.to_path_buf());
        } else {
            crate::debug_event!("watcher", "root missing, not watched", "{}", root.display());
        }
    }
    roots.sort_by_key(|root| root.components().count());

    let mut kept: Vec<PathBuf> = Vec::new();
    for root in roots {
        if !kept.iter().any(|parent| root.starts_with(parent)) {
            kept.push(root);
        }
    }
    kept
}

/// Builder for constructing an AliasWatcher.
pub struct AliasWatcherBuilder {
    matchers: Option<Arc<MatcherSet>>,
    file: Option<PersistedFile>,
    registry: Option<SharedRegistry>,
    event_buffer: usize,
    broadcast_capacity: usize,
}

impl AliasWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            matchers: None,
            file: None,
            registry: None,
            event_buffer: 256,
            broadcast_capacity: 128,
        }
    }

    pub fn matchers(mut self, matchers: Arc<MatcherSet>) -> Self {
        self.matchers = Some(matchers);
        self
    }

    pub fn persisted_file(mut self, file: PersistedFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Use an existing registry instead of an empty one.
    pub fn registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Capacity of the channel between the watcher/scanner and the event loop.
    pub fn event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size.max(1);
        self
    }

    pub fn broadcast_capacity(mut self, size: usize) -> Self {
        self.broadcast_capacity = size.max(1);
        self
    }

    /// Establish the watch, then start the event loop and the initial scan.
    ///
    /// The returned receiver resolves once every scanned file has been applied.
    /// Must be called inside a tokio runtime.
    pub fn start(self) -> Result<(AliasWatcher, oneshot::Receiver<ScanReady>), WatchError> {
        let matchers = self.matchers.ok_or_else(|| WatchError::InitFailed {
            reason: "Matchers are required".to_string(),
        })?;

        let file = self.file.ok_or_else(|| WatchError::InitFailed {
            reason: "Persisted file is required".to_string(),
        })?;

        let registry = self
            .registry
            .unwrap_or_else(|| FileMap::new().into_shared());
        let broadcaster = NotificationBroadcaster::new(self.broadcast_capacity);

        // Create channel for events
        let (tx, rx) = mpsc::channel(self.event_buffer);

        let notify_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in changes_from_event(&event) {
                    let _ = notify_tx.blocking_send(LoopMessage::Change(change));
                }
            }
            Err(e) => {
                let _ = notify_tx.blocking_send(LoopMessage::WatchFailed(e.to_string()));
            }
        })?;

        let roots = watch_roots(&matchers);
        for root in &roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| WatchError::PathWatchFailed {
                    path: root.clone(),
                    reason: e.to_string(),
                })?;
            crate::debug_event!("watcher", "watching", "{}", root.display());
        }

        for spec in matchers.specs() {
            crate::debug_event!("watcher", "pattern", "{}", spec.glob());
        }

        let writer = PersistWriter::spawn(file.path());
        let event_loop = EventLoop {
            matchers: Arc::clone(&matchers),
            registry: Arc::clone(&registry),
            file,
            writer,
            broadcaster: broadcaster.clone(),
            rx,
            _watcher: watcher,
        };
        tokio::spawn(event_loop.run());

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let files = Scanner::new(&matchers).scan(|path| {
                let _ = tx.blocking_send(LoopMessage::Change(FsChange::Add(path)));
            });
            let _ = tx.blocking_send(LoopMessage::ScanComplete {
                files,
                reply: ready_tx,
            });
        });

        Ok((
            AliasWatcher {
                registry,
                broadcaster,
                roots,
            },
            ready_rx,
        ))
    }
}

impl Default for AliasWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
