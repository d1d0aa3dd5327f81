//! Translation of raw `notify` events into registry changes.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// A change the registry cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsChange {
    /// A file appeared (created, renamed in, or found by the initial scan).
    Add(PathBuf),
    /// A file disappeared (deleted or renamed away).
    Unlink(PathBuf),
}

impl FsChange {
    pub fn path(&self) -> &Path {
        match self {
            FsChange::Add(path) | FsChange::Unlink(path) => path,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            FsChange::Add(_) => "add",
            FsChange::Unlink(_) => "unlink",
        }
    }
}

/// Map a `notify` event to zero or more changes.
///
/// Content modifications and metadata changes carry no information for the
/// registry and are dropped.
pub fn changes_from_event(event: &Event) -> Vec<FsChange> {
    match &event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FsChange::Add).collect(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(FsChange::Unlink).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event.paths.iter().cloned().map(FsChange::Unlink).collect(),
            RenameMode::To => event.paths.iter().cloned().map(FsChange::Add).collect(),
            RenameMode::Both => match event.paths.as_slice() {
                [from, to, ..] => vec![FsChange::Unlink(from.clone()), FsChange::Add(to.clone())],
                _ => Vec::new(),
            },
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        FsChange::Add(path.clone())
                    } else {
                        FsChange::Unlink(path.clone())
                    }
                })
                .collect(),
        },
        _ => Vec::new(),
    }
}
