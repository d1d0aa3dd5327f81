//! Broadcast of registry changes to interested hosts.
//!
//! The event loop never waits on subscribers; slow receivers lag and drop
//! the oldest events.

use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::registry::ModuleKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A candidate path was appended for a key.
    AliasAdded { key: ModuleKey, path: PathBuf },
    /// A candidate path was removed from a key.
    AliasRemoved { key: ModuleKey, path: PathBuf },
    /// The persisted file reflects the change for this path.
    Synced { key: ModuleKey, path: PathBuf },
    /// Writing the persisted file failed; the watch continues.
    PersistFailed { reason: String },
    /// The initial scan finished.
    ScanComplete { files: usize },
}

/// Fan-out of registry events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<RegistryEvent>,
}

impl NotificationBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: RegistryEvent) {
        match self.sender.send(event) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "to {count} subscribers");
            }
            Err(broadcast::error::SendError(event)) => {
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    /// Subscribe to receive notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }
}
