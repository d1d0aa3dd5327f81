//! Filesystem watch that keeps the alias registry live.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher ──┐
//!                              ├──> mpsc ──> EventLoop ──> FileMap (RwLock)
//! Scanner (spawn_blocking) ────┘                  │
//!                                                 ├──> PersistWriter (single writer)
//!                                                 └──> NotificationBroadcaster
//! ```
//!
//! The scanner reports every existing file as an `add`, followed by a
//! scan-complete marker. The event loop answers that marker with the
//! projection the bootstrapper hands back to its caller, then keeps running.

mod error;
mod event;
mod live;
mod notifications;
mod scanner;

pub use error::WatchError;
pub use event::{FsChange, changes_from_event};
pub use live::{AliasWatcher, AliasWatcherBuilder, ScanReady};
pub use notifications::{NotificationBroadcaster, RegistryEvent};
pub use scanner::Scanner;
