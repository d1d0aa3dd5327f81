//! Bootstrap failures. All of them are fatal for the bootstrap result.

use thiserror::Error;

use super::BootstrapState;
use crate::persist::PersistError;
use crate::source::SourceError;
use crate::watcher::WatchError;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("Watcher stopped before the initial scan completed")]
    Aborted,

    #[error("Bootstrap already ran (state: {state})")]
    AlreadyRan { state: BootstrapState },
}
