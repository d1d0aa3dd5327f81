//! Error types for reading and writing the persisted config.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Persisted config {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid persisted config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Persist writer for {path} has shut down")]
    WriterClosed { path: PathBuf },
}

pub type PersistResult<T> = Result<T, PersistError>;
