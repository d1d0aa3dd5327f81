//! Error types for source specification and matching.

use thiserror::Error;

/// Errors from normalizing watch configuration.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid ignore rule '{rule}': {reason}")]
    InvalidIgnore { rule: String, reason: String },

    #[error("Invalid include glob for root {root}: {reason}")]
    InvalidInclude { root: String, reason: String },
}

pub type SourceResult<T> = Result<T, SourceError>;
