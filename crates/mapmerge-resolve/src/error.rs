//! Error types for resolution state operations.

use thiserror::Error;

/// Errors that can occur while reading or updating resolution state.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Field keys must be non-empty.
    #[error("invalid field key: {key:?}")]
    InvalidKey { key: String },

    /// A lock guarding resolution state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience type alias for resolution state operations.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
