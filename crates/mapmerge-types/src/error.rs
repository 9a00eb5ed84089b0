use thiserror::Error;

/// Errors produced by type operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid element id: {0}")]
    InvalidElementId(String),

    /// A variant's geometry or attributes cannot be interpreted.
    #[error("malformed variant for {element}: {reason}")]
    MalformedVariant { element: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
