use mapmerge_types::ElementId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("malformed element: {0}")]
    Malformed(#[from] mapmerge_types::TypeError),

    #[error("resolution state error: {0}")]
    Resolve(#[from] mapmerge_resolve::ResolveError),

    #[error("merge error: {0}")]
    Merge(#[from] mapmerge_merge::MergeError),

    #[error("element source error: {0}")]
    Source(String),

    #[error("submission of {element} failed after {attempts} attempt(s): {reason}")]
    Submission {
        element: ElementId,
        attempts: u32,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SdkError {
    /// Returns `true` if the operator can fix this by resolving more fields.
    pub fn is_incomplete_resolution(&self) -> bool {
        matches!(self, Self::Merge(mapmerge_merge::MergeError::IncompleteResolution { .. }))
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
