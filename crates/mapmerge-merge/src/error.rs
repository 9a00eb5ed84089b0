//! Error types for the merge crate.

use std::fmt;

use mapmerge_types::{ElementId, GEOMETRY_KEY};
use serde::Serialize;

/// A field that still needs an operator choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum PendingField {
    /// A conflicted attribute.
    Attribute(String),
    /// The conflicted geometry (`$map`).
    Geometry,
    /// The keep/delete decision for an element one branch deleted.
    ElementDecision,
}

impl fmt::Display for PendingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(key) => f.write_str(key),
            Self::Geometry => f.write_str(GEOMETRY_KEY),
            Self::ElementDecision => f.write_str("keep/delete"),
        }
    }
}

/// Errors that can occur while materializing a merge.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MergeError {
    /// At least one conflicted field has no choice.
    #[error("incomplete resolution for {element}: {} pending", .pending.len())]
    IncompleteResolution {
        element: ElementId,
        pending: Vec<PendingField>,
    },
}

impl MergeError {
    /// The fields the operator still has to resolve.
    pub fn pending(&self) -> &[PendingField] {
        match self {
            Self::IncompleteResolution { pending, .. } => pending,
        }
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
