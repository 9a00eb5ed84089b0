//! Merge engine for MapMerge.
//!
//! Turns one element's diff and the operator's choices into the record that
//! gets submitted: either a merged attribute map (plus geometry) or, when a
//! branch deleted the element, a keep/delete decision.
//!
//! Unconflicted fields resolve on their own. Conflicted fields must each
//! carry a choice; a single unset one fails the whole merge with
//! [`MergeError::IncompleteResolution`].

pub mod error;
pub mod outcome;
pub mod request;
pub mod resolver;

pub use error::{MergeError, MergeResult, PendingField};
pub use outcome::{DeletionDecision, MergeOutcome, MergedRecord};
pub use request::SubmissionRequest;
pub use resolver::{resolve, resolve_with_diff};
