//! High-level SDK for MapMerge.
//!
//! Provides [`Reconciler`], the working set an operator resolves: elements
//! fetched read-only from an [`ElementSource`], choices held in a resolution
//! store, statuses derived on every read, and finished merges handed to a
//! [`MergeSink`].

pub mod collab;
pub mod config;
pub mod error;
pub mod workspace;

pub use collab::{ElementSource, InMemoryElementSource, MergeSink, RecordingSink, SubmitReceipt};
pub use config::ReconcileConfig;
pub use error::{SdkError, SdkResult};
pub use workspace::Reconciler;

// Re-export key types
pub use mapmerge_diff::{ElementDiff, FieldComparison, TagDiff};
pub use mapmerge_merge::{MergeError, MergeOutcome, PendingField, SubmissionRequest};
pub use mapmerge_resolve::ChoiceSet;
pub use mapmerge_status::{AggregateStatus, ConflictTally, ElementStatus};
pub use mapmerge_types::{
    AttributeMap, ConflictElement, ElementAction, ElementId, ElementKind, ElementVariant,
    Geometry, ResolutionChoice, Side, SubmissionId, GEOMETRY_KEY,
};
