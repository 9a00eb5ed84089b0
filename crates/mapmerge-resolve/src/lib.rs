//! Resolution state for MapMerge.
//!
//! Holds the operator's choices for each element under reconciliation. State
//! is partitioned by [`ElementId`](mapmerge_types::ElementId): every element
//! owns an isolated [`ChoiceSet`], and no operation on one element reads or
//! writes another's.
//!
//! # Key Types
//!
//! - [`ChoiceSet`] -- Snapshot of one element's field choices and keep/delete decision
//! - [`ResolutionStore`] -- Storage trait for choice sets
//! - [`InMemoryResolutionStore`] -- `RwLock`-backed store with one lock per element

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{ResolveError, ResolveResult};
pub use memory::InMemoryResolutionStore;
pub use traits::ResolutionStore;
pub use types::ChoiceSet;
