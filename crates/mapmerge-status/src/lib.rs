//! Status derivation for MapMerge.
//!
//! Statuses and progress are always derived from the current diff and choice
//! set; nothing here is stored or incrementally maintained.
//!
//! # Key Types
//!
//! - [`ElementStatus`] -- Unresolved, partially resolved, or resolved
//! - [`ConflictTally`] -- Resolved vs. total conflicts of one element
//! - [`AggregateStatus`] -- Element counts across a whole working set

pub mod classify;
pub mod progress;

pub use classify::{classify, classify_element, tally, ConflictTally, ElementStatus};
pub use progress::{aggregate, aggregate_one, percentage, AggregateStatus};
