//! Collection-wide progress.
//!
//! Aggregates are recomputed from the full collection on every call.

use mapmerge_diff::TagDiff;
use mapmerge_resolve::ChoiceSet;
use mapmerge_types::ConflictElement;
use serde::{Deserialize, Serialize};

use crate::classify::{tally, ConflictTally, ElementStatus};

/// Element counts across a working set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatus {
    pub total_elements: usize,
    pub resolved_elements: usize,
    pub partially_resolved_elements: usize,
    /// Elements left out because a variant could not be interpreted.
    #[serde(default)]
    pub excluded_elements: usize,
}

impl AggregateStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more element with `status`.
    pub fn record(&mut self, status: ElementStatus) {
        self.total_elements += 1;
        match status {
            ElementStatus::Resolved => self.resolved_elements += 1,
            ElementStatus::PartiallyResolved => self.partially_resolved_elements += 1,
            ElementStatus::Unresolved => {}
        }
    }

    pub fn with_excluded(mut self, excluded: usize) -> Self {
        self.excluded_elements = excluded;
        self
    }

    pub fn unresolved_elements(&self) -> usize {
        self.total_elements
            .saturating_sub(self.resolved_elements)
            .saturating_sub(self.partially_resolved_elements)
    }

    /// Share of fully resolved elements, in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        percentage(self.resolved_elements, self.total_elements)
    }

    /// Returns `true` if every element is resolved.
    pub fn is_complete(&self) -> bool {
        self.resolved_elements == self.total_elements
    }
}

/// `100 * resolved / total`, clamped to `[0, 100]`.
///
/// A zero total reads as fully resolved.
pub fn percentage(resolved: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (100.0 * resolved as f64 / total as f64).clamp(0.0, 100.0)
}

/// Roll up the status of every element in `elements`.
pub fn aggregate<'a, I, F>(elements: I, mut status_of: F) -> AggregateStatus
where
    I: IntoIterator<Item = &'a ConflictElement>,
    F: FnMut(&ConflictElement) -> ElementStatus,
{
    let mut status = AggregateStatus::new();
    for element in elements {
        status.record(status_of(element));
    }
    status
}

/// Progress of one open element.
pub fn aggregate_one(tags: &TagDiff, geometry_conflicted: bool, choices: &ChoiceSet) -> ConflictTally {
    tally(tags, geometry_conflicted, choices)
}
