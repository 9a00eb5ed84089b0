//! Per-element resolution status.

use std::fmt;

use mapmerge_diff::{ElementDiff, TagDiff};
use mapmerge_resolve::ChoiceSet;
use serde::{Deserialize, Serialize};

use crate::progress::percentage;

/// Overall resolution status of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    /// No conflicted field has a choice yet.
    Unresolved,
    /// Some, but not all, conflicted fields have a choice.
    PartiallyResolved,
    /// Every conflicted field has a choice, or there is nothing to resolve.
    Resolved,
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unresolved => "unresolved",
            Self::PartiallyResolved => "partially resolved",
            Self::Resolved => "resolved",
        })
    }
}

/// Resolved and total conflict counts for one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictTally {
    pub resolved_conflicts: usize,
    pub total_conflicts: usize,
}

impl ConflictTally {
    /// Progress in `[0, 100]`; an element without conflicts reads 100.
    pub fn percentage(&self) -> f64 {
        percentage(self.resolved_conflicts, self.total_conflicts)
    }

    pub fn remaining(&self) -> usize {
        self.total_conflicts.saturating_sub(self.resolved_conflicts)
    }

    pub fn status(&self) -> ElementStatus {
        if self.total_conflicts == 0 || self.resolved_conflicts >= self.total_conflicts {
            ElementStatus::Resolved
        } else if self.resolved_conflicts == 0 {
            ElementStatus::Unresolved
        } else {
            ElementStatus::PartiallyResolved
        }
    }
}

/// Count conflicted fields and how many of them have a choice.
///
/// Choices on fields that are not conflicted are ignored, as is a `$map`
/// choice when the geometry does not conflict.
pub fn tally(tags: &TagDiff, geometry_conflicted: bool, choices: &ChoiceSet) -> ConflictTally {
    let mut total = 0;
    let mut resolved = 0;
    for field in tags.conflicted() {
        total += 1;
        if choices.choice(&field.key).is_set() {
            resolved += 1;
        }
    }
    if geometry_conflicted {
        total += 1;
        if choices.geometry().is_set() {
            resolved += 1;
        }
    }
    ConflictTally {
        resolved_conflicts: resolved,
        total_conflicts: total,
    }
}

/// Derive the status of one element from its diff and choices.
pub fn classify(tags: &TagDiff, geometry_conflicted: bool, choices: &ChoiceSet) -> ElementStatus {
    tally(tags, geometry_conflicted, choices).status()
}

/// [`classify`] over a precomputed [`ElementDiff`].
pub fn classify_element(diff: &ElementDiff, choices: &ChoiceSet) -> ElementStatus {
    classify(&diff.tags, diff.geometry_conflicted, choices)
}
