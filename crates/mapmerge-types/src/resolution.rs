//! Operator resolution choices.
//!
//! A conflicted field moves through a three-state machine driven by a single
//! transition, [`ResolutionChoice::apply`]:
//!
//! ```text
//!          ours            theirs
//! Unset    -> Ours         -> Theirs
//! Ours     -> Unset        -> Theirs
//! Theirs   -> Ours         -> Unset
//! ```
//!
//! Choosing the side that is already selected clears the choice; choosing the
//! other side overwrites it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved field key standing for an element's geometry.
pub const GEOMETRY_KEY: &str = "$map";

/// One of the two edit branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The local re-extraction.
    Ours,
    /// The upstream edit.
    Theirs,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ours => "ours",
            Self::Theirs => "theirs",
        })
    }
}

/// The operator's choice for one field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    #[default]
    Unset,
    Ours,
    Theirs,
}

impl ResolutionChoice {
    /// The state after the operator selects `side`.
    pub fn apply(self, side: Side) -> Self {
        match (self, side) {
            (Self::Ours, Side::Ours) | (Self::Theirs, Side::Theirs) => Self::Unset,
            (_, side) => side.into(),
        }
    }

    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// The chosen side, or `None` when unset.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::Unset => None,
            Self::Ours => Some(Side::Ours),
            Self::Theirs => Some(Side::Theirs),
        }
    }
}

impl From<Side> for ResolutionChoice {
    fn from(side: Side) -> Self {
        match side {
            Side::Ours => Self::Ours,
            Side::Theirs => Self::Theirs,
        }
    }
}

impl From<Option<Side>> for ResolutionChoice {
    fn from(side: Option<Side>) -> Self {
        side.map_or(Self::Unset, Self::from)
    }
}

impl fmt::Display for ResolutionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side() {
            Some(side) => fmt::Display::fmt(&side, f),
            None => f.write_str("unset"),
        }
    }
}

/// Whole-element decision when one branch deleted the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementAction {
    /// Re-adopt the surviving variant.
    Keep,
    /// Accept the deletion.
    Delete,
}

impl fmt::Display for ElementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keep => "keep",
            Self::Delete => "delete",
        })
    }
}
