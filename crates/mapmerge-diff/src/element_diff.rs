//! Whole-element diff: attributes plus geometry.

use mapmerge_types::{ConflictElement, Side, GEOMETRY_KEY};
use serde::Serialize;

use crate::geometry::geometry_conflicted;
use crate::tag_diff::{compare_attributes, TagDiff};

/// Everything the operator needs to resolve one element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDiff {
    pub tags: TagDiff,
    /// Both branches kept a geometry and the geometries differ.
    pub geometry_conflicted: bool,
    /// The branch that deleted the element, if any.
    pub deleted: Option<Side>,
}

impl ElementDiff {
    /// One branch deleted the element, so it is settled by a keep/delete
    /// decision instead of per-field choices.
    pub fn requires_decision(&self) -> bool {
        self.deleted.is_some()
    }

    /// Conflicted attributes plus the geometry virtual field.
    pub fn total_conflicts(&self) -> usize {
        self.tags.conflict_count() + usize::from(self.geometry_conflicted)
    }

    /// Keys needing a choice, attribute keys first and `$map` last.
    pub fn conflict_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.tags.conflicted().map(|f| f.key.as_str()).collect();
        if self.geometry_conflicted {
            keys.push(GEOMETRY_KEY);
        }
        keys
    }
}

/// Diff the three variants of `element`.
pub fn diff_element(element: &ConflictElement) -> ElementDiff {
    let ours = element.ours.as_ref();
    let theirs = element.theirs.as_ref();
    ElementDiff {
        tags: compare_attributes(
            &element.original.attributes,
            ours.map(|v| &v.attributes),
            theirs.map(|v| &v.attributes),
        ),
        geometry_conflicted: geometry_conflicted(
            ours.and_then(|v| v.geometry.as_ref()),
            theirs.and_then(|v| v.geometry.as_ref()),
        ),
        deleted: element.deleted_branch(),
    }
}
