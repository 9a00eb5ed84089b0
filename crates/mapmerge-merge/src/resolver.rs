//! Final merge materialization.

use mapmerge_diff::{diff_element, ElementDiff};
use mapmerge_resolve::ChoiceSet;
use mapmerge_types::{AttributeMap, ConflictElement, ElementAction, Side};
use tracing::debug;

use crate::error::{MergeError, MergeResult, PendingField};
use crate::outcome::{DeletionDecision, MergeOutcome, MergedRecord};

/// Resolve `element` with the operator's `choices`.
pub fn resolve(element: &ConflictElement, choices: &ChoiceSet) -> MergeResult<MergeOutcome> {
    let diff = diff_element(element);
    resolve_with_diff(element, &diff, choices)
}

/// Resolve `element` using a diff computed earlier by
/// [`diff_element`].
///
/// Rules:
/// - If a branch deleted the element, the recorded keep/delete decision is
///   the outcome. `Keep` re-adopts the surviving variant.
/// - An unconflicted key takes the value both branches agree on, and is
///   omitted when that value is absent.
/// - A conflicted key takes the chosen side's value.
/// - The geometry follows the `$map` choice when conflicted, and otherwise
///   ours, falling back to theirs.
///
/// Any conflicted field without a choice fails the merge with every pending
/// field listed; nothing is defaulted.
pub fn resolve_with_diff(
    element: &ConflictElement,
    diff: &ElementDiff,
    choices: &ChoiceSet,
) -> MergeResult<MergeOutcome> {
    let (ours, theirs) = match (element.ours.as_ref(), element.theirs.as_ref()) {
        (Some(ours), Some(theirs)) => (ours, theirs),
        _ => return decide(element, choices),
    };

    let mut pending = Vec::new();
    let mut tags = AttributeMap::new();
    for field in &diff.tags.fields {
        let value = if field.conflicted {
            match choices.choice(&field.key).side() {
                Some(Side::Ours) => field.ours_value.as_deref(),
                Some(Side::Theirs) => field.theirs_value.as_deref(),
                None => {
                    pending.push(PendingField::Attribute(field.key.clone()));
                    continue;
                }
            }
        } else {
            field.agreed_value()
        };
        tags.set(field.key.as_str(), value);
    }

    let geometry = if diff.geometry_conflicted {
        match choices.geometry().side() {
            Some(Side::Ours) => ours.geometry.clone(),
            Some(Side::Theirs) => theirs.geometry.clone(),
            None => {
                pending.push(PendingField::Geometry);
                None
            }
        }
    } else {
        ours.geometry.clone().or_else(|| theirs.geometry.clone())
    };

    if !pending.is_empty() {
        return Err(MergeError::IncompleteResolution {
            element: element.element_id,
            pending,
        });
    }

    debug!(
        element = %element.element_id,
        tags = tags.len(),
        geometry_conflicted = diff.geometry_conflicted,
        "merge materialized"
    );
    Ok(MergeOutcome::Merged(MergedRecord {
        element_id: element.element_id,
        base_version: theirs.version,
        tags,
        geometry,
        geometry_conflicted: diff.geometry_conflicted,
    }))
}

fn decide(element: &ConflictElement, choices: &ChoiceSet) -> MergeResult<MergeOutcome> {
    let action = choices.decision.ok_or_else(|| MergeError::IncompleteResolution {
        element: element.element_id,
        pending: vec![PendingField::ElementDecision],
    })?;

    // With both branches deleted there is no survivor, so keeping restores
    // the original.
    let kept = match action {
        ElementAction::Keep => Some(
            element
                .ours
                .as_ref()
                .or(element.theirs.as_ref())
                .unwrap_or(&element.original)
                .clone(),
        ),
        ElementAction::Delete => None,
    };

    debug!(element = %element.element_id, action = %action, "element decision materialized");
    Ok(MergeOutcome::Decision(DeletionDecision {
        element_id: element.element_id,
        action,
        kept,
    }))
}
