//! Merge results.

use mapmerge_types::{AttributeMap, ElementAction, ElementId, ElementVariant, Geometry};
use serde::Serialize;

use crate::request::SubmissionRequest;

/// The merged state of an element both branches kept.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub element_id: ElementId,
    /// Upstream version the merge applies on top of.
    pub base_version: u64,
    pub tags: AttributeMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// The geometry came from an operator choice rather than agreement.
    pub geometry_conflicted: bool,
}

/// The keep/delete outcome for an element one branch deleted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionDecision {
    pub element_id: ElementId,
    pub action: ElementAction,
    /// The variant re-adopted by a `Keep`; `None` for `Delete`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept: Option<ElementVariant>,
}

/// What [`resolve`](crate::resolve) produces for one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MergeOutcome {
    Merged(MergedRecord),
    Decision(DeletionDecision),
}

impl MergeOutcome {
    pub fn element_id(&self) -> ElementId {
        match self {
            Self::Merged(r) => r.element_id,
            Self::Decision(d) => d.element_id,
        }
    }

    /// The request body for the submission collaborator.
    ///
    /// Merges become `{ "tags": {...} }`, with a `"geometry"` member only when
    /// the geometry was conflicted. Decisions become `{ "action": ... }`.
    pub fn to_request(&self) -> SubmissionRequest {
        match self {
            Self::Merged(record) => SubmissionRequest::Tags {
                tags: record.tags.clone(),
                geometry: if record.geometry_conflicted {
                    record.geometry.clone()
                } else {
                    None
                },
            },
            Self::Decision(decision) => SubmissionRequest::Action {
                action: decision.action,
            },
        }
    }

    /// The element state that stands once this outcome is accepted, or
    /// `None` if the element is deleted.
    pub fn settled_variant(&self) -> Option<ElementVariant> {
        match self {
            Self::Merged(r) => Some(ElementVariant {
                id: r.element_id.id,
                version: r.base_version,
                attributes: r.tags.clone(),
                geometry: r.geometry.clone(),
            }),
            Self::Decision(d) => d.kept.clone(),
        }
    }
}
