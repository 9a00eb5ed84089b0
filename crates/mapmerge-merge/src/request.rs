//! Request bodies accepted by the submission collaborator.

use mapmerge_types::{AttributeMap, ElementAction, Geometry};
use serde::{Deserialize, Serialize};

/// Serialized form of a merge outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionRequest {
    /// `{ "tags": {...} }` for attribute merges.
    Tags {
        tags: AttributeMap,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        geometry: Option<Geometry>,
    },
    /// `{ "action": "keep" | "delete" }` for whole-element decisions.
    Action { action: ElementAction },
}

impl SubmissionRequest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_shapes() {
        let tags: SubmissionRequest = serde_json::from_str(r#"{"tags":{"a":"1"}}"#).unwrap();
        assert_eq!(
            tags,
            SubmissionRequest::Tags {
                tags: AttributeMap::from([("a", "1")]),
                geometry: None
            }
        );
        let action: SubmissionRequest = serde_json::from_str(r#"{"action":"keep"}"#).unwrap();
        assert_eq!(action, SubmissionRequest::Action { action: ElementAction::Keep });
    }

    #[test]
    fn to_json_is_compact() {
        let req = SubmissionRequest::Action { action: ElementAction::Keep };
        assert_eq!(req.to_json().unwrap(), r#"{"action":"keep"}"#);
    }
}
