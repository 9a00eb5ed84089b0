//! Working set files.
//!
//! ```json
//! {
//!   "elements": [ { "elementId": "w1", "original": {...}, "ours": {...}, "theirs": {...} } ],
//!   "choices": { "w1": { "fields": { "name": "ours" }, "decision": null } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use mapmerge_sdk::{ChoiceSet, ConflictElement, ElementId};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawWorkingSet {
    #[serde(default)]
    elements: Vec<serde_json::Value>,
    #[serde(default)]
    choices: BTreeMap<ElementId, ChoiceSet>,
}

/// A decoded working set file.
#[derive(Debug, Default)]
pub struct WorkingSet {
    pub elements: Vec<ConflictElement>,
    /// Elements that could not be decoded, with the reason.
    pub malformed: Vec<String>,
    pub choices: BTreeMap<ElementId, ChoiceSet>,
}

impl WorkingSet {
    /// Read a working set file. Elements that fail to decode are collected
    /// in `malformed` rather than failing the whole file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let raw: RawWorkingSet = serde_json::from_str(text)?;
        let mut set = WorkingSet {
            choices: raw.choices,
            ..Default::default()
        };
        for value in raw.elements {
            match ConflictElement::from_json_value(value) {
                Ok(element) => set.elements.push(element),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable element");
                    set.malformed.push(e.to_string());
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapmerge_sdk::{ResolutionChoice, Side};
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "elements": [
            {
                "elementId": "n1",
                "original": {"id": 1, "version": 1, "tags": {"a": "1", "b": "2"}},
                "ours": {"id": 1, "version": 2, "tags": {"a": "1", "b": "3"}},
                "theirs": {"id": 1, "version": 2, "tags": {"a": "9", "b": "2"}}
            },
            {
                "elementId": "w2",
                "original": {"id": 2, "version": 1, "tags": {"lanes": 2}}
            }
        ],
        "choices": {"n1": {"fields": {"a": "theirs"}}}
    }"#;

    #[test]
    fn parses_elements_and_choices() {
        let set = WorkingSet::parse(SAMPLE).unwrap();
        assert_eq!(set.elements.len(), 1);
        assert_eq!(set.malformed.len(), 1);
        assert!(set.malformed[0].contains("w2"));
        let choices = &set.choices[&ElementId::node(1)];
        assert_eq!(choices.choice("a"), ResolutionChoice::Theirs);
        assert_eq!(choices.fields.get("b"), None::<&Side>);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let set = WorkingSet::parse("{}").unwrap();
        assert!(set.elements.is_empty());
        assert!(set.choices.is_empty());
    }

    #[test]
    fn bad_choice_key_fails_file() {
        assert!(WorkingSet::parse(r#"{"choices": {"q1": {}}}"#).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let set = WorkingSet::load(file.path()).unwrap();
        assert_eq!(set.elements[0].element_id, ElementId::node(1));
    }

    #[test]
    fn missing_file_names_path() {
        let err = WorkingSet::load(Path::new("/nonexistent/set.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/set.json"));
    }
}
