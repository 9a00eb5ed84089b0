//! Per-element choice sets.

use std::collections::BTreeMap;

use mapmerge_types::{ElementAction, ResolutionChoice, Side, GEOMETRY_KEY};
use serde::{Deserialize, Serialize};

/// All choices recorded for one element.
///
/// An unset field is simply absent from `fields`, so a fresh element starts
/// with an empty set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    /// Chosen side per field key, including `$map` for the geometry.
    #[serde(default)]
    pub fields: BTreeMap<String, Side>,
    /// Keep/delete decision for an element one branch deleted.
    #[serde(default)]
    pub decision: Option<ElementAction>,
}

impl ChoiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current choice for `key`.
    pub fn choice(&self, key: &str) -> ResolutionChoice {
        self.fields.get(key).copied().into()
    }

    /// The current choice for the geometry field.
    pub fn geometry(&self) -> ResolutionChoice {
        self.choice(GEOMETRY_KEY)
    }

    /// Select `side` for `key` with toggle semantics and return the new choice.
    pub fn apply(&mut self, key: &str, side: Side) -> ResolutionChoice {
        let next = self.choice(key).apply(side);
        match next.side() {
            Some(side) => {
                self.fields.insert(key.to_string(), side);
            }
            None => {
                self.fields.remove(key);
            }
        }
        next
    }

    /// Select `side` for `key` unconditionally.
    pub fn set(&mut self, key: &str, side: Side) {
        self.fields.insert(key.to_string(), side);
    }

    /// Select `action` with the same toggle rule as field choices.
    pub fn apply_decision(&mut self, action: ElementAction) -> Option<ElementAction> {
        self.decision = if self.decision == Some(action) {
            None
        } else {
            Some(action)
        };
        self.decision
    }

    /// Returns `true` if nothing has been chosen.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.decision.is_none()
    }

    /// Number of fields with a side chosen.
    pub fn chosen_count(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>> FromIterator<(K, Side)> for ChoiceSet {
    fn from_iter<I: IntoIterator<Item = (K, Side)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, s)| (k.into(), s)).collect(),
            decision: None,
        }
    }
}
