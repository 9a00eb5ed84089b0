use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of an accepted merge submission. Time-ordered (UUID v7).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(uuid::Uuid);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First eight hex digits, for terminal output.
    pub fn short_id(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_v7_and_distinct() {
        let a = SubmissionId::generate();
        let b = SubmissionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.0.get_version_num(), 7);
    }

    #[test]
    fn serializes_as_plain_uuid() {
        let id = SubmissionId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(id.short_id().len(), 8);
        assert!(id.to_string().starts_with(&id.short_id()));
    }
}
