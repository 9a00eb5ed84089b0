use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Configuration for a reconciliation workspace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Attempts per submission before giving up. At least 1.
    pub max_submit_attempts: u32,
    /// Skip elements whose variants cannot be interpreted instead of failing
    /// the whole load.
    pub exclude_malformed: bool,
    /// After a successful submission of the active element, activate the
    /// next element that is not ready to submit.
    pub auto_advance: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_submit_attempts: 1,
            exclude_malformed: true,
            auto_advance: true,
        }
    }
}

impl ReconcileConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.max_submit_attempts == 0 {
            return Err(SdkError::Config("max_submit_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
