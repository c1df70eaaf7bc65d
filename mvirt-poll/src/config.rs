//! Poll configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Settings passed into every poll entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Use the legacy split listing even when the backend supports bulk listing.
    pub force_split_listing: bool,
}

impl PollConfig {
    /// Config that always takes the legacy split path.
    pub fn split_only() -> Self {
        Self {
            force_split_listing: true,
        }
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Whether the bulk listing may be used when the backend offers it.
    pub fn allows_bulk(&self) -> bool {
        !self.force_split_listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_prefers_bulk() {
        let config = PollConfig::default();
        assert!(config.allows_bulk());
    }

    #[test]
    fn test_split_only_disables_bulk() {
        let config = PollConfig::split_only();
        assert!(!config.allows_bulk());
    }

    #[test]
    fn test_load_missing_fields_use_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();
        let config = PollConfig::load(file.path()).unwrap();
        assert_eq!(config, PollConfig::default());
    }

    #[test]
    fn test_load_force_split() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"force_split_listing": true}"#).unwrap();
        let config = PollConfig::load(file.path()).unwrap();
        assert!(config.force_split_listing);
    }
}
