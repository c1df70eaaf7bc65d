//! Resource kinds polled from a backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of backend object tracked by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    StoragePool,
    StorageVolume,
    Interface,
    NodeDevice,
    Domain,
}

impl ResourceKind {
    /// All kinds, in the order a full inventory refresh polls them.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Network,
        ResourceKind::StoragePool,
        ResourceKind::StorageVolume,
        ResourceKind::Interface,
        ResourceKind::NodeDevice,
        ResourceKind::Domain,
    ];

    /// Short name used in log messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::StoragePool => "pool",
            ResourceKind::StorageVolume => "volume",
            ResourceKind::Interface => "interface",
            ResourceKind::NodeDevice => "nodedev",
            ResourceKind::Domain => "domain",
        }
    }

    /// Whether the legacy API reports inactive objects of this kind.
    ///
    /// Volumes and node devices only have an "active" listing.
    pub fn has_inactive_listing(&self) -> bool {
        !matches!(self, ResourceKind::StorageVolume | ResourceKind::NodeDevice)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_short_names() {
        assert_eq!(ResourceKind::StoragePool.to_string(), "pool");
        assert_eq!(ResourceKind::NodeDevice.to_string(), "nodedev");
        assert_eq!(ResourceKind::Domain.to_string(), "domain");
    }

    #[test]
    fn test_serde_snake_case() {
        let kind: ResourceKind = serde_json::from_str("\"storage_volume\"").unwrap();
        assert_eq!(kind, ResourceKind::StorageVolume);
        assert_eq!(
            serde_json::to_string(&ResourceKind::NodeDevice).unwrap(),
            "\"node_device\""
        );
    }

    #[test]
    fn test_inactive_listing() {
        assert!(ResourceKind::Network.has_inactive_listing());
        assert!(ResourceKind::Domain.has_inactive_listing());
        assert!(!ResourceKind::StorageVolume.has_inactive_listing());
        assert!(!ResourceKind::NodeDevice.has_inactive_listing());
    }
}
