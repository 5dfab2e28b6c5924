//! Synchronization configuration

use crate::types::TagType;
use serde::{Deserialize, Serialize};

/// Tag synchronization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Entity kind synchronized tags are attached to
    pub entity: TagType,
}

impl SyncConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With entity kind
    #[inline]
    #[must_use]
    pub fn with_entity(mut self, entity: TagType) -> Self {
        self.entity = entity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_policy_documents() {
        assert_eq!(SyncConfig::default().entity, TagType::PolicyDocument);
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::new());
    }
}
