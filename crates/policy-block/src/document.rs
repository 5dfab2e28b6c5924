//! Persisted policy document
//!
//! The structural form of a policy: metadata plus the root block under
//! `config`. Unknown top-level keys are carried in [`PolicyDocument::extra`].

use crate::node::BlockNode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Policy lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PolicyStatus {
    /// Editable draft
    #[default]
    #[serde(rename = "DRAFT")]
    Draft,
    /// Running against a simulated network
    #[serde(rename = "DRY-RUN")]
    DryRun,
    /// Publishing failed, editable again
    #[serde(rename = "PUBLISH_ERROR")]
    PublishError,
    /// Published to the network
    #[serde(rename = "PUBLISH")]
    Published,
    /// Retired
    #[serde(rename = "DISCONTINUED")]
    Discontinued,
}

impl PolicyStatus {
    /// Whether a policy in this status may no longer be edited
    #[inline]
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        matches!(
            self,
            PolicyStatus::DryRun | PolicyStatus::Published | PolicyStatus::Discontinued
        )
    }
}

/// Structural policy document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PolicyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_groups: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_topics: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_tokens: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Root block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BlockNode>,
}

impl PolicyDocument {
    /// Create draft document around a root block
    #[must_use]
    pub fn new(config: BlockNode) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// With id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.status = status;
        self
    }

    /// With roles
    #[inline]
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy_roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(PolicyStatus::Published).unwrap(), json!("PUBLISH"));
        assert_eq!(serde_json::to_value(PolicyStatus::DryRun).unwrap(), json!("DRY-RUN"));
        let status: PolicyStatus = serde_json::from_value(json!("PUBLISH_ERROR")).unwrap();
        assert_eq!(status, PolicyStatus::PublishError);
    }

    #[test]
    fn readonly_statuses() {
        assert!(!PolicyStatus::Draft.is_readonly());
        assert!(!PolicyStatus::PublishError.is_readonly());
        assert!(PolicyStatus::Published.is_readonly());
        assert!(PolicyStatus::DryRun.is_readonly());
    }

    #[test]
    fn unknown_keys_survive() {
        let value = json!({
            "name": "iREC",
            "status": "DRAFT",
            "codeVersion": "1.1.0",
            "config": {"id": "1", "blockType": "interfaceContainerBlock", "tag": "root"}
        });
        let doc: PolicyDocument = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(doc.extra.get("codeVersion"), Some(&json!("1.1.0")));
        assert_eq!(serde_json::to_value(&doc).unwrap(), {
            let mut expected = value;
            expected["config"]["children"] = json!([]);
            expected
        });
    }
}
