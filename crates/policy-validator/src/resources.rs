//! In-memory resource set
//!
//! [`ResourceSet`] is a plain serde-loadable implementation of
//! [`PolicyResources`], used by the command line tool and in tests.

use crate::context::{PolicyResources, Schema};
use crate::error::ValidationResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Static set of schemas, tokens, groups and templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSet {
    /// Known schemas
    pub schemas: Vec<Schema>,
    /// Known token ids
    pub tokens: HashSet<String>,
    /// Declared group names
    pub groups: HashSet<String>,
    /// Declared token template names
    pub token_templates: HashSet<String>,
    /// Declared topic template names
    pub topic_templates: HashSet<String>,
}

impl ResourceSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON
    pub fn from_json(input: &str) -> ValidationResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// With schema
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// With token id
    #[must_use]
    pub fn with_token(mut self, id: impl Into<String>) -> Self {
        self.tokens.insert(id.into());
        self
    }

    /// With group name
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>) -> Self {
        self.groups.insert(name.into());
        self
    }

    /// With token template name
    #[must_use]
    pub fn with_token_template(mut self, name: impl Into<String>) -> Self {
        self.token_templates.insert(name.into());
        self
    }

    /// With topic template name
    #[must_use]
    pub fn with_topic_template(mut self, name: impl Into<String>) -> Self {
        self.topic_templates.insert(name.into());
        self
    }
}

impl PolicyResources for ResourceSet {
    fn schema(&self, id: &str) -> Option<Schema> {
        self.schemas.iter().find(|s| s.id == id).cloned()
    }

    fn token_exists(&self, id: &str) -> bool {
        self.tokens.contains(id)
    }

    fn group_exists(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    fn token_template_exists(&self, name: &str) -> bool {
        self.token_templates.contains(name)
    }

    fn topic_template_exists(&self, name: &str) -> bool {
        self.topic_templates.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_json() {
        let set = ResourceSet::from_json(
            r##"{
                "schemas": [{"id": "#abc", "fields": [{"name": "amount", "type": "number"}]}],
                "tokens": ["0.0.1"],
                "groups": ["Auditors"]
            }"##,
        )
        .unwrap();

        assert!(set.schema("#abc").is_some());
        assert!(set.token_exists("0.0.1"));
        assert!(set.group_exists("Auditors"));
        assert!(!set.topic_template_exists("anything"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ResourceSet::from_json("{\"tokens\": 5}").is_err());
    }
}
