//! Validation context
//!
//! [`ValidatorContext`] is handed to every block validator. It exposes the
//! policy's external resources (schemas, tokens, groups, topics) and an
//! error sink scoped to the block being validated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved permission names that need no declared role
pub const BUILTIN_PERMISSIONS: &[&str] = &["NO_ROLE", "ANY_ROLE", "OWNER"];

/// Schema field description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: String,
    /// Whether the field is mandatory
    #[serde(default)]
    pub required: bool,
    /// Whether the field holds a list
    #[serde(default)]
    pub is_array: bool,
}

/// Published or draft schema referenced by blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Schema identifier (iri)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Field list
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl Schema {
    /// Create schema without fields
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            fields: Vec::new(),
        }
    }

    /// With field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            field_type: field_type.into(),
            required: false,
            is_array: false,
        });
        self
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// External resources a policy may reference
///
/// Lookups are synchronous: resources are loaded before validation starts.
pub trait PolicyResources: Send + Sync {
    /// Schema by id
    fn schema(&self, id: &str) -> Option<Schema>;

    /// Whether a token with this id exists
    fn token_exists(&self, id: &str) -> bool;

    /// Whether the policy declares this group
    fn group_exists(&self, name: &str) -> bool;

    /// Whether the policy declares this token template
    fn token_template_exists(&self, name: &str) -> bool;

    /// Whether the policy declares this topic template
    fn topic_template_exists(&self, name: &str) -> bool;
}

/// Whether `actual` provides every field described by `expected`
///
/// `expected` is a base schema shape `{"fields": [{"name", "type"}]}`.
/// A missing or malformed base schema places no constraint.
#[must_use]
pub fn compare_schema(expected: Option<&Value>, actual: &Schema) -> bool {
    let Some(fields) = expected
        .and_then(|base| base.get("fields"))
        .and_then(Value::as_array)
    else {
        return true;
    };

    fields.iter().all(|expected_field| {
        let Some(name) = expected_field.get("name").and_then(Value::as_str) else {
            return true;
        };
        match actual.field(name) {
            Some(field) => match expected_field.get("type").and_then(Value::as_str) {
                Some(field_type) => field.field_type == field_type,
                None => true,
            },
            None => false,
        }
    })
}

/// Per-block validation context
pub struct ValidatorContext<'a> {
    resources: &'a dyn PolicyResources,
    roles: &'a [String],
    errors: Vec<String>,
}

impl std::fmt::Debug for ValidatorContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorContext")
            .field("roles", &self.roles)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<'a> ValidatorContext<'a> {
    /// Create context over resources and the policy's declared roles
    #[must_use]
    pub fn new(resources: &'a dyn PolicyResources, roles: &'a [String]) -> Self {
        Self {
            resources,
            roles,
            errors: Vec::new(),
        }
    }

    /// Record an error against the current block
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Errors recorded so far
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Take recorded errors, leaving the sink empty
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    /// Schema by id
    #[must_use]
    pub fn get_schema(&self, id: &str) -> Option<Schema> {
        self.resources.schema(id)
    }

    /// Whether `actual` satisfies the base schema shape
    #[must_use]
    pub fn compare_schema(&self, expected: Option<&Value>, actual: &Schema) -> bool {
        compare_schema(expected, actual)
    }

    /// True when no token has this id
    #[must_use]
    pub fn token_not_exist(&self, id: &str) -> bool {
        !self.resources.token_exists(id)
    }

    /// True when the permission is neither built in nor a declared role
    #[must_use]
    pub fn permission_not_exist(&self, permission: &str) -> bool {
        !BUILTIN_PERMISSIONS.contains(&permission) && !self.roles.iter().any(|r| r == permission)
    }

    /// True when the policy declares no such group
    #[must_use]
    pub fn group_not_exist(&self, name: &str) -> bool {
        !self.resources.group_exists(name)
    }

    /// True when the policy declares no such token template
    #[must_use]
    pub fn token_template_not_exist(&self, name: &str) -> bool {
        !self.resources.token_template_exists(name)
    }

    /// True when the policy declares no such topic template
    #[must_use]
    pub fn topic_template_not_exist(&self, name: &str) -> bool {
        !self.resources.topic_template_exists(name)
    }
}
