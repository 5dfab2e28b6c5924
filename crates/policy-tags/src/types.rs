//! Tag, message and cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entity a tag is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TagType {
    /// Policy-produced document
    #[default]
    PolicyDocument,
    /// Policy
    Policy,
    /// Schema
    Schema,
}

/// Tag lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TagStatus {
    /// Local only
    #[default]
    Draft,
    /// Mirrored from the topic log
    Published,
}

/// Tag operation carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TagOperation {
    /// Tag was added
    #[default]
    Create,
    /// Tag was withdrawn
    Delete,
}

/// Kind of message on a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Tag message
    Tag,
    /// Verifiable credential document
    VcDocument,
}

/// Tag message read from a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMessage {
    /// Message id (consensus timestamp)
    pub id: String,
    /// Topic the message was read from
    pub topic_id: String,
    /// Remote reference of the tagged entity
    pub target: String,
    /// Tag uuid
    pub uuid: String,
    /// Tag name
    pub name: String,
    /// Tag description
    #[serde(default)]
    pub description: String,
    /// Publisher
    pub owner: String,
    /// Operation
    #[serde(default)]
    pub operation: TagOperation,
}

impl TagMessage {
    /// Create message with empty description
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        topic_id: impl Into<String>,
        target: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic_id: topic_id.into(),
            target: target.into(),
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            owner: String::new(),
            operation: TagOperation::Create,
        }
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Locally stored tag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// Store identity, absent until first write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tag uuid
    #[serde(default)]
    pub uuid: String,
    /// Tag name
    #[serde(default)]
    pub name: String,
    /// Tag description
    #[serde(default)]
    pub description: String,
    /// Owner
    #[serde(default)]
    pub owner: String,
    /// Policy the tag was created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    /// Tagged entity kind
    #[serde(default)]
    pub entity: TagType,
    /// Remote reference of the tagged entity
    #[serde(default)]
    pub target: Option<String>,
    /// Local id of the tagged entity
    #[serde(default)]
    pub local_target: Option<String>,
    /// Status
    #[serde(default)]
    pub status: TagStatus,
    /// Operation
    #[serde(default)]
    pub operation: TagOperation,
    /// Source message, Published only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Source topic, Published only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TagRecord {
    /// Create draft tag
    #[must_use]
    pub fn draft(name: impl Into<String>, owner: impl Into<String>, local_target: impl Into<String>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            owner: owner.into(),
            local_target: Some(local_target.into()),
            ..Self::default()
        }
    }

    /// Whether the record is a consistent Draft or Published tag
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TagStatus::Draft => self.message_id.is_none(),
            TagStatus::Published => self.message_id.is_some() && self.topic_id.is_some(),
        }
    }

    /// Overwrite content fields from a message and mark Published
    pub fn apply_message(&mut self, message: &TagMessage, local_target: &str, entity: TagType) {
        self.uuid.clone_from(&message.uuid);
        self.name.clone_from(&message.name);
        self.description.clone_from(&message.description);
        self.owner.clone_from(&message.owner);
        self.operation = message.operation;
        self.target = Some(message.target.clone());
        self.local_target = Some(local_target.to_string());
        self.entity = entity;
        self.message_id = Some(message.id.clone());
        self.topic_id = Some(message.topic_id.clone());
        self.status = TagStatus::Published;
    }
}

/// Last synchronization time of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCacheRecord {
    /// Store identity, absent until first write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Local id of the synchronized entity
    pub local_target: String,
    /// Entity kind
    pub entity: TagType,
    /// Time of the last completed synchronization
    pub date: DateTime<Utc>,
}

/// Tag query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFilter {
    /// Accepted local targets; `None` accepts all
    pub local_targets: Option<Vec<String>>,
    /// Entity kind
    pub entity: Option<TagType>,
    /// Status
    pub status: Option<TagStatus>,
}

impl TagFilter {
    /// Create filter accepting everything
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags of one local target
    #[inline]
    #[must_use]
    pub fn local_target(mut self, target: impl Into<String>) -> Self {
        self.local_targets = Some(vec![target.into()]);
        self
    }

    /// Tags of any of the given local targets
    #[must_use]
    pub fn local_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    /// With entity kind
    #[inline]
    #[must_use]
    pub fn entity(mut self, entity: TagType) -> Self {
        self.entity = Some(entity);
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn status(mut self, status: TagStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a record satisfies the filter
    #[must_use]
    pub fn matches(&self, tag: &TagRecord) -> bool {
        let target_ok = match (&self.local_targets, &tag.local_target) {
            (None, _) => true,
            (Some(targets), Some(target)) => targets.iter().any(|t| t == target),
            (Some(_), None) => false,
        };
        target_ok
            && self.entity.map_or(true, |e| e == tag.entity)
            && self.status.map_or(true, |s| s == tag.status)
    }
}

/// Cache query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFilter {
    /// Local id of the synchronized entity
    pub local_target: String,
    /// Entity kind
    pub entity: TagType,
}

impl CacheFilter {
    /// Create filter
    #[inline]
    #[must_use]
    pub fn new(local_target: impl Into<String>, entity: TagType) -> Self {
        Self {
            local_target: local_target.into(),
            entity,
        }
    }

    /// Whether a record satisfies the filter
    #[inline]
    #[must_use]
    pub fn matches(&self, cache: &TagCacheRecord) -> bool {
        cache.local_target == self.local_target && cache.entity == self.entity
    }
}

/// Tagged document as resolved for the tags manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDocument {
    /// Local document id
    pub id: String,
    /// Topic the document was published to
    #[serde(default)]
    pub topic_id: Option<String>,
    /// Remote reference of the document (its message id)
    #[serde(default)]
    pub target: Option<String>,
}

/// Tags of one document with their freshness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTags {
    /// Entity kind
    pub entity: TagType,
    /// Latest cache date
    pub refresh_date: Option<DateTime<Utc>>,
    /// Local document id
    pub target: String,
    /// Requesting user
    pub owner: String,
    /// Tags of the document
    pub tags: Vec<TagRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_message_publishes() {
        let message = TagMessage::new("1700000000.000000001", "0.0.5", "doc1", "Verified").with_owner("did:a");
        let mut tag = TagRecord::default();

        tag.apply_message(&message, "local1", TagType::PolicyDocument);

        assert_eq!(tag.status, TagStatus::Published);
        assert_eq!(tag.message_id.as_deref(), Some("1700000000.000000001"));
        assert_eq!(tag.local_target.as_deref(), Some("local1"));
        assert_eq!(tag.owner, "did:a");
        assert!(tag.is_consistent());
    }

    #[test]
    fn draft_is_consistent() {
        let tag = TagRecord::draft("Reviewed", "did:a", "doc1");
        assert!(tag.is_consistent());
        assert_eq!(tag.status, TagStatus::Draft);
    }

    #[test]
    fn filter_matches() {
        let tag = TagRecord {
            status: TagStatus::Published,
            ..TagRecord::draft("x", "did:a", "doc1")
        };
        assert!(TagFilter::new().local_target("doc1").matches(&tag));
        assert!(TagFilter::new().local_targets(["doc0", "doc1"]).status(TagStatus::Published).matches(&tag));
        assert!(!TagFilter::new().local_target("doc2").matches(&tag));
        assert!(!TagFilter::new().status(TagStatus::Draft).matches(&tag));
        assert!(!TagFilter::new().entity(TagType::Schema).matches(&tag));
    }

    #[test]
    fn record_wire_form() {
        let tag: TagRecord = serde_json::from_value(json!({
            "uuid": "u1",
            "name": "Verified",
            "localTarget": "doc1",
            "status": "Published",
            "messageId": "m1",
            "topicId": "0.0.5"
        }))
        .unwrap();
        assert_eq!(tag.entity, TagType::PolicyDocument);
        assert_eq!(tag.message_id.as_deref(), Some("m1"));
    }
}
