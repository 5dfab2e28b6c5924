//! Testing utilities for the policy workbench workspace
//!
//! Shared fixtures and failure-injecting collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use policy_block::{PolicyDocument, PolicyModel};
use policy_tags::memory::MemoryTagStore;
use policy_tags::{
    CacheFilter, LogError, MessageType, RemoteLog, StoreError, StoreResult, TagCacheRecord, TagFilter, TagMessage,
    TagRecord, TagStatus, TagStore,
};
use policy_validator::{ResourceSet, Schema};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SAMPLE_POLICY_ID: &str = "policy-1";
pub const SAMPLE_TOPIC: &str = "0.0.4501";

/// Policy with one tool block that has one unset variable
pub fn sample_policy_json() -> Value {
    json!({
        "id": SAMPLE_POLICY_ID,
        "name": "Renewable Energy Certificates",
        "status": "DRAFT",
        "policyRoles": ["Registrant", "Issuer"],
        "config": {
            "blockType": "interfaceContainerBlock",
            "tag": "root",
            "permissions": ["ANY_ROLE"],
            "children": [
                {
                    "blockType": "tool",
                    "tag": "mrv_tool",
                    "permissions": ["Registrant"],
                    "variables": [
                        {"name": "reportSchema", "type": "Schema"},
                        {"name": "issuer", "type": "Role"},
                        {"name": "token", "type": "Token"}
                    ],
                    "reportSchema": "#report",
                    "issuer": "Issuer"
                },
                {"blockType": "tagsManager", "tag": "tags", "permissions": ["OWNER"]}
            ]
        }
    })
}

pub fn sample_document() -> PolicyDocument {
    serde_json::from_value(sample_policy_json()).unwrap()
}

pub fn sample_model() -> PolicyModel {
    PolicyModel::from_document(sample_document()).unwrap()
}

pub fn sample_resources() -> ResourceSet {
    ResourceSet::new()
        .with_schema(Schema::new("#report").with_field("amount", "number"))
        .with_token("token-1")
        .with_group("auditors")
}

pub fn tag_message(id: &str, target: &str, name: &str) -> TagMessage {
    TagMessage::new(id, SAMPLE_TOPIC, target, name).with_owner("did:publisher")
}

pub fn published_tag(message_id: &str, local_target: &str, name: &str) -> TagRecord {
    let mut tag = TagRecord::draft(name, "did:publisher", local_target);
    tag.status = TagStatus::Published;
    tag.message_id = Some(message_id.to_string());
    tag.topic_id = Some(SAMPLE_TOPIC.to_string());
    tag
}

/// Remote log that is never reachable
#[derive(Debug, Default)]
pub struct UnavailableLog;

#[async_trait]
impl RemoteLog for UnavailableLog {
    async fn get_messages(&self, _topic_id: &str, _kind: MessageType) -> Result<Vec<TagMessage>, LogError> {
        Err(LogError::Unavailable("mirror node unreachable".into()))
    }
}

/// Memory store that rejects tag writes after a fixed number succeed
#[derive(Debug)]
pub struct FlakyTagStore {
    inner: Arc<MemoryTagStore>,
    remaining: AtomicUsize,
}

impl FlakyTagStore {
    pub fn new(inner: Arc<MemoryTagStore>, successful_writes: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(successful_writes),
        }
    }

    fn take_write(&self) -> StoreResult<()> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::Unavailable("injected write failure".into()))
    }
}

#[async_trait]
impl TagStore for FlakyTagStore {
    async fn get_tags(&self, filter: &TagFilter) -> StoreResult<Vec<TagRecord>> {
        self.inner.get_tags(filter).await
    }

    async fn get_tag_by_id(&self, uuid: &str) -> StoreResult<Option<TagRecord>> {
        self.inner.get_tag_by_id(uuid).await
    }

    async fn create_tag(&self, tag: TagRecord) -> StoreResult<TagRecord> {
        self.take_write()?;
        self.inner.create_tag(tag).await
    }

    async fn update_tag(&self, tag: TagRecord) -> StoreResult<TagRecord> {
        self.take_write()?;
        self.inner.update_tag(tag).await
    }

    async fn remove_tag(&self, tag: &TagRecord) -> StoreResult<()> {
        self.take_write()?;
        self.inner.remove_tag(tag).await
    }

    async fn get_tag_cache(&self, filter: &CacheFilter) -> StoreResult<Vec<TagCacheRecord>> {
        self.inner.get_tag_cache(filter).await
    }

    async fn create_tag_cache(&self, cache: TagCacheRecord) -> StoreResult<TagCacheRecord> {
        self.inner.create_tag_cache(cache).await
    }

    async fn update_tag_cache(&self, cache: TagCacheRecord) -> StoreResult<TagCacheRecord> {
        self.inner.update_tag_cache(cache).await
    }
}
