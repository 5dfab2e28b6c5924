//! In-process collaborators
//!
//! [`MemoryTagStore`], [`MemoryRemoteLog`] and [`MemoryDocuments`] keep
//! everything in memory. They back single-process deployments and tests.

use crate::error::{LogError, StoreError, StoreResult};
use crate::store::{DocumentResolver, RemoteLog, TagStore};
use crate::types::{CacheFilter, MessageType, TagCacheRecord, TagFilter, TagMessage, TagRecord, TargetDocument};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tag store backed by vectors
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: RwLock<Vec<TagRecord>>,
    cache: RwLock<Vec<TagCacheRecord>>,
    next_id: AtomicU64,
}

impl MemoryTagStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored tags
    #[must_use]
    pub fn tags(&self) -> Vec<TagRecord> {
        self.tags.read().clone()
    }

    /// All cache rows
    #[must_use]
    pub fn cache_rows(&self) -> Vec<TagCacheRecord> {
        self.cache.read().clone()
    }

    /// Insert a tag as is, assigning an identity when missing
    pub fn seed(&self, tag: TagRecord) -> TagRecord {
        let tag = self.with_identity(tag);
        self.tags.write().push(tag.clone());
        tag
    }

    fn with_identity(&self, mut tag: TagRecord) -> TagRecord {
        if tag.id.is_none() {
            tag.id = Some(self.next_id());
        }
        tag
    }

    fn next_id(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn get_tags(&self, filter: &TagFilter) -> StoreResult<Vec<TagRecord>> {
        Ok(self.tags.read().iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn get_tag_by_id(&self, uuid: &str) -> StoreResult<Option<TagRecord>> {
        Ok(self.tags.read().iter().find(|t| t.uuid == uuid).cloned())
    }

    async fn create_tag(&self, tag: TagRecord) -> StoreResult<TagRecord> {
        Ok(self.seed(tag))
    }

    async fn update_tag(&self, tag: TagRecord) -> StoreResult<TagRecord> {
        let id = tag.id.clone().ok_or_else(|| StoreError::NotFound(tag.uuid.clone()))?;
        let mut tags = self.tags.write();
        let slot = tags
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id.as_str()))
            .ok_or(StoreError::NotFound(id))?;
        *slot = tag.clone();
        Ok(tag)
    }

    async fn remove_tag(&self, tag: &TagRecord) -> StoreResult<()> {
        self.tags.write().retain(|t| t.id != tag.id);
        Ok(())
    }

    async fn get_tag_cache(&self, filter: &CacheFilter) -> StoreResult<Vec<TagCacheRecord>> {
        Ok(self.cache.read().iter().filter(|c| filter.matches(c)).cloned().collect())
    }

    async fn create_tag_cache(&self, mut cache: TagCacheRecord) -> StoreResult<TagCacheRecord> {
        if cache.id.is_none() {
            cache.id = Some(self.next_id());
        }
        self.cache.write().push(cache.clone());
        Ok(cache)
    }

    async fn update_tag_cache(&self, cache: TagCacheRecord) -> StoreResult<TagCacheRecord> {
        let mut rows = self.cache.write();
        let slot = rows
            .iter_mut()
            .find(|c| c.id.is_some() && c.id == cache.id)
            .ok_or_else(|| StoreError::NotFound(cache.local_target.clone()))?;
        *slot = cache.clone();
        Ok(cache)
    }
}

/// Topic log keyed by topic id
#[derive(Debug, Default)]
pub struct MemoryRemoteLog {
    topics: DashMap<String, Vec<(MessageType, TagMessage)>>,
}

impl MemoryRemoteLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its topic
    pub fn publish(&self, kind: MessageType, message: TagMessage) {
        self.topics
            .entry(message.topic_id.clone())
            .or_default()
            .push((kind, message));
    }

    /// Append a tag message
    pub fn publish_tag(&self, message: TagMessage) {
        self.publish(MessageType::Tag, message);
    }
}

#[async_trait]
impl RemoteLog for MemoryRemoteLog {
    async fn get_messages(&self, topic_id: &str, kind: MessageType) -> Result<Vec<TagMessage>, LogError> {
        let topic = self
            .topics
            .get(topic_id)
            .ok_or_else(|| LogError::TopicNotFound(topic_id.to_string()))?;
        Ok(topic
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect())
    }
}

/// Documents keyed by (policy id, document id)
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    documents: DashMap<(String, String), TargetDocument>,
}

impl MemoryDocuments {
    /// Create empty resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document of a policy
    pub fn insert(&self, policy_id: impl Into<String>, document: TargetDocument) {
        self.documents
            .insert((policy_id.into(), document.id.clone()), document);
    }
}

#[async_trait]
impl DocumentResolver for MemoryDocuments {
    async fn get_document(&self, id: &str, policy_id: &str) -> StoreResult<Option<TargetDocument>> {
        Ok(self
            .documents
            .get(&(policy_id.to_string(), id.to_string()))
            .map(|d| d.value().clone()))
    }
}
