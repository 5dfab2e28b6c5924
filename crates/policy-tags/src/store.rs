//! Collaborator traits
//!
//! The synchronization engine reads the remote topic log through
//! [`RemoteLog`] and persists through [`TagStore`]. The tags manager resolves
//! tagged documents through [`DocumentResolver`].

use crate::error::{LogError, StoreResult};
use crate::types::{CacheFilter, MessageType, TagCacheRecord, TagFilter, TagMessage, TagRecord, TargetDocument};
use async_trait::async_trait;

/// Append-only topic log reader
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteLog: Send + Sync {
    /// All messages of a kind on a topic, in log order
    async fn get_messages(&self, topic_id: &str, kind: MessageType) -> Result<Vec<TagMessage>, LogError>;
}

/// Local tag persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Tags matching a filter
    async fn get_tags(&self, filter: &TagFilter) -> StoreResult<Vec<TagRecord>>;

    /// Tag by uuid
    async fn get_tag_by_id(&self, uuid: &str) -> StoreResult<Option<TagRecord>>;

    /// Insert a tag, assigning its store identity
    async fn create_tag(&self, tag: TagRecord) -> StoreResult<TagRecord>;

    /// Replace a stored tag
    async fn update_tag(&self, tag: TagRecord) -> StoreResult<TagRecord>;

    /// Delete a stored tag
    async fn remove_tag(&self, tag: &TagRecord) -> StoreResult<()>;

    /// Cache rows matching a filter
    async fn get_tag_cache(&self, filter: &CacheFilter) -> StoreResult<Vec<TagCacheRecord>>;

    /// Insert a cache row
    async fn create_tag_cache(&self, cache: TagCacheRecord) -> StoreResult<TagCacheRecord>;

    /// Replace a cache row
    async fn update_tag_cache(&self, cache: TagCacheRecord) -> StoreResult<TagCacheRecord>;
}

/// Resolves documents a tag may target
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Document by id within a policy
    async fn get_document(&self, id: &str, policy_id: &str) -> StoreResult<Option<TargetDocument>>;
}
