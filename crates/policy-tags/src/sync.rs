//! Tag synchronization
//!
//! Mirrors the tag messages a topic holds for one remote target into the
//! local store:
//!
//! 1. read the topic's tag messages for the remote target
//! 2. pair them with local Published tags by message id
//! 3. overwrite (or create) the local tag from each message
//! 4. leave local tags without a message untouched
//! 5. stamp the tag cache of the local target
//!
//! A failed read aborts before any write. A failed write stops the run;
//! earlier writes remain and the cache is not stamped. Runs for the same
//! local target are serialized.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::store::{RemoteLog, TagStore};
use crate::types::{CacheFilter, MessageType, TagCacheRecord, TagFilter, TagMessage, TagRecord, TagStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a completed synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Local target synchronized
    pub local_target: String,
    /// Tags written, in topic order
    pub tags: Vec<TagRecord>,
    /// Tags created
    pub created: usize,
    /// Tags updated
    pub updated: usize,
    /// Published tags with no message, left untouched
    pub dangling: usize,
    /// New cache date
    pub refreshed_at: DateTime<Utc>,
}

struct Entry {
    message: Option<TagMessage>,
    local: Option<TagRecord>,
}

/// Topic-to-store tag synchronizer
pub struct TagSynchronizer {
    log: Arc<dyn RemoteLog>,
    store: Arc<dyn TagStore>,
    config: SyncConfig,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for TagSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSynchronizer")
            .field("config", &self.config)
            .field("targets", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl TagSynchronizer {
    /// Create synchronizer
    #[must_use]
    pub fn new(log: Arc<dyn RemoteLog>, store: Arc<dyn TagStore>, config: SyncConfig) -> Self {
        Self {
            log,
            store,
            config,
            locks: DashMap::new(),
        }
    }

    /// Active config
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize `local_target` with the messages of `topic_id` that
    /// target `remote_target`
    ///
    /// Runs on one target are serialized; runs on different targets proceed
    /// concurrently.
    pub async fn synchronize(
        &self,
        topic_id: &str,
        remote_target: &str,
        local_target: &str,
    ) -> SyncResult<SyncOutcome> {
        let lock = self.lock_for(local_target);
        let result = {
            let _guard = lock.lock().await;
            self.run(topic_id, remote_target, local_target).await
        };
        drop(lock);
        // Waiting runs hold a clone, so an unshared lock is idle
        self.locks
            .remove_if(local_target, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn run(
        &self,
        topic_id: &str,
        remote_target: &str,
        local_target: &str,
    ) -> SyncResult<SyncOutcome> {
        tracing::info!(topic_id, remote_target, local_target, "Synchronizing tags");

        let messages = self
            .log
            .get_messages(topic_id, MessageType::Tag)
            .await
            .map_err(|e| {
                tracing::error!(topic_id, local_target, error = %e, "Tag synchronization aborted");
                SyncError::Aborted(e)
            })?;

        let mut order: Vec<String> = Vec::new();
        let mut entries: HashMap<String, Entry> = HashMap::new();
        for message in messages.into_iter().filter(|m| m.target == remote_target) {
            let id = message.id.clone();
            if !entries.contains_key(&id) {
                order.push(id.clone());
            }
            entries.insert(
                id,
                Entry {
                    message: Some(message),
                    local: None,
                },
            );
        }

        let filter = TagFilter::new()
            .local_target(local_target)
            .entity(self.config.entity)
            .status(TagStatus::Published);
        let mut dangling = 0;
        for tag in self.store.get_tags(&filter).await? {
            match tag.message_id.as_ref().and_then(|id| entries.get_mut(id)) {
                Some(entry) => entry.local = Some(tag),
                None => {
                    tracing::warn!(local_target, message_id = ?tag.message_id, "Published tag has no message");
                    dangling += 1;
                }
            }
        }

        let mut tags = Vec::with_capacity(order.len());
        let (mut created, mut updated) = (0, 0);
        for id in &order {
            let Some(Entry { message: Some(message), local }) = entries.remove(id) else {
                continue;
            };
            let mut tag = local.unwrap_or_default();
            tag.apply_message(&message, local_target, self.config.entity);

            let written = if tag.id.is_some() {
                self.store.update_tag(tag).await.map(|t| (t, false))
            } else {
                self.store.create_tag(tag).await.map(|t| (t, true))
            };
            match written {
                Ok((tag, is_new)) => {
                    tracing::debug!(message_id = %message.id, name = %tag.name, created = is_new, "Tag reconciled");
                    if is_new {
                        created += 1;
                    } else {
                        updated += 1;
                    }
                    tags.push(tag);
                }
                Err(e) => {
                    tracing::error!(local_target, message_id = %message.id, error = %e, "Tag write failed");
                    return Err(SyncError::persistence(tags.len(), e));
                }
            }
        }

        let refreshed_at = self
            .refresh_cache(local_target)
            .await
            .map_err(|e| SyncError::persistence(tags.len(), e))?;

        tracing::info!(local_target, created, updated, dangling, "Tags synchronized");
        Ok(SyncOutcome {
            local_target: local_target.to_string(),
            tags,
            created,
            updated,
            dangling,
            refreshed_at,
        })
    }

    async fn refresh_cache(&self, local_target: &str) -> crate::error::StoreResult<DateTime<Utc>> {
        let now = Utc::now();
        let filter = CacheFilter::new(local_target, self.config.entity);
        let rows = self.store.get_tag_cache(&filter).await?;
        if rows.is_empty() {
            self.store
                .create_tag_cache(TagCacheRecord {
                    id: None,
                    local_target: local_target.to_string(),
                    entity: self.config.entity,
                    date: now,
                })
                .await?;
        } else {
            for mut row in rows {
                row.date = now;
                self.store.update_tag_cache(row).await?;
            }
        }
        Ok(now)
    }

    fn lock_for(&self, local_target: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(local_target.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LogError, StoreError};
    use crate::memory::{MemoryRemoteLog, MemoryTagStore};
    use crate::store::{MockRemoteLog, MockTagStore};
    use crate::types::TagType;

    fn message(id: &str, target: &str, name: &str) -> TagMessage {
        TagMessage::new(id, "T", target, name).with_owner("did:publisher")
    }

    fn synchronizer(log: Arc<dyn RemoteLog>, store: Arc<dyn TagStore>) -> TagSynchronizer {
        TagSynchronizer::new(log, store, SyncConfig::default())
    }

    #[tokio::test]
    async fn single_message_creates_published_tag() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        let store = Arc::new(MemoryTagStore::new());

        let outcome = synchronizer(log, store.clone())
            .synchronize("T", "doc1", "doc1")
            .await
            .unwrap();

        assert_eq!(outcome.created, 1);
        let tags = store.tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].message_id.as_deref(), Some("m1"));
        assert_eq!(tags[0].name, "Verified");
        assert_eq!(tags[0].status, TagStatus::Published);
        let cache = store.cache_rows();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].local_target, "doc1");
        assert_eq!(cache[0].entity, TagType::PolicyDocument);
        assert_eq!(cache[0].date, outcome.refreshed_at);
    }

    #[tokio::test]
    async fn other_targets_are_ignored() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        log.publish_tag(message("m2", "doc2", "Rejected"));
        let store = Arc::new(MemoryTagStore::new());

        let outcome = synchronizer(log, store.clone())
            .synchronize("T", "doc1", "local1")
            .await
            .unwrap();

        assert_eq!(outcome.tags.len(), 1);
        assert_eq!(store.tags()[0].local_target.as_deref(), Some("local1"));
    }

    #[tokio::test]
    async fn remote_overwrites_local_content() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        let store = Arc::new(MemoryTagStore::new());
        let mut stale = TagRecord::draft("Old name", "did:someone", "doc1");
        stale.status = TagStatus::Published;
        stale.message_id = Some("m1".into());
        stale.topic_id = Some("T".into());
        let stale = store.seed(stale);

        let outcome = synchronizer(log, store.clone())
            .synchronize("T", "doc1", "doc1")
            .await
            .unwrap();

        assert_eq!(outcome.updated, 1);
        let tags = store.tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, stale.id);
        assert_eq!(tags[0].name, "Verified");
        assert_eq!(tags[0].owner, "did:publisher");
    }

    #[tokio::test]
    async fn dangling_published_tags_are_kept() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        let store = Arc::new(MemoryTagStore::new());
        let mut orphan = TagRecord::draft("Orphan", "did:a", "doc1");
        orphan.status = TagStatus::Published;
        orphan.message_id = Some("gone".into());
        orphan.topic_id = Some("T".into());
        let orphan = store.seed(orphan);

        let outcome = synchronizer(log, store.clone())
            .synchronize("T", "doc1", "doc1")
            .await
            .unwrap();

        assert_eq!(outcome.dangling, 1);
        assert!(!outcome.tags.contains(&orphan));
        assert!(store.tags().contains(&orphan));
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let mut log = MockRemoteLog::new();
        log.expect_get_messages()
            .returning(|_, _| Err(LogError::Unavailable("mirror node down".into())));
        let mut store = MockTagStore::new();
        store.expect_get_tags().never();
        store.expect_create_tag().never();
        store.expect_create_tag_cache().never();
        store.expect_update_tag_cache().never();

        let result = synchronizer(Arc::new(log), Arc::new(store))
            .synchronize("T", "doc1", "doc1")
            .await;

        assert!(matches!(result, Err(SyncError::Aborted(LogError::Unavailable(_)))));
    }

    #[tokio::test]
    async fn write_failure_keeps_earlier_writes_and_cache_date() {
        let mut log = MockRemoteLog::new();
        log.expect_get_messages()
            .returning(|_, _| Ok(vec![message("m1", "doc1", "A"), message("m2", "doc1", "B")]));
        let mut store = MockTagStore::new();
        store.expect_get_tags().returning(|_| Ok(Vec::new()));
        let mut calls = 0;
        store.expect_create_tag().times(2).returning(move |mut tag| {
            calls += 1;
            if calls == 1 {
                tag.id = Some("1".into());
                Ok(tag)
            } else {
                Err(StoreError::Unavailable("disk full".into()))
            }
        });
        store.expect_get_tag_cache().never();
        store.expect_create_tag_cache().never();

        let result = synchronizer(Arc::new(log), Arc::new(store))
            .synchronize("T", "doc1", "doc1")
            .await;

        assert!(matches!(result, Err(SyncError::Persistence { written: 1, .. })));
    }

    #[tokio::test]
    async fn existing_cache_rows_all_restamped() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        let store = Arc::new(MemoryTagStore::new());
        let old = Utc::now() - chrono::Duration::days(1);
        for _ in 0..2 {
            store
                .create_tag_cache(TagCacheRecord {
                    id: None,
                    local_target: "doc1".into(),
                    entity: TagType::PolicyDocument,
                    date: old,
                })
                .await
                .unwrap();
        }

        let outcome = synchronizer(log, store.clone())
            .synchronize("T", "doc1", "doc1")
            .await
            .unwrap();

        let rows = store.cache_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.date == outcome.refreshed_at));
    }

    #[tokio::test]
    async fn target_locks_released_after_runs() {
        let log = Arc::new(MemoryRemoteLog::new());
        log.publish_tag(message("m1", "doc1", "Verified"));
        log.publish_tag(message("m2", "doc2", "Verified"));
        let sync = synchronizer(log, Arc::new(MemoryTagStore::new()));

        let (first, second, third) = tokio::join!(
            sync.synchronize("T", "doc1", "doc1"),
            sync.synchronize("T", "doc1", "doc1"),
            sync.synchronize("T", "doc2", "doc2"),
        );
        assert!(first.is_ok() && second.is_ok() && third.is_ok());
        assert!(sync.locks.is_empty());

        let mut failing = MockRemoteLog::new();
        failing
            .expect_get_messages()
            .returning(|_, _| Err(LogError::Unavailable("mirror node down".into())));
        let sync = synchronizer(Arc::new(failing), Arc::new(MemoryTagStore::new()));
        assert!(sync.synchronize("T", "doc1", "doc1").await.is_err());
        assert!(sync.locks.is_empty());
    }
}
