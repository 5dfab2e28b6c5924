//! Tags manager
//!
//! Handles the actions of a tags manager block: create a Draft tag on a
//! document, search tags of documents, synchronize a document's tags with
//! its topic, and delete a Draft tag. Actions arrive as JSON objects
//! dispatched on their `operation` field.

use crate::error::TagActionError;
use crate::store::{DocumentResolver, TagStore};
use crate::sync::TagSynchronizer;
use crate::types::{CacheFilter, DocumentTags, TagFilter, TagOperation, TagRecord, TagStatus, TagType, TargetDocument};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Tag as submitted for creation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    /// Client-chosen uuid
    #[serde(default)]
    pub uuid: Option<String>,
    /// Tag name
    pub name: String,
    /// Tag description
    #[serde(default)]
    pub description: String,
    /// Local id of the tagged document
    #[serde(default)]
    pub local_target: Option<String>,
    /// Fallback document id
    #[serde(default)]
    pub target: Option<String>,
}

impl NewTag {
    /// Create tag for a document
    #[must_use]
    pub fn new(name: impl Into<String>, local_target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_target: Some(local_target.into()),
            ..Self::default()
        }
    }
}

/// Tags manager action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum TagAction {
    /// Create a Draft tag
    Create {
        /// Tag to create
        tag: NewTag,
    },
    /// Tags of several documents
    Search {
        /// Local document ids
        targets: Vec<String>,
    },
    /// Synchronize one document
    Synchronization {
        /// Local document id
        target: String,
    },
    /// Delete a Draft tag
    Delete {
        /// Tag uuid
        uuid: String,
    },
}

impl TagAction {
    /// Decode an action, reporting the first invalid field
    pub fn from_value(value: &Value) -> Result<Self, TagActionError> {
        let operation = value
            .get("operation")
            .and_then(Value::as_str)
            .ok_or(TagActionError::UnknownOperation)?;

        match operation {
            "create" => {
                let tag = value
                    .get("tag")
                    .filter(|t| t.is_object())
                    .ok_or(TagActionError::InvalidTag)?;
                let tag = serde_json::from_value(tag.clone()).map_err(|_| TagActionError::InvalidTag)?;
                Ok(TagAction::Create { tag })
            }
            "search" => {
                let targets = value
                    .get("targets")
                    .and_then(Value::as_array)
                    .ok_or(TagActionError::InvalidTargets)?
                    .iter()
                    .map(|t| t.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or(TagActionError::InvalidTargets)?;
                Ok(TagAction::Search { targets })
            }
            "synchronization" => {
                let target = value
                    .get("target")
                    .and_then(Value::as_str)
                    .ok_or(TagActionError::InvalidTarget)?;
                Ok(TagAction::Synchronization {
                    target: target.to_string(),
                })
            }
            "delete" => {
                let uuid = value
                    .get("uuid")
                    .and_then(Value::as_str)
                    .ok_or(TagActionError::InvalidUuid)?;
                Ok(TagAction::Delete {
                    uuid: uuid.to_string(),
                })
            }
            _ => Err(TagActionError::UnknownOperation),
        }
    }
}

/// Result of a tags manager action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagActionResult {
    /// Tag created
    Created(TagRecord),
    /// Search hits
    Found(Vec<TagRecord>),
    /// Document tags after synchronization
    Synchronized(DocumentTags),
    /// Tag deleted
    Deleted,
}

/// Tags manager of one policy
pub struct TagsManager {
    policy_id: String,
    store: Arc<dyn TagStore>,
    resolver: Arc<dyn DocumentResolver>,
    synchronizer: Arc<TagSynchronizer>,
}

impl std::fmt::Debug for TagsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagsManager")
            .field("policy_id", &self.policy_id)
            .field("synchronizer", &self.synchronizer)
            .finish_non_exhaustive()
    }
}

impl TagsManager {
    /// Create manager for a policy
    #[must_use]
    pub fn new(
        policy_id: impl Into<String>,
        store: Arc<dyn TagStore>,
        resolver: Arc<dyn DocumentResolver>,
        synchronizer: Arc<TagSynchronizer>,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            store,
            resolver,
            synchronizer,
        }
    }

    /// Policy id
    #[inline]
    #[must_use]
    pub fn policy_id(&self) -> &str {
        &self.policy_id
    }

    fn entity(&self) -> TagType {
        self.synchronizer.config().entity
    }

    /// Decode and run an action on behalf of `user`
    pub async fn set_data(&self, user: &str, data: &Value) -> Result<TagActionResult, TagActionError> {
        let action = TagAction::from_value(data)?;
        self.execute(user, action).await
    }

    /// Run an action on behalf of `user`
    pub async fn execute(&self, user: &str, action: TagAction) -> Result<TagActionResult, TagActionError> {
        match action {
            TagAction::Create { tag } => self.create_tag(user, tag).await.map(TagActionResult::Created),
            TagAction::Search { targets } => self.search(&targets).await.map(TagActionResult::Found),
            TagAction::Synchronization { target } => self
                .synchronize(user, &target)
                .await
                .map(TagActionResult::Synchronized),
            TagAction::Delete { uuid } => self.delete_tag(user, &uuid).await.map(|()| TagActionResult::Deleted),
        }
    }

    /// Create a Draft tag owned by `user` on a document of this policy
    pub async fn create_tag(&self, user: &str, tag: NewTag) -> Result<TagRecord, TagActionError> {
        let target_id = tag
            .local_target
            .as_deref()
            .or(tag.target.as_deref())
            .ok_or(TagActionError::InvalidTarget)?;
        let document = self.resolve(target_id).await?;

        let record = TagRecord {
            id: None,
            uuid: tag.uuid.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: tag.name,
            description: tag.description,
            owner: user.to_string(),
            policy_id: Some(self.policy_id.clone()),
            entity: self.entity(),
            target: None,
            local_target: Some(document.id),
            status: TagStatus::Draft,
            operation: TagOperation::Create,
            message_id: None,
            topic_id: None,
            date: Some(Utc::now()),
        };
        let created = self.store.create_tag(record).await?;
        tracing::info!(uuid = %created.uuid, local_target = ?created.local_target, "Tag created");
        Ok(created)
    }

    /// Tags whose local target is one of `targets`
    pub async fn search(&self, targets: &[String]) -> Result<Vec<TagRecord>, TagActionError> {
        let filter = TagFilter::new().local_targets(targets.iter().cloned()).entity(self.entity());
        Ok(self.store.get_tags(&filter).await?)
    }

    /// Synchronize a document's tags with its topic
    pub async fn synchronize(&self, user: &str, target: &str) -> Result<DocumentTags, TagActionError> {
        let document = self.resolve(target).await?;
        let (Some(topic_id), Some(remote_target)) = (document.topic_id.as_deref(), document.target.as_deref())
        else {
            tracing::warn!(target, "Document is not published, nothing to synchronize");
            return Err(TagActionError::InvalidTarget);
        };

        self.synchronizer.synchronize(topic_id, remote_target, target).await?;
        self.document_tags(target, user).await
    }

    /// Synchronize several documents concurrently
    pub async fn synchronize_many(
        &self,
        user: &str,
        targets: &[String],
    ) -> Vec<(String, Result<DocumentTags, TagActionError>)> {
        let runs = targets.iter().map(|target| async move {
            let result = self.synchronize(user, target).await;
            (target.clone(), result)
        });
        futures::future::join_all(runs).await
    }

    /// Delete a Draft tag owned by `user`
    pub async fn delete_tag(&self, user: &str, uuid: &str) -> Result<(), TagActionError> {
        let tag = self
            .store
            .get_tag_by_id(uuid)
            .await?
            .ok_or(TagActionError::InvalidTag)?;
        if tag.owner != user {
            return Err(TagActionError::NotOwner);
        }
        if tag.status != TagStatus::Draft {
            return Err(TagActionError::NotDraft);
        }
        self.store.remove_tag(&tag).await?;
        tracing::info!(uuid, "Tag deleted");
        Ok(())
    }

    /// Tags of a document with the latest cache date
    pub async fn document_tags(&self, document_id: &str, user: &str) -> Result<DocumentTags, TagActionError> {
        let entity = self.entity();
        let filter = TagFilter::new().local_target(document_id).entity(entity);
        let tags = self.store.get_tags(&filter).await?;
        let cache = self
            .store
            .get_tag_cache(&CacheFilter::new(document_id, entity))
            .await?;

        Ok(DocumentTags {
            entity,
            refresh_date: cache.last().map(|c| c.date),
            target: document_id.to_string(),
            owner: user.to_string(),
            tags,
        })
    }

    /// Tag views of several documents
    pub async fn join_data(&self, document_ids: &[String], user: &str) -> Result<Vec<DocumentTags>, TagActionError> {
        let views = document_ids.iter().map(|id| self.document_tags(id, user));
        futures::future::try_join_all(views).await
    }

    async fn resolve(&self, id: &str) -> Result<TargetDocument, TagActionError> {
        self.resolver
            .get_document(id, &self.policy_id)
            .await?
            .ok_or(TagActionError::InvalidTarget)
    }
}
