//! Policy model: the owned block tree
//!
//! [`PolicyModel`] exclusively owns the root [`BlockNode`] and is the only way
//! to mutate the tree. Every structural mutation notifies subscribers
//! synchronously, exactly once, after the mutation has been applied.

use crate::document::{PolicyDocument, PolicyStatus};
use crate::error::{TreeError, TreeResult};
use crate::node::{BlockNode, BlockRef};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

fn next_tag_candidate() -> String {
    format!("Block_{}", NEXT_TAG.fetch_add(1, Ordering::Relaxed))
}

/// Registry rule deciding which block types may nest
pub trait ChildRule: Send + Sync {
    /// Whether a block of `parent_type` accepts a child of `child_type`
    fn can_contain(&self, parent_type: &str, child_type: &str) -> bool;
}

/// Structural change delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    /// A block was appended under `parent`
    ChildAdded { parent: String, tag: String },
    /// A block and its subtree were detached
    BlockRemoved { tag: String },
    /// A block's properties were edited in place
    BlockUpdated { tag: String },
    /// The whole tree was replaced
    Rebuilt,
}

/// Subscription handle returned by [`PolicyModel::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ModelChange) + Send>;

/// Owned policy block tree with change notification
pub struct PolicyModel {
    /// Document metadata; `config` is always `None` here
    meta: PolicyDocument,
    root: Option<BlockNode>,
    readonly: bool,
    rules: Option<Arc<dyn ChildRule>>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for PolicyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyModel")
            .field("id", &self.meta.id)
            .field("status", &self.meta.status)
            .field("readonly", &self.readonly)
            .field("blocks", &self.root.as_ref().map_or(0, BlockNode::count))
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for PolicyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyModel {
    /// Create empty model (no root, not valid)
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: PolicyDocument::default(),
            root: None,
            readonly: false,
            rules: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Hydrate model from a persisted document
    ///
    /// Untagged blocks receive generated tags, and blocks without an id an
    /// id derived from their tag.
    ///
    /// # Errors
    /// - `TreeError::DuplicateTag` if two blocks share a tag
    pub fn from_document(mut document: PolicyDocument) -> TreeResult<Self> {
        let root = document.config.take();
        let readonly = document.status.is_readonly();
        let mut model = Self {
            meta: document,
            readonly,
            ..Self::new()
        };
        model.root = root.map(prepare_tree).transpose()?;
        Ok(model)
    }

    /// With registry rule enforced by [`PolicyModel::create_child`]
    #[inline]
    #[must_use]
    pub fn with_child_rule(mut self, rules: Arc<dyn ChildRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Whether a root block is present
    #[inline]
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.is_some()
    }

    /// Root block
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&BlockNode> {
        self.root.as_ref()
    }

    /// Whether edits are refused
    #[inline]
    #[must_use]
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// Make the model read-only; there is no way back
    pub fn mark_readonly(&mut self) {
        self.readonly = true;
    }

    /// Policy status
    #[inline]
    #[must_use]
    pub fn status(&self) -> PolicyStatus {
        self.meta.status
    }

    /// Policy id, once persisted
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.meta.id.as_deref()
    }

    /// Policy version
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.meta.version.as_deref()
    }

    /// Topic the policy publishes to
    #[inline]
    #[must_use]
    pub fn topic_id(&self) -> Option<&str> {
        self.meta.topic_id.as_deref()
    }

    /// Policy roles
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.meta.policy_roles
    }

    /// Serialize current state into a structural document
    #[must_use]
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            config: self.root.clone(),
            ..self.meta.clone()
        }
    }

    /// Register a change observer
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ModelChange) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a change observer
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    /// Generate a tag not used anywhere in the tree
    #[must_use]
    pub fn get_new_tag(&self) -> String {
        let existing = self.root.as_ref().map(BlockNode::tags).unwrap_or_default();
        loop {
            let tag = next_tag_candidate();
            if !existing.contains(tag.as_str()) {
                return tag;
            }
        }
    }

    /// Resolve a reference to the owned block with the same tag
    ///
    /// # Errors
    /// - `TreeError::NotFound` if no block carries the tag
    pub fn get_block<'a>(&self, reference: impl Into<BlockRef<'a>>) -> TreeResult<&BlockNode> {
        let tag = reference
            .into()
            .tag()
            .ok_or(TreeError::UnresolvedReference)?;
        self.root
            .as_ref()
            .and_then(|r| r.find(tag))
            .ok_or_else(|| TreeError::NotFound(tag.to_string()))
    }

    /// Append `child` under `parent`
    ///
    /// Untagged blocks in `child` receive fresh tags. Returns the child's tag.
    ///
    /// # Errors
    /// - `TreeError::NotFound` if `parent` is not in the tree
    /// - `TreeError::InvalidParent` if the registry rule rejects the nesting
    /// - `TreeError::DuplicateTag` if a tag in `child` is already used
    pub fn create_child<'a>(
        &mut self,
        parent: impl Into<BlockRef<'a>>,
        mut child: BlockNode,
    ) -> TreeResult<String> {
        self.ensure_writable()?;
        let parent_tag = self.resolve_tag(parent)?;
        let parent_type = self.get_block(parent_tag.as_str())?.block_type.clone();
        if let Some(rules) = &self.rules {
            if !rules.can_contain(&parent_type, &child.block_type) {
                return Err(TreeError::invalid_parent(parent_type, child.block_type));
            }
        }

        self.assign_tags(&mut child)?;
        let tag = child.tag.clone();
        self.block_mut(&parent_tag)?.children.push(child);

        tracing::debug!(parent = %parent_tag, tag = %tag, "block added");
        self.notify(ModelChange::ChildAdded {
            parent: parent_tag,
            tag: tag.clone(),
        });
        Ok(tag)
    }

    /// Deep-copy `source` under `target`, regenerating every tag and id
    ///
    /// Returns the tag of the copied subtree root.
    ///
    /// # Errors
    /// - `TreeError::NotFound` if `target` is not in the tree
    /// - `TreeError::InvalidParent` if the registry rule rejects the nesting
    pub fn copy_child<'a>(
        &mut self,
        target: impl Into<BlockRef<'a>>,
        source: &BlockNode,
    ) -> TreeResult<String> {
        self.ensure_writable()?;
        let mut copy = source.clone();
        let existing: HashSet<String> = self
            .root
            .as_ref()
            .map(|r| r.tags().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        copy.rekey(&mut || fresh_tag(&existing));
        self.create_child(target, copy)
    }

    /// Detach a block and its whole subtree
    ///
    /// Removing the root is ignored and returns `Ok(None)`.
    ///
    /// # Errors
    /// - `TreeError::NotFound` if the block is not in the tree
    pub fn remove_block<'a>(
        &mut self,
        reference: impl Into<BlockRef<'a>>,
    ) -> TreeResult<Option<BlockNode>> {
        self.ensure_writable()?;
        let tag = self.resolve_tag(reference)?;
        let root = self.root.as_mut().ok_or(TreeError::EmptyTree)?;
        if root.tag == tag {
            tracing::warn!(tag = %tag, "root block cannot be removed");
            return Ok(None);
        }

        let parent = root
            .find_parent_mut(&tag)
            .ok_or_else(|| TreeError::NotFound(tag.clone()))?;
        let index = parent
            .children
            .iter()
            .position(|c| c.tag == tag)
            .ok_or_else(|| TreeError::NotFound(tag.clone()))?;
        let removed = parent.children.remove(index);

        tracing::debug!(tag = %tag, blocks = removed.count(), "block removed");
        self.notify(ModelChange::BlockRemoved { tag });
        Ok(Some(removed))
    }

    /// Edit a block in place
    ///
    /// The edit is applied to a copy and committed only if tags stay unique.
    ///
    /// # Errors
    /// - `TreeError::NotFound` if the block is not in the tree
    /// - `TreeError::DuplicateTag` if the edit would duplicate a tag
    pub fn update_block<'a, F>(&mut self, reference: impl Into<BlockRef<'a>>, edit: F) -> TreeResult<()>
    where
        F: FnOnce(&mut BlockNode),
    {
        self.ensure_writable()?;
        let tag = self.resolve_tag(reference)?;
        let mut edited = self.get_block(tag.as_str())?.clone();
        edit(&mut edited);

        let others: HashSet<String> = {
            let root = self.root.as_ref().ok_or(TreeError::EmptyTree)?;
            let own = root.find(&tag).map(BlockNode::tags).unwrap_or_default();
            root.tags()
                .into_iter()
                .filter(|t| !own.contains(t))
                .map(str::to_string)
                .collect()
        };
        if let Some(dup) = edited.first_duplicate_tag() {
            return Err(TreeError::DuplicateTag(dup.to_string()));
        }
        if let Some(dup) = edited.tags().into_iter().find(|t| others.contains(*t)) {
            return Err(TreeError::DuplicateTag(dup.to_string()));
        }
        edited.fill_tags(&mut || fresh_tag(&others));
        assign_ids(&mut edited, self.root.as_ref().map(block_ids).unwrap_or_default());

        let new_tag = edited.tag.clone();
        *self.block_mut(&tag)? = edited;

        self.notify(ModelChange::BlockUpdated { tag: new_tag });
        Ok(())
    }

    /// Replace the tree
    ///
    /// With `None`, rebuilds from the model's own serialized root, which is a
    /// fixed point. Identity, metadata and subscribers are preserved.
    /// Validation annotations are cleared.
    ///
    /// # Errors
    /// - `TreeError::DuplicateTag` if two blocks of the new tree share a tag
    pub fn rebuild(&mut self, root: Option<BlockNode>) -> TreeResult<()> {
        self.ensure_writable()?;
        let source = match root {
            Some(root) => Some(root),
            None => self.to_document().config,
        };
        let mut root = source.map(prepare_tree).transpose()?;
        if let Some(root) = root.as_mut() {
            root.clear_errors();
        }
        self.root = root;

        tracing::info!(
            blocks = self.root.as_ref().map_or(0, BlockNode::count),
            valid = self.valid(),
            "policy rebuilt"
        );
        self.notify(ModelChange::Rebuilt);
        Ok(())
    }

    /// Record validation errors on a block; not a structural change
    pub fn set_block_errors(&mut self, tag: &str, errors: Vec<String>) -> bool {
        match self.root.as_mut().and_then(|r| r.find_mut(tag)) {
            Some(block) => {
                block.set_errors(errors);
                true
            }
            None => false,
        }
    }

    /// Drop all validation annotations
    pub fn clear_errors(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.clear_errors();
        }
    }

    fn ensure_writable(&self) -> TreeResult<()> {
        if self.readonly {
            return Err(TreeError::ReadOnly);
        }
        Ok(())
    }

    fn resolve_tag<'a>(&self, reference: impl Into<BlockRef<'a>>) -> TreeResult<String> {
        let tag = reference
            .into()
            .tag()
            .ok_or(TreeError::UnresolvedReference)?
            .to_string();
        self.get_block(tag.as_str())?;
        Ok(tag)
    }

    fn block_mut(&mut self, tag: &str) -> TreeResult<&mut BlockNode> {
        self.root
            .as_mut()
            .and_then(|r| r.find_mut(tag))
            .ok_or_else(|| TreeError::NotFound(tag.to_string()))
    }

    fn assign_tags(&self, child: &mut BlockNode) -> TreeResult<()> {
        if let Some(dup) = child.first_duplicate_tag() {
            return Err(TreeError::DuplicateTag(dup.to_string()));
        }
        let existing: HashSet<String> = self
            .root
            .as_ref()
            .map(|r| r.tags().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        if let Some(dup) = child.tags().into_iter().find(|t| existing.contains(*t)) {
            return Err(TreeError::DuplicateTag(dup.to_string()));
        }
        child.fill_tags(&mut || fresh_tag(&existing));
        assign_ids(child, self.root.as_ref().map(block_ids).unwrap_or_default());
        Ok(())
    }

    fn notify(&mut self, change: ModelChange) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&change);
        }
    }
}

fn prepare_tree(mut root: BlockNode) -> TreeResult<BlockNode> {
    if let Some(dup) = root.first_duplicate_tag() {
        return Err(TreeError::DuplicateTag(dup.to_string()));
    }
    let existing: HashSet<String> = root.tags().into_iter().map(str::to_string).collect();
    root.fill_tags(&mut || fresh_tag(&existing));
    assign_ids(&mut root, HashSet::new());
    Ok(root)
}

fn block_ids(root: &BlockNode) -> HashSet<String> {
    root.iter()
        .filter(|b| !b.id.is_empty())
        .map(|b| b.id.clone())
        .collect()
}

fn assign_ids(block: &mut BlockNode, mut taken: HashSet<String>) {
    taken.extend(block_ids(block));
    block.fill_ids(&mut taken);
}

fn fresh_tag(existing: &HashSet<String>) -> String {
    loop {
        let tag = next_tag_candidate();
        if !existing.contains(&tag) {
            return tag;
        }
    }
}
