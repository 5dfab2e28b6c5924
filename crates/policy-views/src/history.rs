//! Bounded undo/redo history
//!
//! Keeps the most recent snapshots of one document plus an undo depth that
//! counts back from the newest entry. Every change is written through to
//! the [`HistoryStore`].

use crate::error::{HistoryError, SerializeError, ViewResult};
use crate::snapshot::{self, Snapshot};
use crate::store::HistoryStore;
use std::collections::VecDeque;
use std::sync::Arc;

/// Snapshot history of one document
pub struct HistoryManager {
    key: String,
    store: Arc<dyn HistoryStore>,
    capacity: usize,
    states: VecDeque<Snapshot>,
    undo_depth: usize,
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .field("states", &self.states.len())
            .field("undo_depth", &self.undo_depth)
            .finish_non_exhaustive()
    }
}

impl HistoryManager {
    /// Create empty history for `key`
    #[must_use]
    pub fn new(key: impl Into<String>, store: Arc<dyn HistoryStore>, capacity: usize) -> Self {
        Self {
            key: key.into(),
            store,
            capacity: capacity.max(1),
            states: VecDeque::new(),
            undo_depth: 0,
        }
    }

    /// Document key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace in-memory history with the persisted one
    ///
    /// Only the newest `capacity` entries are kept.
    pub fn load(&mut self) -> Result<(), HistoryError> {
        let states = match self.store.read(&self.key)? {
            Some(encoded) => snapshot::decode(&self.key, &encoded)?,
            None => Vec::new(),
        };
        let skip = states.len().saturating_sub(self.capacity);
        self.states = states.into_iter().skip(skip).collect();
        self.undo_depth = 0;
        tracing::debug!(key = %self.key, states = self.states.len(), "History loaded");
        Ok(())
    }

    /// Append a snapshot
    ///
    /// Drops the redo branch when undone entries exist and evicts the
    /// oldest entry at capacity.
    pub fn push(&mut self, snapshot: Snapshot) -> ViewResult<()> {
        if self.undo_depth != 0 {
            let keep = self.states.len() - self.undo_depth;
            self.states.truncate(keep);
            self.undo_depth = 0;
        }
        if self.states.len() >= self.capacity {
            self.states.pop_front();
            tracing::debug!(key = %self.key, "Evicted oldest snapshot");
        }
        self.states.push_back(snapshot);
        tracing::debug!(key = %self.key, states = self.states.len(), "Snapshot saved");
        self.persist()
    }

    /// Snapshot an undo would load
    #[must_use]
    pub fn undo_target(&self) -> Option<&Snapshot> {
        let position = self.states.len().checked_sub(2 + self.undo_depth)?;
        self.states.get(position)
    }

    /// Snapshot a redo would load
    #[must_use]
    pub fn redo_target(&self) -> Option<&Snapshot> {
        if self.undo_depth == 0 {
            return None;
        }
        self.states.get(self.states.len() - self.undo_depth)
    }

    /// Record that the undo target was loaded
    pub fn commit_undo(&mut self) {
        if self.undo_target().is_some() {
            self.undo_depth += 1;
        }
    }

    /// Record that the redo target was loaded
    pub fn commit_redo(&mut self) {
        self.undo_depth = self.undo_depth.saturating_sub(1);
    }

    /// Drop all snapshots, in memory and persisted
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.states.clear();
        self.undo_depth = 0;
        self.store.remove(&self.key)?;
        tracing::info!(key = %self.key, "History cleared");
        Ok(())
    }

    /// Newest snapshot
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.states.back()
    }

    /// Snapshots, oldest first
    #[inline]
    #[must_use]
    pub fn states(&self) -> &VecDeque<Snapshot> {
        &self.states
    }

    /// Number of snapshots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if history is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Entries undone from the newest
    #[inline]
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    /// Whether an undo is possible
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_target().is_some()
    }

    /// Whether a redo is possible
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo_depth != 0
    }

    fn persist(&self) -> ViewResult<()> {
        let states: Vec<_> = self.states.iter().cloned().collect();
        let encoded = snapshot::encode(&states).map_err(SerializeError::from)?;
        self.store.write(&self.key, &encoded)?;
        Ok(())
    }
}
