//! Policy editor
//!
//! Owns the model of one policy together with its current view, its
//! snapshot history and a block clipboard. Structural edits go through the
//! model; a change subscriber marks the editor dirty and the snapshot is
//! taken once the edit has returned.

use crate::config::EditorConfig;
use crate::converter::ViewConverter;
use crate::error::{SerializeError, ViewError, ViewResult};
use crate::history::HistoryManager;
use crate::snapshot::Snapshot;
use crate::store::HistoryStore;
use crate::view::{ViewKind, ViewState};
use policy_block::{BlockNode, ChildRule, PolicyDocument, PolicyModel, TreeError};
use policy_validator::{PolicyResources, PolicyValidator, ValidationReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// History key of a policy that was never persisted
pub const UNSAVED_KEY: &str = "unsaved";

/// Outcome of comparing persisted history with the loaded policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateCheck {
    /// History matches the policy, or there was none
    Clean,
    /// Newest snapshot differs; apply or discard it
    Pending(Snapshot),
}

/// Editing session of one policy
pub struct PolicyEditor {
    model: PolicyModel,
    converter: ViewConverter,
    history: HistoryManager,
    view: ViewState,
    dirty: Arc<AtomicBool>,
    clipboard: Option<String>,
    report: Option<ValidationReport>,
}

impl std::fmt::Debug for PolicyEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEditor")
            .field("model", &self.model)
            .field("view", &self.view.kind())
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl PolicyEditor {
    /// Open an editor on a policy document
    pub fn open(
        document: PolicyDocument,
        store: Arc<dyn HistoryStore>,
        config: EditorConfig,
    ) -> ViewResult<Self> {
        let mut model = PolicyModel::from_document(document)?;
        let key = model.id().unwrap_or(UNSAVED_KEY).to_string();

        let dirty = Arc::new(AtomicBool::new(false));
        let flag = dirty.clone();
        model.subscribe(move |_| flag.store(true, Ordering::SeqCst));

        tracing::info!(key = %key, readonly = model.readonly(), "Editor opened");
        Ok(Self {
            model,
            converter: ViewConverter::new(config),
            history: HistoryManager::new(key, store, config.history_capacity),
            view: ViewState::Blocks,
            dirty,
            clipboard: None,
            report: None,
        })
    }

    /// Constrain structural edits with a child rule
    #[must_use]
    pub fn with_child_rule(mut self, rules: Arc<dyn ChildRule>) -> Self {
        let model = std::mem::take(&mut self.model);
        self.model = model.with_child_rule(rules);
        self
    }

    /// Policy model
    #[inline]
    #[must_use]
    pub fn model(&self) -> &PolicyModel {
        &self.model
    }

    /// Current view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Snapshot history
    #[inline]
    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Converter in use
    #[inline]
    #[must_use]
    pub fn converter(&self) -> &ViewConverter {
        &self.converter
    }

    /// Latest validation report
    #[inline]
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    /// Number of invalid blocks in the latest validation
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.report.as_ref().map_or(0, ValidationReport::invalid_count)
    }

    /// Compare persisted history with the loaded policy
    ///
    /// With no history the current view becomes the first snapshot. A newest
    /// snapshot that cannot be parsed counts as different. When the history
    /// matches, or the policy is read-only, it is restarted from the current
    /// view.
    pub fn check_state(&mut self) -> ViewResult<StateCheck> {
        self.history.load()?;
        let Some(latest) = self.history.latest().cloned() else {
            self.save_state()?;
            return Ok(StateCheck::Clean);
        };

        let matches = match self.snapshot_document(&latest) {
            Ok(document) => document.config.as_ref() == self.model.root(),
            Err(_) => false,
        };
        if self.model.readonly() || matches {
            self.clear_state()?;
            self.save_state()?;
            Ok(StateCheck::Clean)
        } else {
            tracing::info!(key = %self.history.key(), view = %latest.view, "Unsaved changes found");
            Ok(StateCheck::Pending(latest))
        }
    }

    /// Apply or discard the newest persisted snapshot
    pub fn resolve_pending(&mut self, apply: bool) -> ViewResult<()> {
        match (apply, self.history.latest().cloned()) {
            (true, Some(latest)) => self.load_state(&latest),
            _ => {
                self.clear_state()?;
                self.save_state()
            }
        }
    }

    /// Capture the current view into history; no-op while read-only
    pub fn save_state(&mut self) -> ViewResult<()> {
        if self.model.readonly() {
            return Ok(());
        }
        let snapshot = self.capture()?;
        self.history.push(snapshot)
    }

    /// Drop all history of this policy
    pub fn clear_state(&mut self) -> ViewResult<()> {
        self.history.clear()?;
        Ok(())
    }

    /// Load the previous snapshot; false when there is none
    pub fn undo(&mut self) -> ViewResult<bool> {
        let Some(target) = self.history.undo_target().cloned() else {
            tracing::warn!(key = %self.history.key(), "Nothing to undo");
            return Ok(false);
        };
        self.load_state(&target)?;
        self.history.commit_undo();
        Ok(true)
    }

    /// Load the next snapshot; false when nothing was undone
    pub fn redo(&mut self) -> ViewResult<bool> {
        let Some(target) = self.history.redo_target().cloned() else {
            return Ok(false);
        };
        self.load_state(&target)?;
        self.history.commit_redo();
        Ok(true)
    }

    /// Replace the current view with a snapshot, discarding unsaved edits
    pub fn load_state(&mut self, snapshot: &Snapshot) -> ViewResult<()> {
        match snapshot.view {
            ViewKind::Blocks => {
                let document = self.converter.from_json(&snapshot.value)?;
                self.model.rebuild(document.config)?;
                self.view = ViewState::Blocks;
            }
            kind => self.view = ViewState::text(kind, snapshot.value.clone()),
        }
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Switch views through the structural form
    ///
    /// Leaving a text view parses its code; on a parse error the view is
    /// unchanged. Returning to the structural view rebuilds the model from
    /// that code and records a snapshot of the result.
    pub fn change_view(&mut self, kind: ViewKind) -> ViewResult<()> {
        let current = self.view.kind();
        if current == kind {
            return Ok(());
        }

        let next = match self.view.code() {
            None => self.converter.render(&self.model.to_document(), kind)?,
            Some(_) if kind == ViewKind::Blocks && self.model.readonly() => ViewState::Blocks,
            Some(code) => {
                let document = self.converter.parse(current, code)?;
                if kind == ViewKind::Blocks {
                    self.model.rebuild(document.config)?;
                    ViewState::Blocks
                } else {
                    self.converter.render(&document, kind)?
                }
            }
        };

        tracing::debug!(from = %current, to = %kind, "View changed");
        self.view = next;
        self.flush()
    }

    /// Replace the code of the current text view
    pub fn set_code(&mut self, code: impl Into<String>) -> ViewResult<()> {
        let kind = self.view.kind();
        if !kind.is_text() {
            return Err(ViewError::WrongView {
                expected: "json or yaml".to_string(),
                actual: kind.to_string(),
            });
        }
        if self.model.readonly() {
            return Err(TreeError::ReadOnly.into());
        }
        self.view = ViewState::text(kind, code.into());
        self.save_state()
    }

    /// Append a block under `parent`, returning its tag
    pub fn add_block(&mut self, parent: &str, block: BlockNode) -> ViewResult<String> {
        self.ensure_blocks_view()?;
        let tag = self.model.create_child(parent, block)?;
        self.flush()?;
        Ok(tag)
    }

    /// Remove a block and its subtree
    pub fn delete_block(&mut self, tag: &str) -> ViewResult<Option<BlockNode>> {
        self.ensure_blocks_view()?;
        let removed = self.model.remove_block(tag)?;
        self.flush()?;
        Ok(removed)
    }

    /// Edit a block in place
    pub fn update_block<F>(&mut self, tag: &str, edit: F) -> ViewResult<()>
    where
        F: FnOnce(&mut BlockNode),
    {
        self.ensure_blocks_view()?;
        self.model.update_block(tag, edit)?;
        self.flush()
    }

    /// Replace the tree with a reordered root
    pub fn reorder(&mut self, root: BlockNode) -> ViewResult<()> {
        self.ensure_blocks_view()?;
        self.model.rebuild(Some(root))?;
        self.flush()
    }

    /// Copy a block to the clipboard, returning the clipboard JSON
    pub fn copy_block(&mut self, tag: &str) -> ViewResult<String> {
        let block = self.model.get_block(tag)?;
        let encoded = serde_json::to_string(block).map_err(SerializeError::from)?;
        self.clipboard = Some(encoded.clone());
        Ok(encoded)
    }

    /// Paste the clipboard under `parent` with fresh tags
    pub fn paste_block(&mut self, parent: &str) -> ViewResult<String> {
        let encoded = self.clipboard.clone().ok_or(ViewError::EmptyClipboard)?;
        self.paste_json(parent, &encoded)
    }

    /// Paste clipboard JSON under `parent` with fresh tags
    pub fn paste_json(&mut self, parent: &str, encoded: &str) -> ViewResult<String> {
        self.ensure_blocks_view()?;
        let block: BlockNode =
            serde_json::from_str(encoded).map_err(crate::error::ParseError::json)?;
        let tag = self.model.copy_child(parent, &block)?;
        self.flush()?;
        Ok(tag)
    }

    /// Validate the policy and annotate its blocks
    ///
    /// Switches to the structural view first.
    pub fn apply_validation(
        &mut self,
        validator: &PolicyValidator,
        resources: &dyn PolicyResources,
    ) -> ViewResult<&ValidationReport> {
        self.change_view(ViewKind::Blocks)?;
        let report = validator.validate(&self.model, resources)?;
        report.annotate(&mut self.model);
        tracing::info!(
            invalid = report.invalid_count(),
            valid = report.valid_count(),
            "Validation applied"
        );
        Ok(&*self.report.insert(report))
    }

    /// Prepare the policy for a remote save
    ///
    /// Switches to the structural view and clears the history.
    pub fn save_policy(&mut self) -> ViewResult<PolicyDocument> {
        if self.model.readonly() {
            return Err(TreeError::ReadOnly.into());
        }
        self.change_view(ViewKind::Blocks)?;
        self.clear_state()?;
        Ok(self.model.to_document())
    }

    fn capture(&self) -> ViewResult<Snapshot> {
        Ok(match &self.view {
            ViewState::Blocks => {
                let encoded = serde_json::to_string(&self.model.to_document())
                    .map_err(SerializeError::from)?;
                Snapshot::new(ViewKind::Blocks, encoded)
            }
            ViewState::Json(code) => Snapshot::new(ViewKind::Json, code.clone()),
            ViewState::Yaml(code) => Snapshot::new(ViewKind::Yaml, code.clone()),
        })
    }

    fn snapshot_document(&self, snapshot: &Snapshot) -> ViewResult<PolicyDocument> {
        let kind = match snapshot.view {
            ViewKind::Blocks => ViewKind::Json,
            kind => kind,
        };
        Ok(self.converter.parse(kind, &snapshot.value)?)
    }

    fn ensure_blocks_view(&self) -> ViewResult<()> {
        match self.view.kind() {
            ViewKind::Blocks => Ok(()),
            other => Err(ViewError::WrongView {
                expected: ViewKind::Blocks.to_string(),
                actual: other.to_string(),
            }),
        }
    }

    fn flush(&mut self) -> ViewResult<()> {
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.save_state()?;
        }
        Ok(())
    }
}
