//! Block type registry
//!
//! Maps each block type to a [`BlockDefinition`]: its validator, the rule for
//! which children it may hold, and palette metadata. The registry doubles as
//! the [`ChildRule`] of a [`PolicyModel`](policy_block::PolicyModel).

use crate::blocks;
use crate::context::ValidatorContext;
use crate::error::{ValidationError, ValidationResult};
use policy_block::{BlockNode, ChildRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Validator entry point of a block type
pub type ValidateFn =
    Arc<dyn Fn(&mut ValidatorContext<'_>, &BlockNode) -> anyhow::Result<()> + Send + Sync>;

/// Which children a block type accepts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChildrenType {
    /// Leaf block
    #[default]
    None,
    /// Any registered block
    Any,
    /// Only the listed block types
    Special(Vec<String>),
}

impl ChildrenType {
    /// Whether a child of this type is accepted
    #[must_use]
    pub fn accepts(&self, child_type: &str) -> bool {
        match self {
            ChildrenType::None => false,
            ChildrenType::Any => true,
            ChildrenType::Special(types) => types.iter().any(|t| t == child_type),
        }
    }
}

/// Palette group of a block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockGroup {
    /// Layout containers
    Containers,
    /// Document and data handling
    #[default]
    Main,
    /// Tokens, tags and other side effects
    Tokens,
    /// Imported tools
    Tools,
}

/// Descriptive metadata of a block type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockAbout {
    /// Short palette label
    pub label: String,
    /// Longer description
    pub title: String,
    /// Palette group
    pub group: BlockGroup,
    /// Children rule
    pub children: ChildrenType,
    /// Whether the block only gets the common checks
    pub common: bool,
}

impl BlockAbout {
    /// Create metadata with label and title
    #[must_use]
    pub fn new(label: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// With group
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group: BlockGroup) -> Self {
        self.group = group;
        self
    }

    /// With children rule
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: ChildrenType) -> Self {
        self.children = children;
        self
    }

    /// Mark as common-only block
    #[inline]
    #[must_use]
    pub fn common(mut self) -> Self {
        self.common = true;
        self
    }
}

/// Capability bundle of a registered block type
#[derive(Clone)]
pub struct BlockDefinition {
    /// Block type tag
    pub block_type: String,
    /// Metadata
    pub about: BlockAbout,
    validate: ValidateFn,
}

impl std::fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("block_type", &self.block_type)
            .field("about", &self.about)
            .finish_non_exhaustive()
    }
}

impl BlockDefinition {
    /// Create definition from a validator function
    pub fn new<F>(block_type: impl Into<String>, about: BlockAbout, validate: F) -> Self
    where
        F: Fn(&mut ValidatorContext<'_>, &BlockNode) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            block_type: block_type.into(),
            about,
            validate: Arc::new(validate),
        }
    }

    /// Run this type's validator
    pub fn validate(&self, ctx: &mut ValidatorContext<'_>, block: &BlockNode) -> anyhow::Result<()> {
        (self.validate)(ctx, block)
    }
}

/// Registry of block definitions keyed by block type
#[derive(Debug, Default, Clone)]
pub struct BlockRegistry {
    definitions: HashMap<String, BlockDefinition>,
}

impl BlockRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Create registry with built-in block types
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for definition in blocks::builtin() {
            registry.definitions.insert(definition.block_type.clone(), definition);
        }
        registry
    }

    /// Register a block type
    pub fn register(&mut self, definition: BlockDefinition) -> ValidationResult<()> {
        if self.definitions.contains_key(&definition.block_type) {
            return Err(ValidationError::DuplicateRegistration(definition.block_type));
        }
        tracing::debug!(block_type = %definition.block_type, "Registered block type");
        self.definitions.insert(definition.block_type.clone(), definition);
        Ok(())
    }

    /// Definition by block type
    #[inline]
    #[must_use]
    pub fn get(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.definitions.get(block_type)
    }

    /// Definition by block type, or [`ValidationError::UnknownBlockType`]
    pub fn require(&self, block_type: &str) -> ValidationResult<&BlockDefinition> {
        self.get(block_type)
            .ok_or_else(|| ValidationError::UnknownBlockType(block_type.to_string()))
    }

    /// Check if block type exists
    #[inline]
    #[must_use]
    pub fn contains(&self, block_type: &str) -> bool {
        self.definitions.contains_key(block_type)
    }

    /// Definitions that may be added under a block of `parent_type`, sorted
    /// by block type
    #[must_use]
    pub fn allowed_children(&self, parent_type: &str) -> Vec<&BlockDefinition> {
        let Some(parent) = self.get(parent_type) else {
            return Vec::new();
        };
        let mut allowed: Vec<_> = self
            .definitions
            .values()
            .filter(|d| parent.about.children.accepts(&d.block_type))
            .collect();
        allowed.sort_by(|a, b| a.block_type.cmp(&b.block_type));
        allowed
    }

    /// List all registered block types
    #[must_use]
    pub fn block_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.definitions.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Get number of registered block types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ChildRule for BlockRegistry {
    fn can_contain(&self, parent_type: &str, child_type: &str) -> bool {
        match (self.get(parent_type), self.contains(child_type)) {
            (Some(parent), true) => parent.about.children.accepts(child_type),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = BlockRegistry::with_defaults();
        assert!(registry.contains("interfaceContainerBlock"));
        assert!(registry.contains("tool"));
        assert!(registry.contains("tagsManager"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = BlockRegistry::with_defaults();
        let result = registry.register(BlockDefinition::new("tool", BlockAbout::default(), |_, _| Ok(())));
        assert!(matches!(result, Err(ValidationError::DuplicateRegistration(t)) if t == "tool"));
    }

    #[test]
    fn container_accepts_registered_children_only() {
        let registry = BlockRegistry::with_defaults();
        assert!(registry.can_contain("interfaceContainerBlock", "tool"));
        assert!(!registry.can_contain("interfaceContainerBlock", "nonexistentBlock"));
        assert!(!registry.can_contain("tagsManager", "tool"));
    }

    #[test]
    fn special_children() {
        let mut registry = BlockRegistry::new();
        registry
            .register(BlockDefinition::new(
                "stepBlock",
                BlockAbout::new("Step", "Step").with_children(ChildrenType::Special(vec!["tool".into()])),
                |_, _| Ok(()),
            ))
            .unwrap();
        registry
            .register(BlockDefinition::new("tool", BlockAbout::new("Tool", "Tool"), |_, _| Ok(())))
            .unwrap();
        registry
            .register(BlockDefinition::new("other", BlockAbout::new("Other", "Other"), |_, _| Ok(())))
            .unwrap();

        assert!(registry.can_contain("stepBlock", "tool"));
        assert!(!registry.can_contain("stepBlock", "other"));
        let allowed: Vec<_> = registry
            .allowed_children("stepBlock")
            .into_iter()
            .map(|d| d.block_type.as_str())
            .collect();
        assert_eq!(allowed, vec!["tool"]);
    }

    #[test]
    fn require_unknown_type() {
        let registry = BlockRegistry::new();
        assert!(matches!(
            registry.require("tool"),
            Err(ValidationError::UnknownBlockType(_))
        ));
    }
}
