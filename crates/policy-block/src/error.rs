//! Error types for block tree operations

/// Errors raised by structural mutations and lookups on a policy tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// No block with the requested tag exists in the tree
    #[error("block not found: '{0}'")]
    NotFound(String),

    /// The reference carries no tag and cannot be resolved
    #[error("block reference has no tag")]
    UnresolvedReference,

    /// Parent block type does not accept the child type
    #[error("block '{parent_type}' cannot contain '{child_type}'")]
    InvalidParent {
        parent_type: String,
        child_type: String,
    },

    /// Mutation would introduce a second block with the same tag
    #[error("duplicate block tag: '{0}'")]
    DuplicateTag(String),

    /// The policy is read-only
    #[error("policy is read-only")]
    ReadOnly,

    /// The tree has no root block
    #[error("policy has no root block")]
    EmptyTree,
}

impl TreeError {
    /// Create invalid parent error
    pub fn invalid_parent(parent_type: impl Into<String>, child_type: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_type: parent_type.into(),
            child_type: child_type.into(),
        }
    }

    /// Check if error is a lookup miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::UnresolvedReference)
    }
}

/// Result type alias for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = TreeError::NotFound("Block_1".to_string());
        assert_eq!(err.to_string(), "block not found: 'Block_1'");
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_parent_display() {
        let err = TreeError::invalid_parent("tagsManager", "tool");
        assert_eq!(err.to_string(), "block 'tagsManager' cannot contain 'tool'");
        assert!(!err.is_not_found());
    }
}
