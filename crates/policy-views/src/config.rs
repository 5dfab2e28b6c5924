//! Editor configuration

use serde::{Deserialize, Serialize};

/// View and history settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snapshots kept per document
    pub history_capacity: usize,
    /// Spaces per YAML nesting level
    pub yaml_indent: usize,
    /// Spaces per JSON nesting level
    pub json_indent: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 5,
            yaml_indent: 4,
            json_indent: 2,
        }
    }
}

impl EditorConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With history capacity, at least one snapshot
    #[inline]
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// With YAML indent, at least two spaces
    #[inline]
    #[must_use]
    pub fn with_yaml_indent(mut self, indent: usize) -> Self {
        self.yaml_indent = indent.max(2);
        self
    }

    /// With JSON indent
    #[inline]
    #[must_use]
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }
}
