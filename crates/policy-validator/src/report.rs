//! Validation reports
//!
//! A [`ValidationReport`] is the per-block result of one validation run in
//! pre-order. It can be pushed back onto a model as block annotations.

use policy_block::PolicyModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation result of one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReport {
    /// Block id
    pub id: String,
    /// Block tag
    pub tag: String,
    /// Block type
    pub block_type: String,
    /// Error messages
    pub errors: Vec<String>,
    /// No errors were found
    pub is_valid: bool,
}

impl BlockReport {
    /// Create report from collected errors
    #[must_use]
    pub fn new(id: impl Into<String>, tag: impl Into<String>, block_type: impl Into<String>, errors: Vec<String>) -> Self {
        let is_valid = errors.is_empty();
        Self {
            id: id.into(),
            tag: tag.into(),
            block_type: block_type.into(),
            errors,
            is_valid,
        }
    }
}

/// Validation result of a whole policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Per-block results in pre-order
    pub blocks: Vec<BlockReport>,
}

impl ValidationReport {
    /// Whether every block passed
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.blocks.iter().all(|b| b.is_valid)
    }

    /// Number of blocks with errors
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_valid).count()
    }

    /// Number of blocks without errors
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.blocks.len() - self.invalid_count()
    }

    /// Total number of error messages
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.blocks.iter().map(|b| b.errors.len()).sum()
    }

    /// Report for one block by tag
    #[must_use]
    pub fn block(&self, tag: &str) -> Option<&BlockReport> {
        self.blocks.iter().find(|b| b.tag == tag)
    }

    /// Errors keyed by block id, invalid blocks only
    #[must_use]
    pub fn errors_map(&self) -> BTreeMap<String, Vec<String>> {
        self.invalid_blocks()
            .map(|b| (b.id.clone(), b.errors.clone()))
            .collect()
    }

    /// Blocks with errors in pre-order
    pub fn invalid_blocks(&self) -> impl Iterator<Item = &BlockReport> {
        self.blocks.iter().filter(|b| !b.is_valid)
    }

    /// Replace the model's block annotations with this report
    ///
    /// Returns the number of blocks annotated. Blocks no longer present in
    /// the model are skipped.
    pub fn annotate(&self, model: &mut PolicyModel) -> usize {
        model.clear_errors();
        self.invalid_blocks()
            .filter(|b| model.set_block_errors(&b.tag, b.errors.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ValidationReport {
        ValidationReport {
            blocks: vec![
                BlockReport::new("1", "root", "interfaceContainerBlock", vec![]),
                BlockReport::new("2", "tool_1", "tool", vec!["Option \"s\" is not set".into()]),
                BlockReport::new("3", "tags", "tagsManager", vec![]),
            ],
        }
    }

    #[test]
    fn counts() {
        let report = report();
        assert!(!report.is_valid());
        assert_eq!(report.invalid_count(), 1);
        assert_eq!(report.valid_count(), 2);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn errors_map_only_lists_invalid_blocks() {
        let map = report().errors_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["2"], vec!["Option \"s\" is not set"]);
        assert_eq!(report().block("tool_1").map(|b| b.id.as_str()), Some("2"));
    }

    #[test]
    fn empty_report_is_valid() {
        assert!(ValidationReport::default().is_valid());
    }
}
