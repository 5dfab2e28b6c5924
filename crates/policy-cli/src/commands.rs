//! Subcommand implementations
//!
//! Each command takes already-read input and returns what `policyctl`
//! prints, so the binary stays a thin argument-parsing shell.

use anyhow::{bail, Context};
use policy_block::{BlockNode, PolicyModel};
use policy_tags::memory::{MemoryRemoteLog, MemoryTagStore};
use policy_tags::{SyncConfig, TagMessage, TagRecord, TagSynchronizer};
use policy_validator::{BlockRegistry, PolicyValidator, ResourceSet, ValidationReport};
use policy_views::{ViewConverter, ViewKind};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Read a file, or stdin for `None` and `-`
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Text view implied by a file extension
#[must_use]
pub fn detect_kind(path: &Path) -> Option<ViewKind> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.to_ascii_lowercase().parse().ok())
        .filter(ViewKind::is_text)
}

/// Convert policy text between JSON and YAML
pub fn convert(converter: &ViewConverter, text: &str, from: ViewKind, to: ViewKind) -> anyhow::Result<String> {
    if !from.is_text() || !to.is_text() {
        bail!("only json and yaml can be converted, got {from} -> {to}");
    }
    let output = converter.convert(text, from, to)?;
    tracing::debug!(%from, %to, bytes = output.len(), "Policy converted");
    Ok(output)
}

/// Parse a policy and build its model with the default block rules
pub fn load_model(converter: &ViewConverter, text: &str, kind: ViewKind) -> anyhow::Result<PolicyModel> {
    let document = converter.parse(kind, text)?;
    let registry = Arc::new(BlockRegistry::with_defaults());
    Ok(PolicyModel::from_document(document)?.with_child_rule(registry))
}

/// Validate a policy against a resource set
pub fn validate(model: &PolicyModel, resources: &ResourceSet) -> anyhow::Result<ValidationReport> {
    Ok(PolicyValidator::default().validate(model, resources)?)
}

/// Human-readable validation summary
#[must_use]
pub fn summarize(report: &ValidationReport) -> String {
    let mut out = String::new();
    for block in report.invalid_blocks() {
        for error in &block.errors {
            let _ = writeln!(out, "{}: {error}", block.tag);
        }
    }
    let _ = writeln!(
        out,
        "{} blocks, {} invalid, {} errors",
        report.blocks.len(),
        report.invalid_count(),
        report.error_count()
    );
    out
}

/// Indented block outline, with findings when a report is given
#[must_use]
pub fn outline(root: &BlockNode, report: Option<&ValidationReport>) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let pad = "    ".repeat(depth);
        let _ = write!(out, "{pad}{} {}", node.block_type, node.tag);
        let errors = report
            .and_then(|r| r.block(&node.tag))
            .map(|b| b.errors.as_slice())
            .unwrap_or_default();
        match errors.len() {
            0 => out.push('\n'),
            1 => out.push_str("  [1 error]\n"),
            n => {
                let _ = writeln!(out, "  [{n} errors]");
            }
        }
        for error in errors {
            let _ = writeln!(out, "{pad}    ! {error}");
        }
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    out
}

/// Synchronize one document's tags from a message dump into a fresh store
pub async fn sync_tags(
    messages: Vec<TagMessage>,
    topic_id: &str,
    remote_target: &str,
    local_target: &str,
    config: SyncConfig,
) -> anyhow::Result<Vec<TagRecord>> {
    let log = Arc::new(MemoryRemoteLog::new());
    for message in messages {
        log.publish_tag(message);
    }
    let store = Arc::new(MemoryTagStore::new());
    let outcome = TagSynchronizer::new(log, store, config)
        .synchronize(topic_id, remote_target, local_target)
        .await?;
    Ok(outcome.tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_block::PolicyDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_from_extension() {
        assert_eq!(detect_kind(Path::new("policy.json")), Some(ViewKind::Json));
        assert_eq!(detect_kind(Path::new("policy.YML")), Some(ViewKind::Yaml));
        assert_eq!(detect_kind(Path::new("policy.blocks")), None);
        assert_eq!(detect_kind(Path::new("policy")), None);
    }

    #[test]
    fn blocks_view_is_not_convertible() {
        let converter = ViewConverter::default();
        assert!(convert(&converter, "{}", ViewKind::Json, ViewKind::Blocks).is_err());
    }

    #[test]
    fn outline_nests_children() {
        let root = BlockNode::new("interfaceContainerBlock")
            .with_tag("root")
            .with_child(BlockNode::new("tool").with_tag("a"))
            .with_child(BlockNode::new("tagsManager").with_tag("b"));
        let model = PolicyModel::from_document(PolicyDocument::new(root)).unwrap();

        assert_eq!(
            outline(model.root().unwrap(), None),
            "interfaceContainerBlock root\n    tool a\n    tagsManager b\n"
        );
    }
}
