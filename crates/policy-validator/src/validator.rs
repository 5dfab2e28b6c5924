//! Whole-policy validation
//!
//! Walks the tree in pre-order, runs each block's registered validator and
//! collects the findings. Nothing a block validator does can abort the walk:
//! a returned error or a panic becomes a single `Unhandled exception` finding
//! on that block. Panics are only caught where they unwind; the release
//! profile aborts instead.

use crate::context::{PolicyResources, ValidatorContext};
use crate::error::{ValidationError, ValidationResult};
use crate::registry::BlockRegistry;
use crate::report::{BlockReport, ValidationReport};
use policy_block::{BlockNode, PolicyModel};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Message of a validator failure
#[must_use]
pub fn error_message(error: &anyhow::Error) -> String {
    format!("Unhandled exception {error}")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("validator panicked");
    format!("Unhandled exception {detail}")
}

/// Validates policies against a block registry
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    registry: Arc<BlockRegistry>,
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self::new(Arc::new(BlockRegistry::with_defaults()))
    }
}

impl PolicyValidator {
    /// Create validator over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self { registry }
    }

    /// Registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Validate the model's tree against its declared roles
    pub fn validate(
        &self,
        model: &PolicyModel,
        resources: &dyn PolicyResources,
    ) -> ValidationResult<ValidationReport> {
        let root = model.root().ok_or(ValidationError::EmptyPolicy)?;
        Ok(self.validate_tree(root, model.roles(), resources))
    }

    /// Validate a detached tree
    #[must_use]
    pub fn validate_tree(
        &self,
        root: &BlockNode,
        roles: &[String],
        resources: &dyn PolicyResources,
    ) -> ValidationReport {
        let mut ctx = ValidatorContext::new(resources, roles);
        let mut blocks = Vec::with_capacity(root.count());
        let mut stack: Vec<(&BlockNode, Option<&str>)> = vec![(root, None)];

        while let Some((block, parent_type)) = stack.pop() {
            self.validate_block(&mut ctx, block, parent_type);
            let errors = ctx.take_errors();
            tracing::debug!(tag = %block.tag, errors = errors.len(), "Validated block");
            blocks.push(BlockReport::new(&block.id, &block.tag, &block.block_type, errors));

            for child in block.children.iter().rev() {
                stack.push((child, Some(block.block_type.as_str())));
            }
        }

        let report = ValidationReport { blocks };
        tracing::info!(
            blocks = report.blocks.len(),
            invalid = report.invalid_count(),
            errors = report.error_count(),
            "Policy validated"
        );
        report
    }

    fn validate_block(&self, ctx: &mut ValidatorContext<'_>, block: &BlockNode, parent_type: Option<&str>) {
        let Some(definition) = self.registry.get(&block.block_type) else {
            ctx.add_error(format!("Block type '{}' is not registered", block.block_type));
            return;
        };

        if let Some(parent) = parent_type.and_then(|t| self.registry.get(t)) {
            if !parent.about.children.accepts(&block.block_type) {
                ctx.add_error(format!(
                    "Block '{}' is not allowed inside '{}'",
                    block.block_type, parent.block_type
                ));
            }
        }

        match panic::catch_unwind(AssertUnwindSafe(|| definition.validate(ctx, block))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => ctx.add_error(error_message(&error)),
            Err(payload) => {
                tracing::error!(tag = %block.tag, block_type = %block.block_type, "Block validator panicked");
                ctx.add_error(panic_message(payload.as_ref()));
            }
        }
    }
}
