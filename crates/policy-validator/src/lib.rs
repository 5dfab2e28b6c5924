//! Policy Validator
//!
//! Registry-driven validation of policy block trees.
//!
//! # Core Concepts
//!
//! - [`BlockRegistry`]: block type to capability bundle (validator, children
//!   rule, palette metadata); also the tree's [`ChildRule`](policy_block::ChildRule)
//! - [`ValidatorContext`]: resource lookups plus an error sink for one block
//! - [`PolicyValidator`]: walks a tree and accumulates findings
//! - [`ValidationReport`]: per-block findings, counts and error map
//!
//! Block validators never abort a run. Findings are data; a failing
//! validator turns into one `Unhandled exception` finding.
//!
//! # Example
//!
//! ```rust
//! use policy_block::{BlockNode, PolicyDocument, PolicyModel};
//! use policy_validator::{PolicyValidator, ResourceSet};
//! use serde_json::json;
//!
//! let root = BlockNode::new("interfaceContainerBlock").with_tag("root").with_child(
//!     BlockNode::new("tool")
//!         .with_tag("tool")
//!         .with_option("variables", json!([{"name": "schema", "type": "Schema"}])),
//! );
//! let model = PolicyModel::from_document(PolicyDocument::new(root)).unwrap();
//!
//! let report = PolicyValidator::default().validate(&model, &ResourceSet::new()).unwrap();
//! let tool = &model.get_block("tool").unwrap().id;
//! assert_eq!(report.errors_map()[tool], vec!["Option \"schema\" is not set"]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod blocks;
pub mod context;
pub mod error;
pub mod registry;
pub mod report;
pub mod resources;
pub mod validator;

// Re-exports
pub use context::{compare_schema, PolicyResources, Schema, SchemaField, ValidatorContext};
pub use error::{ValidationError, ValidationResult};
pub use registry::{BlockAbout, BlockDefinition, BlockGroup, BlockRegistry, ChildrenType, ValidateFn};
pub use report::{BlockReport, ValidationReport};
pub use resources::ResourceSet;
pub use validator::PolicyValidator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
