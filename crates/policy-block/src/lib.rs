//! Policy Block Tree
//!
//! Typed workflow blocks arranged in a strictly hierarchical tree.
//!
//! # Core Concepts
//!
//! - [`BlockNode`]: one typed block with a tree-unique `tag`, options and
//!   ordered children
//! - [`PolicyModel`]: exclusive owner of the root block; all mutations go
//!   through it and notify subscribers
//! - [`BlockRef`]: tag, detached block or serialized block, resolved back to
//!   the owned instance by tag
//! - [`PolicyDocument`]: the persisted structural form of a policy
//!
//! # Example
//!
//! ```rust
//! use policy_block::{BlockNode, PolicyDocument, PolicyModel};
//!
//! let root = BlockNode::new("interfaceContainerBlock").with_tag("root");
//! let mut model = PolicyModel::from_document(PolicyDocument::new(root)).unwrap();
//!
//! let tag = model.create_child("root", BlockNode::new("tool")).unwrap();
//! assert_eq!(model.get_block(tag.as_str()).unwrap().block_type, "tool");
//!
//! // Root removal is ignored
//! assert!(model.remove_block("root").unwrap().is_none());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod model;
pub mod node;

// Re-exports
pub use document::{PolicyDocument, PolicyStatus};
pub use error::{TreeError, TreeResult};
pub use model::{ChildRule, ModelChange, PolicyModel, SubscriptionId};
pub use node::{BlockNode, BlockRef, Blocks, RESERVED_KEYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
