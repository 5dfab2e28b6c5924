//! Policy Views
//!
//! Multi-view editing of a policy with bounded undo/redo history.
//!
//! # Core Concepts
//!
//! - [`ViewConverter`]: structural document to and from JSON and YAML text
//! - [`ViewState`]: the current view, structural or text with its code
//! - [`HistoryManager`]: the newest snapshots of a document and an undo depth
//! - [`HistoryStore`]: process-wide persisted histories keyed by document id
//! - [`PolicyEditor`]: model, view, history and clipboard of one policy
//!
//! # Example
//!
//! ```rust
//! use policy_block::{BlockNode, PolicyDocument};
//! use policy_views::{EditorConfig, MemoryHistoryStore, PolicyEditor, ViewKind};
//! use std::sync::Arc;
//!
//! let root = BlockNode::new("interfaceContainerBlock").with_tag("root");
//! let doc = PolicyDocument::new(root).with_id("p1");
//! let mut editor =
//!     PolicyEditor::open(doc, Arc::new(MemoryHistoryStore::new()), EditorConfig::default()).unwrap();
//! editor.check_state().unwrap();
//!
//! editor.add_block("root", BlockNode::new("tool")).unwrap();
//! editor.change_view(ViewKind::Yaml).unwrap();
//! assert!(editor.view().code().unwrap().contains("blockType: tool"));
//!
//! editor.undo().unwrap();
//! assert_eq!(editor.view().kind(), ViewKind::Blocks);
//! assert!(editor.model().root().unwrap().children.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod converter;
pub mod editor;
pub mod error;
pub mod history;
pub mod snapshot;
pub mod store;
pub mod view;
pub mod yaml;

// Re-exports
pub use config::EditorConfig;
pub use converter::ViewConverter;
pub use editor::{PolicyEditor, StateCheck, UNSAVED_KEY};
pub use error::{HistoryError, ParseError, SerializeError, ViewError, ViewResult};
pub use history::HistoryManager;
pub use snapshot::Snapshot;
pub use store::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
pub use view::{ViewKind, ViewState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
