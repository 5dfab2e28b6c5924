//! Policy Tags
//!
//! Tags attached to policy documents and their synchronization with an
//! append-only topic log.
//!
//! # Core Concepts
//!
//! - [`TagRecord`]: a local tag, either Draft (local only) or Published
//!   (mirrored from a [`TagMessage`])
//! - [`TagSynchronizer`]: reconciles one document's Published tags with the
//!   messages on its topic and stamps the tag cache
//! - [`TagsManager`]: create, search, synchronize and delete actions of a
//!   tags manager block
//! - [`RemoteLog`], [`TagStore`], [`DocumentResolver`]: collaborator seams,
//!   with in-memory implementations in [`memory`]
//!
//! # Example
//!
//! ```rust
//! use policy_tags::memory::{MemoryRemoteLog, MemoryTagStore};
//! use policy_tags::{SyncConfig, TagMessage, TagSynchronizer};
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let log = Arc::new(MemoryRemoteLog::new());
//!     log.publish_tag(TagMessage::new("1700000000.000000001", "0.0.5", "doc-remote", "Verified"));
//!     let store = Arc::new(MemoryTagStore::new());
//!
//!     let sync = TagSynchronizer::new(log, store.clone(), SyncConfig::default());
//!     let outcome = sync.synchronize("0.0.5", "doc-remote", "doc1").await.unwrap();
//!
//!     assert_eq!(outcome.created, 1);
//!     assert_eq!(store.tags()[0].local_target.as_deref(), Some("doc1"));
//! });
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod store;
pub mod sync;
pub mod types;

// Re-exports
pub use config::SyncConfig;
pub use error::{LogError, StoreError, StoreResult, SyncError, SyncResult, TagActionError};
pub use manager::{NewTag, TagAction, TagActionResult, TagsManager};
pub use store::{DocumentResolver, RemoteLog, TagStore};
pub use sync::{SyncOutcome, TagSynchronizer};
pub use types::{
    CacheFilter, DocumentTags, MessageType, TagCacheRecord, TagFilter, TagMessage, TagOperation, TagRecord,
    TagStatus, TagType, TargetDocument,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
