//! Error types for tags
//!
//! Provides error handling for:
//! - Remote topic log reads
//! - Local tag store operations
//! - Synchronization (abort before writes, partial persistence)
//! - Tags manager actions

/// Remote topic log errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Log could not be reached
    #[error("topic log unavailable: {0}")]
    Unavailable(String),

    /// Topic does not exist
    #[error("topic not found: '{0}'")]
    TopicNotFound(String),

    /// Message could not be decoded
    #[error("malformed message {message_id}: {reason}")]
    Malformed { message_id: String, reason: String },
}

/// Local tag store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Record to update does not exist
    #[error("record not found: '{0}'")]
    NotFound(String),

    /// Write rejected
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Synchronization errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Remote log unreachable; nothing was written
    #[error("synchronization aborted: {0}")]
    Aborted(#[source] LogError),

    /// Local write failed mid-reconciliation; earlier writes remain
    #[error("persistence failed after {written} writes: {source}")]
    Persistence {
        written: usize,
        #[source]
        source: StoreError,
    },

    /// Local read failed before any write
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Create persistence error
    pub fn persistence(written: usize, source: StoreError) -> Self {
        Self::Persistence { written, source }
    }

    /// Check if a rerun may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Aborted(LogError::Unavailable(_)) => true,
            SyncError::Aborted(_) => false,
            SyncError::Persistence { source, .. } | SyncError::Store(source) => source.is_retryable(),
        }
    }
}

/// Tags manager action errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagActionError {
    /// Missing or unknown `operation`
    #[error("Operation is unknown")]
    UnknownOperation,

    /// Tag payload missing, malformed or not found
    #[error("Invalid tag")]
    InvalidTag,

    /// Target document cannot be resolved
    #[error("Invalid target")]
    InvalidTarget,

    /// `targets` is not a list of ids
    #[error("Invalid targets")]
    InvalidTargets,

    /// `uuid` is not a string
    #[error("Invalid uuid")]
    InvalidUuid,

    /// Only the owner may delete a tag
    #[error("tag is owned by another user")]
    NotOwner,

    /// Published tags are immutable
    #[error("tag is published")]
    NotDraft,

    /// Synchronization failed
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TagActionError {
    /// Check if a retry may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            TagActionError::Sync(e) => e.is_retryable(),
            TagActionError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for synchronization
pub type SyncResult<T> = Result<T, SyncError>;
