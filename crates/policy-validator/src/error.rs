//! Error types for the validator framework
//!
//! Per-block findings are never errors: they are accumulated into a
//! [`ValidationReport`](crate::ValidationReport). The types here cover
//! misuse of the framework itself.

/// Framework-level validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Policy has no root block to validate
    #[error("policy has no root block")]
    EmptyPolicy,

    /// Block type registered twice
    #[error("block type already registered: '{0}'")]
    DuplicateRegistration(String),

    /// Block type missing from the registry
    #[error("unknown block type: '{0}'")]
    UnknownBlockType(String),

    /// Resource set could not be loaded
    #[error("invalid resources: {0}")]
    InvalidResources(#[from] serde_json::Error),
}

/// Result type alias for validator operations
pub type ValidationResult<T> = Result<T, ValidationError>;
