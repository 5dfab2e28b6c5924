//! Error types for views and history
//!
//! Provides error handling for:
//! - Parse operations (text view → structural document)
//! - Serialize operations (structural document → text view)
//! - History persistence

use policy_block::TreeError;
use std::path::PathBuf;

/// Errors while parsing a text view
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Malformed JSON
    #[error("json syntax error: {0}")]
    Json(String),

    /// Malformed YAML
    #[error("yaml syntax error: {0}")]
    Yaml(String),

    /// View kind has no textual form
    #[error("view has no text form: '{0}'")]
    UnsupportedView(String),
}

impl ParseError {
    /// Create JSON error from parser message
    pub fn json(message: impl ToString) -> Self {
        Self::Json(message.to_string())
    }

    /// Create YAML error from parser message
    pub fn yaml(message: impl ToString) -> Self {
        Self::Yaml(message.to_string())
    }
}

/// Errors while rendering a text view
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// JSON serialization failed
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML scalar serialization failed
    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors of the persisted history store
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// IO error on a history file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted history is not a snapshot sequence
    #[error("corrupt history for '{key}': {message}")]
    Corrupt { key: String, message: String },
}

impl HistoryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt history error
    pub fn corrupt(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Combined view layer error
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("validation error: {0}")]
    Validation(#[from] policy_validator::ValidationError),

    /// Operation needs a different current view
    #[error("operation requires the {expected} view, current view is {actual}")]
    WrongView { expected: String, actual: String },

    /// Paste with nothing copied
    #[error("clipboard is empty")]
    EmptyClipboard,
}

/// Result type alias for view operations
pub type ViewResult<T> = Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::yaml("mapping values are not allowed here");
        assert_eq!(
            err.to_string(),
            "yaml syntax error: mapping values are not allowed here"
        );
    }

    #[test]
    fn tree_error_converts() {
        let err: ViewError = TreeError::ReadOnly.into();
        assert!(matches!(err, ViewError::Tree(TreeError::ReadOnly)));
    }
}
