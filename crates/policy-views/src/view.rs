//! View kinds and the current view state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Representation a policy is edited in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Structural block tree
    #[default]
    Blocks,
    /// JSON text
    Json,
    /// YAML text
    Yaml,
}

impl ViewKind {
    /// Whether the view is edited as text
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        !matches!(self, ViewKind::Blocks)
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Blocks => "blocks",
            ViewKind::Json => "json",
            ViewKind::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewKind {
    type Err = crate::error::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(ViewKind::Blocks),
            "json" => Ok(ViewKind::Json),
            "yaml" | "yml" => Ok(ViewKind::Yaml),
            other => Err(crate::error::ParseError::UnsupportedView(other.to_string())),
        }
    }
}

/// Current view with its payload
///
/// Text views own the code being edited; the structural view reads the
/// model directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Structural view over the model
    #[default]
    Blocks,
    /// JSON code
    Json(String),
    /// YAML code
    Yaml(String),
}

impl ViewState {
    /// Text view of the given kind
    #[must_use]
    pub fn text(kind: ViewKind, code: String) -> Self {
        match kind {
            ViewKind::Blocks => ViewState::Blocks,
            ViewKind::Json => ViewState::Json(code),
            ViewKind::Yaml => ViewState::Yaml(code),
        }
    }

    /// Kind of this view
    #[must_use]
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewState::Blocks => ViewKind::Blocks,
            ViewState::Json(_) => ViewKind::Json,
            ViewState::Yaml(_) => ViewKind::Yaml,
        }
    }

    /// Code of a text view
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            ViewState::Blocks => None,
            ViewState::Json(code) | ViewState::Yaml(code) => Some(code),
        }
    }
}
