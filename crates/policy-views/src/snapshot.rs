//! View snapshots
//!
//! A snapshot is the captured payload of one view: code for the text views,
//! the serialized document for the structural view. A history is persisted
//! as a JSON array of snapshots.

use crate::error::HistoryError;
use crate::view::ViewKind;
use serde::{Deserialize, Serialize};

/// Captured view payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// View the payload belongs to
    pub view: ViewKind,
    /// Code, or the serialized document for the structural view
    pub value: String,
}

impl Snapshot {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(view: ViewKind, value: impl Into<String>) -> Self {
        Self {
            view,
            value: value.into(),
        }
    }
}

/// Encode a snapshot sequence for storage
pub fn encode(states: &[Snapshot]) -> Result<String, serde_json::Error> {
    serde_json::to_string(states)
}

/// Decode a stored snapshot sequence
pub fn decode(key: &str, encoded: &str) -> Result<Vec<Snapshot>, HistoryError> {
    serde_json::from_str(encoded).map_err(|e| HistoryError::corrupt(key, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form() {
        let encoded = encode(&[Snapshot::new(ViewKind::Yaml, "a: 1\n")]).unwrap();
        assert_eq!(encoded, r#"[{"view":"yaml","value":"a: 1\n"}]"#);
        assert_eq!(decode("p1", &encoded).unwrap()[0].view, ViewKind::Yaml);
    }

    #[test]
    fn corrupt_history() {
        let err = decode("p1", "{not a list").unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { ref key, .. } if key == "p1"));
    }
}
