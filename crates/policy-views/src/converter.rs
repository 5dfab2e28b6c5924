//! View converter
//!
//! Converts a [`PolicyDocument`] to and from its JSON and YAML text forms.
//! Text-to-text conversion checks the input against the document shape but
//! renders the parsed value itself, so keys the text omits stay omitted.

use crate::config::EditorConfig;
use crate::error::{ParseError, SerializeError, ViewResult};
use crate::view::{ViewKind, ViewState};
use crate::yaml;
use policy_block::PolicyDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structural/JSON/YAML converter
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewConverter {
    config: EditorConfig,
}

impl ViewConverter {
    /// Create converter with config
    #[inline]
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Active config
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Pretty-printed JSON
    pub fn to_json(&self, document: &PolicyDocument) -> Result<String, SerializeError> {
        self.write_json(document)
    }

    /// Canonical YAML
    pub fn to_yaml(&self, document: &PolicyDocument) -> Result<String, SerializeError> {
        let value = serde_json::to_value(document)?;
        yaml::to_string(&value, self.config.yaml_indent)
    }

    /// Parse JSON text
    pub fn from_json(&self, text: &str) -> Result<PolicyDocument, ParseError> {
        serde_json::from_str(text).map_err(ParseError::json)
    }

    /// Parse YAML text
    pub fn from_yaml(&self, text: &str) -> Result<PolicyDocument, ParseError> {
        let value = yaml::from_str(text)?;
        serde_json::from_value(value).map_err(ParseError::yaml)
    }

    /// Parse the text of a view
    pub fn parse(&self, kind: ViewKind, text: &str) -> Result<PolicyDocument, ParseError> {
        match kind {
            ViewKind::Json => self.from_json(text),
            ViewKind::Yaml => self.from_yaml(text),
            ViewKind::Blocks => Err(ParseError::UnsupportedView(kind.to_string())),
        }
    }

    /// Render a document as a view of the given kind
    pub fn render(&self, document: &PolicyDocument, kind: ViewKind) -> Result<ViewState, SerializeError> {
        Ok(match kind {
            ViewKind::Blocks => ViewState::Blocks,
            ViewKind::Json => ViewState::Json(self.to_json(document)?),
            ViewKind::Yaml => ViewState::Yaml(self.to_yaml(document)?),
        })
    }

    /// Convert text between views
    ///
    /// The input must parse as a policy document; the output carries exactly
    /// the keys of the input.
    pub fn convert(&self, text: &str, from: ViewKind, to: ViewKind) -> ViewResult<String> {
        let value = match from {
            ViewKind::Json => serde_json::from_str::<Value>(text).map_err(ParseError::json)?,
            ViewKind::Yaml => yaml::from_str(text)?,
            ViewKind::Blocks => return Err(ParseError::UnsupportedView(from.to_string()).into()),
        };
        if let Err(e) = PolicyDocument::deserialize(&value) {
            return Err(match from {
                ViewKind::Yaml => ParseError::yaml(e),
                _ => ParseError::json(e),
            }
            .into());
        }
        match to {
            ViewKind::Json => Ok(self.write_json(&value)?),
            ViewKind::Yaml => Ok(yaml::to_string(&value, self.config.yaml_indent)?),
            ViewKind::Blocks => Err(ParseError::UnsupportedView(to.to_string()).into()),
        }
    }

    /// JSON text to YAML text
    pub fn json_to_yaml(&self, text: &str) -> ViewResult<String> {
        self.convert(text, ViewKind::Json, ViewKind::Yaml)
    }

    /// YAML text to JSON text
    pub fn yaml_to_json(&self, text: &str) -> ViewResult<String> {
        self.convert(text, ViewKind::Yaml, ViewKind::Json)
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializeError> {
        let indent = vec![b' '; self.config.json_indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        // serde_json only writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use policy_block::BlockNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document() -> PolicyDocument {
        let root = BlockNode::new("interfaceContainerBlock")
            .with_tag("root")
            .with_option("permissions", json!(["OWNER"]))
            .with_child(BlockNode::new("tool").with_tag("tool_1"));
        PolicyDocument::new(root).with_id("p1").with_roles(["Registrant"])
    }

    #[test]
    fn json_round_trip() {
        let converter = ViewConverter::default();
        let doc = document();
        let text = converter.to_json(&doc).unwrap();
        assert!(text.contains("\n  \"id\": \"p1\""));
        assert_eq!(converter.from_json(&text).unwrap(), doc);
    }

    #[test]
    fn yaml_round_trip() {
        let converter = ViewConverter::default();
        let doc = document();
        let text = converter.to_yaml(&doc).unwrap();
        assert!(text.contains("\n        -   blockType: tool\n"));
        assert_eq!(converter.from_yaml(&text).unwrap(), doc);
    }

    #[test]
    fn json_yaml_json() {
        let converter = ViewConverter::default();
        let json = converter.to_json(&document()).unwrap();
        let yaml = converter.json_to_yaml(&json).unwrap();
        assert_eq!(converter.yaml_to_json(&yaml).unwrap(), json);
    }

    #[test]
    fn parsing_is_deterministic() {
        let converter = ViewConverter::default();
        let text = r#"{"config":{"blockType":"a","tag":"root"}}"#;
        assert_eq!(converter.from_json(text).unwrap(), converter.from_json(text).unwrap());
    }

    #[test]
    fn text_conversion_adds_no_keys() {
        let converter = ViewConverter::default();
        let yaml = converter
            .json_to_yaml(r#"{"config":{"blockType":"a","tag":"root"}}"#)
            .unwrap();
        assert_eq!(yaml, "config:\n    blockType: a\n    tag: root\n");

        let json = converter.yaml_to_json(&yaml).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"config": {"blockType": "a", "tag": "root"}}));
    }

    #[test]
    fn text_conversion_rejects_non_policy() {
        let converter = ViewConverter::default();
        let err = converter.json_to_yaml(r#"{"config": 3}"#).unwrap_err();
        assert!(matches!(err, ViewError::Parse(ParseError::Json(_))));
    }

    #[test]
    fn malformed_json_carries_parser_message() {
        let converter = ViewConverter::default();
        let err = converter.from_json("{\"config\": ").unwrap_err();
        assert!(matches!(err, ParseError::Json(ref msg) if msg.contains("EOF")));
    }

    #[test]
    fn blocks_view_has_no_text() {
        let converter = ViewConverter::default();
        let err = converter.convert("{}", ViewKind::Json, ViewKind::Blocks).unwrap_err();
        assert!(matches!(err, ViewError::Parse(ParseError::UnsupportedView(_))));
    }

    #[test]
    fn custom_json_indent() {
        let converter = ViewConverter::new(EditorConfig::new().with_json_indent(4));
        let text = converter.to_json(&document()).unwrap();
        assert!(text.contains("\n    \"id\": \"p1\""));
    }
}
