//! `policyctl` configuration file

use anyhow::Context;
use policy_tags::SyncConfig;
use policy_views::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings read from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// View and history settings
    pub editor: EditorConfig,
    /// Tag synchronization settings
    pub sync: SyncConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            editor: EditorConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl CliConfig {
    /// Parse TOML text
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        Ok(config.normalized())
    }

    /// Load from a file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    // Routes file values through the clamping builders
    fn normalized(mut self) -> Self {
        self.editor = EditorConfig::new()
            .with_history_capacity(self.editor.history_capacity)
            .with_yaml_indent(self.editor.yaml_indent)
            .with_json_indent(self.editor.json_indent);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_tags::TagType;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(CliConfig::from_toml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = CliConfig::from_toml(
            r#"
log_level = "debug"

[editor]
yaml_indent = 2
history_capacity = 0

[sync]
entity = "Schema"
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.editor.yaml_indent, 2);
        assert_eq!(config.editor.history_capacity, 1);
        assert_eq!(config.editor.json_indent, 2);
        assert_eq!(config.sync.entity, TagType::Schema);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(CliConfig::from_toml("log_level = [").is_err());
    }
}
