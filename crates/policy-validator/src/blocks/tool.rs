//! Imported tool block
//!
//! A tool declares `variables`, each naming one of its options and the kind
//! of resource the option must reference.

use crate::blocks::common::{self, display_value, is_unset};
use crate::context::ValidatorContext;
use crate::registry::{BlockAbout, BlockDefinition, BlockGroup, ChildrenType};
use policy_block::BlockNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block type tag
pub const BLOCK_TYPE: &str = "tool";

/// Declared tool variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Name of the option holding the value
    pub name: String,
    /// Resource kind, e.g. `Schema` or `Token`
    #[serde(rename = "type")]
    pub variable_type: String,
    /// Expected shape for `Schema` variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<Value>,
}

/// Registry definition
#[must_use]
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        BLOCK_TYPE,
        BlockAbout::new("Tool", "Add 'Tool' Block")
            .with_group(BlockGroup::Tools)
            .with_children(ChildrenType::Any),
        validate,
    )
}

/// Validate common options, then every declared variable
pub fn validate(ctx: &mut ValidatorContext<'_>, block: &BlockNode) -> anyhow::Result<()> {
    common::validate(ctx, block)?;

    let Some(Value::Array(variables)) = block.option("variables") else {
        return Ok(());
    };

    for variable in variables {
        let variable: Variable = serde_json::from_value(variable.clone())?;
        let value = block.option(&variable.name);
        if is_unset(value) {
            ctx.add_error(format!("Option \"{}\" is not set", variable.name));
            continue;
        }
        let value = value.map(display_value).unwrap_or_default();

        match variable.variable_type.as_str() {
            "Schema" => match ctx.get_schema(&value) {
                None => ctx.add_error(format!("Schema with id \"{value}\" does not exist")),
                Some(schema) => {
                    if !ctx.compare_schema(variable.base_schema.as_ref(), &schema) {
                        ctx.add_error("Schema is not supported");
                    }
                }
            },
            "Token" => {
                if ctx.token_not_exist(&value) {
                    ctx.add_error(format!("Token with id {value} does not exist"));
                }
            }
            "Role" => {
                if ctx.permission_not_exist(&value) {
                    ctx.add_error(format!("Permission {value} not exist"));
                }
            }
            "Group" => {
                if ctx.group_not_exist(&value) {
                    ctx.add_error(format!("Group {value} not exist"));
                }
            }
            "TokenTemplate" => {
                if ctx.token_template_not_exist(&value) {
                    ctx.add_error(format!("Token \"{value}\" does not exist"));
                }
            }
            "Topic" => {
                if ctx.topic_template_not_exist(&value) {
                    ctx.add_error(format!("Topic \"{value}\" does not exist"));
                }
            }
            other => ctx.add_error(format!("Type '{other}' does not exist")),
        }
    }

    Ok(())
}
