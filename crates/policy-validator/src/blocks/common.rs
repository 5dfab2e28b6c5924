//! Checks shared by every block type
//!
//! Type validators call [`validate`] first and then add their own checks.

use crate::context::ValidatorContext;
use policy_block::BlockNode;
use serde_json::Value;

/// Run the common block checks
pub fn validate(ctx: &mut ValidatorContext<'_>, block: &BlockNode) -> anyhow::Result<()> {
    if block.tag.is_empty() {
        ctx.add_error("Tag is not set");
    }

    match block.option("permissions") {
        None | Some(Value::Null) => {}
        Some(Value::Array(permissions)) => {
            for permission in permissions {
                let Some(permission) = permission.as_str() else {
                    anyhow::bail!("invalid permission entry: {permission}");
                };
                if ctx.permission_not_exist(permission) {
                    ctx.add_error(format!("Permission {permission} not exist"));
                }
            }
        }
        Some(other) => anyhow::bail!("permissions must be a list, got {other}"),
    }

    Ok(())
}

/// Whether an option value counts as unset
///
/// Missing, null, `false`, `0` and the empty string are unset.
#[must_use]
pub fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_) | Value::Object(_)) => false,
    }
}

/// Display form of an option value; strings are shown unquoted
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceSet;
    use serde_json::json;

    #[test]
    fn unknown_permission_reported() {
        let resources = ResourceSet::new();
        let roles = vec!["Registrant".to_string()];
        let mut ctx = ValidatorContext::new(&resources, &roles);
        let block = BlockNode::new("tool")
            .with_tag("t")
            .with_option("permissions", json!(["Registrant", "OWNER", "Auditor"]));

        validate(&mut ctx, &block).unwrap();

        assert_eq!(ctx.errors(), &["Permission Auditor not exist".to_string()]);
    }

    #[test]
    fn malformed_permissions_fail() {
        let resources = ResourceSet::new();
        let roles = Vec::new();
        let mut ctx = ValidatorContext::new(&resources, &roles);
        let block = BlockNode::new("tool")
            .with_tag("t")
            .with_option("permissions", json!("OWNER"));

        assert!(validate(&mut ctx, &block).is_err());
    }

    #[test]
    fn missing_tag_reported() {
        let resources = ResourceSet::new();
        let roles = Vec::new();
        let mut ctx = ValidatorContext::new(&resources, &roles);

        validate(&mut ctx, &BlockNode::new("tool")).unwrap();

        assert_eq!(ctx.errors(), &["Tag is not set".to_string()]);
    }

    #[test]
    fn unset_values() {
        assert!(is_unset(None));
        assert!(is_unset(Some(&json!(null))));
        assert!(is_unset(Some(&json!(""))));
        assert!(is_unset(Some(&json!(0))));
        assert!(is_unset(Some(&json!(false))));
        assert!(!is_unset(Some(&json!("x"))));
        assert!(!is_unset(Some(&json!([]))));
    }
}
