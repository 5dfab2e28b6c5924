use policy_block::{PolicyDocument, PolicyModel};
use policy_validator::{BlockRegistry, PolicyValidator, ResourceSet, Schema};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const POLICY: &str = r##"{
    "id": "policy-1",
    "name": "iREC",
    "status": "DRAFT",
    "policyRoles": ["Registrant", "Issuer"],
    "config": {
        "blockType": "interfaceContainerBlock",
        "tag": "root",
        "permissions": ["ANY_ROLE"],
        "children": [
            {
                "blockType": "tool",
                "tag": "mrv_tool",
                "permissions": ["Registrant", "Verifier"],
                "variables": [
                    {"name": "reportSchema", "type": "Schema"},
                    {"name": "issuer", "type": "Role"},
                    {"name": "token", "type": "Token"}
                ],
                "reportSchema": "#report",
                "issuer": "Issuer",
                "token": ""
            },
            {"blockType": "tagsManager", "tag": "tags", "permissions": ["OWNER"]}
        ]
    }
}"##;

#[test]
fn findings_are_collected_per_block() {
    let doc: PolicyDocument = serde_json::from_str(POLICY).unwrap();
    let registry = Arc::new(BlockRegistry::with_defaults());
    let model = PolicyModel::from_document(doc).unwrap().with_child_rule(registry.clone());
    let resources = ResourceSet::new().with_schema(Schema::new("#report"));

    let report = PolicyValidator::new(registry).validate(&model, &resources).unwrap();

    assert_eq!(report.invalid_count(), 1);
    assert_eq!(
        report.errors_map()[&model.get_block("mrv_tool").unwrap().id],
        vec![
            "Permission Verifier not exist".to_string(),
            "Option \"token\" is not set".to_string(),
        ]
    );
}

#[test]
fn registry_rule_guards_model_mutations() {
    let doc: PolicyDocument = serde_json::from_str(POLICY).unwrap();
    let registry = Arc::new(BlockRegistry::with_defaults());
    let mut model = PolicyModel::from_document(doc).unwrap().with_child_rule(registry);

    let result = model.create_child("tags", policy_block::BlockNode::new("tool"));

    assert!(matches!(result, Err(policy_block::TreeError::InvalidParent { .. })));
    assert!(model.create_child("root", policy_block::BlockNode::new("tool")).is_ok());
}

#[test]
fn sample_policy_reports_unset_token() {
    let mut model = policy_test_utils::sample_model();

    let report = PolicyValidator::default()
        .validate(&model, &policy_test_utils::sample_resources())
        .unwrap();

    assert_eq!(report.error_count(), 1);
    let errors = report.errors_map();
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec![&model.get_block("mrv_tool").unwrap().id]);
    assert_eq!(report.block("mrv_tool").unwrap().errors, vec!["Option \"token\" is not set".to_string()]);
    assert_eq!(report.annotate(&mut model), 1);
    assert!(!model.get_block("mrv_tool").unwrap().is_valid());
    assert!(model.get_block("tags").unwrap().is_valid());
}
