use policy_block::{BlockNode, PolicyDocument, PolicyStatus};
use policy_views::{
    yaml, EditorConfig, FileHistoryStore, HistoryManager, HistoryStore, MemoryHistoryStore,
    PolicyEditor, Snapshot, StateCheck, ViewConverter, ViewKind,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,24}".prop_map(Value::String),
        "[a-z]{1,8}\n[a-z ]{0,8}".prop_map(Value::String),
        Just(json!("true")),
        Just(json!("- item")),
    ]
}

fn option_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map("[a-zA-Z][a-zA-Z0-9_]{0,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn block() -> impl Strategy<Value = BlockNode> {
    let leaf = (
        "[a-zA-Z]{1,12}",
        proptest::collection::btree_map("opt[A-Z][a-z]{0,5}", option_value(), 0..3),
    )
        .prop_map(|(block_type, options)| {
            let mut node = BlockNode::new(block_type);
            for (k, v) in options {
                node.set_option(k, v);
            }
            node
        });
    leaf.prop_recursive(3, 24, 4, |inner| {
        ("[a-zA-Z]{1,12}", proptest::collection::vec(inner, 0..4)).prop_map(|(block_type, children)| {
            let mut node = BlockNode::new(block_type);
            node.children = children;
            node
        })
    })
}

fn tagged(mut root: BlockNode) -> BlockNode {
    fn walk(node: &mut BlockNode, next: &mut usize) {
        node.tag = format!("block_{next}");
        *next += 1;
        for child in &mut node.children {
            walk(child, next);
        }
    }
    walk(&mut root, &mut 0);
    root
}

proptest! {
    #[test]
    fn prop_json_round_trip(root in block()) {
        let converter = ViewConverter::default();
        let doc = PolicyDocument::new(tagged(root)).with_id("p1");
        let text = converter.to_json(&doc).unwrap();
        prop_assert_eq!(converter.from_json(&text).unwrap(), doc);
    }

    #[test]
    fn prop_yaml_round_trip(root in block()) {
        let converter = ViewConverter::default();
        let doc = PolicyDocument::new(tagged(root)).with_id("p1");
        let text = converter.to_yaml(&doc).unwrap();
        prop_assert_eq!(converter.from_yaml(&text).unwrap(), doc);
    }

    #[test]
    fn prop_yaml_indent_is_fixed(value in option_value()) {
        let text = yaml::to_string(&value, 4).unwrap();
        for line in text.lines() {
            let spaces = line.len() - line.trim_start_matches(' ').len();
            prop_assert_eq!(spaces % 4, 0, "line {:?}", line);
        }
        prop_assert_eq!(yaml::from_str(&text).unwrap(), value);
    }

    #[test]
    fn prop_history_keeps_newest(saves in 1..20usize) {
        let mut history = HistoryManager::new("p1", Arc::new(MemoryHistoryStore::new()), 5);
        for n in 0..saves {
            history.push(Snapshot::new(ViewKind::Json, n.to_string())).unwrap();
        }
        let kept: Vec<usize> = history.states().iter().map(|s| s.value.parse().unwrap()).collect();
        let expected: Vec<usize> = (saves.saturating_sub(5)..saves).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn prop_undo_redo_inverse(extra in 1..6usize) {
        let root = BlockNode::new("interfaceContainerBlock").with_tag("root");
        let mut editor = PolicyEditor::open(
            PolicyDocument::new(root).with_id("p1"),
            Arc::new(MemoryHistoryStore::new()),
            EditorConfig::default(),
        )
        .unwrap();
        editor.check_state().unwrap();
        for _ in 0..extra {
            editor.add_block("root", BlockNode::new("tool")).unwrap();
        }
        let before = editor.model().to_document();

        prop_assert!(editor.undo().unwrap());
        prop_assert_ne!(editor.model().to_document(), before.clone());
        prop_assert!(editor.redo().unwrap());
        prop_assert_eq!(editor.model().to_document(), before);
    }
}

#[test]
fn file_store_survives_editor_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn HistoryStore> = Arc::new(FileHistoryStore::new(dir.path()).unwrap());
    let doc = PolicyDocument::new(
        BlockNode::new("interfaceContainerBlock")
            .with_tag("root")
            .with_child(BlockNode::new("tool").with_tag("tool")),
    )
    .with_id("p1");

    {
        let mut editor = PolicyEditor::open(doc.clone(), store.clone(), EditorConfig::default()).unwrap();
        assert_eq!(editor.check_state().unwrap(), StateCheck::Clean);
        editor.delete_block("tool").unwrap();
    }

    let mut editor = PolicyEditor::open(doc.clone(), store.clone(), EditorConfig::default()).unwrap();
    assert!(matches!(editor.check_state().unwrap(), StateCheck::Pending(_)));
    editor.resolve_pending(true).unwrap();
    assert!(editor.model().root().unwrap().children.is_empty());

    editor.save_policy().unwrap();
    assert_eq!(store.read("p1").unwrap(), None);

    let mut reopened = PolicyEditor::open(doc, store, EditorConfig::default()).unwrap();
    assert_eq!(reopened.check_state().unwrap(), StateCheck::Clean);
}

fn draft() -> PolicyDocument {
    let root = serde_json::from_value(json!({
        "blockType": "interfaceContainerBlock",
        "tag": "root",
        "children": [{"blockType": "tool", "tag": "tool"}]
    }))
    .unwrap();
    PolicyDocument::new(root).with_id("p1")
}

#[test]
fn published_policy_drops_draft_history() {
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    {
        let mut editor = PolicyEditor::open(draft(), store.clone(), EditorConfig::default()).unwrap();
        editor.check_state().unwrap();
        editor.add_block("root", BlockNode::new("tagsManager")).unwrap();
    }

    let published = draft().with_status(PolicyStatus::Published);
    let mut editor = PolicyEditor::open(published, store.clone(), EditorConfig::default()).unwrap();

    assert_eq!(editor.check_state().unwrap(), StateCheck::Clean);
    assert!(editor.history().is_empty());
    assert_eq!(store.read("p1").unwrap(), None);
    assert_eq!(editor.model().root().unwrap().children.len(), 1);
}

#[test]
fn reopening_unchanged_policy_restarts_history() {
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    {
        let mut editor = PolicyEditor::open(draft(), store.clone(), EditorConfig::default()).unwrap();
        editor.check_state().unwrap();
        editor.add_block("root", BlockNode::new("tagsManager").with_tag("tags")).unwrap();
        editor.undo().unwrap();
        editor.add_block("root", BlockNode::new("tool").with_tag("extra")).unwrap();
        editor.delete_block("extra").unwrap();
        assert_eq!(editor.history().len(), 3);
    }

    let mut editor = PolicyEditor::open(draft(), store, EditorConfig::default()).unwrap();

    assert_eq!(editor.check_state().unwrap(), StateCheck::Clean);
    assert_eq!(editor.history().len(), 1);
    assert!(!editor.undo().unwrap());
}
