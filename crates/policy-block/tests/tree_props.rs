use policy_block::{BlockNode, PolicyDocument, PolicyModel};
use proptest::prelude::*;

/// Structural edit applied to a growing tree
#[derive(Debug, Clone)]
enum Edit {
    Add { parent: usize },
    Copy { parent: usize, source: usize },
    Remove { target: usize },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..64usize).prop_map(|parent| Edit::Add { parent }),
        (0..64usize, 0..64usize).prop_map(|(parent, source)| Edit::Copy { parent, source }),
        (0..64usize).prop_map(|target| Edit::Remove { target }),
    ]
}

fn tags(model: &PolicyModel) -> Vec<String> {
    model
        .root()
        .map(|r| r.iter().map(|b| b.tag.clone()).collect())
        .unwrap_or_default()
}

fn seeded() -> PolicyModel {
    let root = BlockNode::new("interfaceContainerBlock")
        .with_tag("root")
        .with_child(BlockNode::new("tool").with_tag("tool"))
        .with_child(BlockNode::new("tagsManager").with_tag("tags"));
    PolicyModel::from_document(PolicyDocument::new(root)).unwrap()
}

proptest! {
    #[test]
    fn prop_tags_stay_unique(edits in proptest::collection::vec(edit(), 0..40)) {
        let mut model = seeded();

        for edit in edits {
            let all = tags(&model);
            let pick = |i: usize| all[i % all.len()].clone();
            match edit {
                Edit::Add { parent } => {
                    model.create_child(pick(parent).as_str(), BlockNode::new("tool")).unwrap();
                }
                Edit::Copy { parent, source } => {
                    if all.len() > 200 {
                        continue;
                    }
                    let source = model.get_block(pick(source).as_str()).unwrap().clone();
                    model.copy_child(pick(parent).as_str(), &source).unwrap();
                }
                Edit::Remove { target } => {
                    model.remove_block(pick(target).as_str()).unwrap();
                }
            }

            // Invariant: no two blocks share a tag, every block is tagged
            let root = model.root().unwrap();
            prop_assert!(root.first_duplicate_tag().is_none());
            prop_assert!(root.iter().all(|b| !b.tag.is_empty()));
        }
    }

    #[test]
    fn prop_self_rebuild_is_fixed_point(extra in 0..10usize) {
        let mut model = seeded();
        for _ in 0..extra {
            model.create_child("root", BlockNode::new("tool")).unwrap();
        }
        let before = model.to_document();
        model.rebuild(None).unwrap();
        prop_assert_eq!(model.to_document(), before);
    }
}

#[test]
fn container_with_two_children_rebuilds_to_itself() {
    let mut model = seeded();
    let before = model.to_document();

    model.rebuild(None).unwrap();

    pretty_assertions::assert_eq!(model.to_document(), before);
    assert_eq!(model.root().unwrap().block_type, "interfaceContainerBlock");
    assert_eq!(model.root().unwrap().children.len(), 2);
}

#[test]
fn rebuild_from_reordered_root() {
    let mut model = seeded();
    let mut reordered = model.root().unwrap().clone();
    reordered.children.reverse();

    model.rebuild(Some(reordered)).unwrap();

    assert_eq!(tags(&model), vec!["root", "tags", "tool"]);
}
