//! Block nodes and references
//!
//! A [`BlockNode`] is one typed unit of a policy workflow. Known keys
//! (`id`, `blockType`, `tag`, `children`) map onto fields; every other key of
//! the serialized block is kept verbatim in [`BlockNode::options`], so the
//! structural form survives a JSON or YAML round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Keys owned by [`BlockNode`] fields, never stored in the option map
pub const RESERVED_KEYS: &[&str] = &["id", "blockType", "tag", "children"];

fn new_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn tag_block_id(tag: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, tag.as_bytes()).to_string()
}

/// A single addressable block in a policy tree
///
/// Equality is structural: validation annotations are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    /// Stable block identity (uuid); empty until the block joins a model
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Block type tag from the registry
    pub block_type: String,
    /// Tree-unique, human readable identifier
    #[serde(default)]
    pub tag: String,
    /// Type-specific options
    #[serde(flatten)]
    pub options: Map<String, Value>,
    /// Ordered child blocks
    #[serde(default)]
    pub children: Vec<BlockNode>,
    #[serde(skip)]
    errors: Vec<String>,
}

impl PartialEq for BlockNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.block_type == other.block_type
            && self.tag == other.tag
            && self.options == other.options
            && self.children == other.children
    }
}

impl BlockNode {
    /// Create untagged block of the given type
    #[must_use]
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            block_type: block_type.into(),
            tag: String::new(),
            options: Map::new(),
            children: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// With tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// With option value
    #[inline]
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_option(key, value);
        self
    }

    /// With child block appended
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: BlockNode) -> Self {
        self.children.push(child);
        self
    }

    /// Get option value
    #[inline]
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Set option value
    ///
    /// Returns `false` without storing anything if `key` names a field.
    pub fn set_option(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return false;
        }
        self.options.insert(key, value);
        true
    }

    /// Validation errors recorded on this block
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether the last validation left this block without errors
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn set_errors(&mut self, errors: Vec<String>) {
        self.errors = errors;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors.clear();
        for child in &mut self.children {
            child.clear_errors();
        }
    }

    /// Depth-first, pre-order iterator over this block and its descendants
    #[must_use]
    pub fn iter(&self) -> Blocks<'_> {
        Blocks { stack: vec![self] }
    }

    /// Number of blocks in this subtree
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Find block by tag in this subtree
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&BlockNode> {
        self.iter().find(|b| b.tag == tag)
    }

    /// Find block by tag in this subtree (mutable)
    pub fn find_mut(&mut self, tag: &str) -> Option<&mut BlockNode> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(tag))
    }

    /// Find the block whose direct children include `tag`
    pub(crate) fn find_parent_mut(&mut self, tag: &str) -> Option<&mut BlockNode> {
        if self.children.iter().any(|c| c.tag == tag) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|c| c.find_parent_mut(tag))
    }

    /// Tag of the first block in this subtree sharing a tag with another,
    /// ignoring untagged blocks
    #[must_use]
    pub fn first_duplicate_tag(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.iter()
            .filter(|b| !b.tag.is_empty())
            .find(|b| !seen.insert(b.tag.as_str()))
            .map(|b| b.tag.as_str())
    }

    /// All non-empty tags in this subtree
    #[must_use]
    pub fn tags(&self) -> HashSet<&str> {
        self.iter()
            .filter(|b| !b.tag.is_empty())
            .map(|b| b.tag.as_str())
            .collect()
    }

    /// Give every untagged block in this subtree a tag from `next`
    pub(crate) fn fill_tags(&mut self, next: &mut impl FnMut() -> String) {
        if self.tag.is_empty() {
            self.tag = next();
        }
        for child in &mut self.children {
            child.fill_tags(next);
        }
    }

    /// Give every block without an id one derived from its tag
    ///
    /// Falls back to a random id when the derived one is in `taken`.
    pub(crate) fn fill_ids(&mut self, taken: &mut HashSet<String>) {
        if self.id.is_empty() {
            let derived = tag_block_id(&self.tag);
            self.id = if taken.contains(&derived) { new_block_id() } else { derived };
        }
        taken.insert(self.id.clone());
        for child in &mut self.children {
            child.fill_ids(taken);
        }
    }

    /// Replace every tag and id in this subtree
    pub(crate) fn rekey(&mut self, next: &mut impl FnMut() -> String) {
        self.tag = next();
        self.id = new_block_id();
        self.errors.clear();
        for child in &mut self.children {
            child.rekey(next);
        }
    }
}

/// Pre-order block iterator
#[derive(Debug)]
pub struct Blocks<'a> {
    stack: Vec<&'a BlockNode>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a BlockNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Reference to a block, resolved against a tree by tag
#[derive(Debug, Clone, Copy)]
pub enum BlockRef<'a> {
    /// Tag string
    Tag(&'a str),
    /// A block instance, possibly a detached copy
    Node(&'a BlockNode),
    /// A serialized block
    Document(&'a Value),
}

impl<'a> BlockRef<'a> {
    /// Tag carried by the reference
    #[must_use]
    pub fn tag(&self) -> Option<&'a str> {
        match *self {
            BlockRef::Tag(tag) => Some(tag),
            BlockRef::Node(node) => Some(node.tag.as_str()),
            BlockRef::Document(value) => value.get("tag").and_then(Value::as_str),
        }
        .filter(|t| !t.is_empty())
    }
}

impl<'a> From<&'a str> for BlockRef<'a> {
    fn from(tag: &'a str) -> Self {
        BlockRef::Tag(tag)
    }
}

impl<'a> From<&'a String> for BlockRef<'a> {
    fn from(tag: &'a String) -> Self {
        BlockRef::Tag(tag.as_str())
    }
}

impl<'a> From<&'a BlockNode> for BlockRef<'a> {
    fn from(node: &'a BlockNode) -> Self {
        BlockRef::Node(node)
    }
}

impl<'a> From<&'a Value> for BlockRef<'a> {
    fn from(value: &'a Value) -> Self {
        BlockRef::Document(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> BlockNode {
        BlockNode::new("interfaceContainerBlock")
            .with_tag("root")
            .with_child(BlockNode::new("tool").with_tag("a"))
            .with_child(
                BlockNode::new("interfaceContainerBlock")
                    .with_tag("b")
                    .with_child(BlockNode::new("tagsManager").with_tag("c")),
            )
    }

    #[test]
    fn iter_is_preorder() {
        let tags: Vec<_> = sample().iter().map(|b| b.tag.clone()).collect();
        assert_eq!(tags, vec!["root", "a", "b", "c"]);
    }

    #[test]
    fn find_nested() {
        let root = sample();
        assert_eq!(root.find("c").map(|b| b.block_type.as_str()), Some("tagsManager"));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn find_parent() {
        let mut root = sample();
        assert_eq!(root.find_parent_mut("c").map(|b| b.tag.clone()), Some("b".to_string()));
        assert!(root.find_parent_mut("root").is_none());
    }

    #[test]
    fn options_flatten_into_block() {
        let node = BlockNode::new("tool")
            .with_tag("t")
            .with_option("permissions", json!(["OWNER"]));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["permissions"], json!(["OWNER"]));
        assert_eq!(value["blockType"], "tool");

        let back: BlockNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.option("permissions"), Some(&json!(["OWNER"])));
    }

    #[test]
    fn reserved_keys_rejected_as_options() {
        let mut node = BlockNode::new("tool");
        assert!(!node.set_option("tag", json!("x")));
        assert!(node.option("tag").is_none());
    }

    #[test]
    fn missing_id_stays_missing() {
        let node: BlockNode = serde_json::from_value(json!({"blockType": "tool"})).unwrap();
        assert!(node.id.is_empty());
        assert!(node.tag.is_empty());
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({"blockType": "tool", "tag": "", "children": []}));
    }

    #[test]
    fn filled_ids_follow_tags() {
        let mut a = BlockNode::new("tool").with_tag("t1");
        let mut b = BlockNode::new("tool").with_tag("t1");
        a.fill_ids(&mut HashSet::new());
        b.fill_ids(&mut HashSet::new());
        assert_eq!(a.id, b.id);

        let mut clash = BlockNode::new("tool").with_tag("t1");
        clash.fill_ids(&mut HashSet::from([a.id.clone()]));
        assert_ne!(clash.id, a.id);
    }

    #[test]
    fn equality_ignores_annotations() {
        let a = sample();
        let mut b = a.clone();
        b.set_errors(vec!["broken".to_string()]);
        assert_eq!(a, b);
        assert!(!b.is_valid());
    }

    #[test]
    fn duplicate_tag_detection() {
        let root = sample().with_child(BlockNode::new("tool").with_tag("a"));
        assert_eq!(root.first_duplicate_tag(), Some("a"));
        assert_eq!(sample().first_duplicate_tag(), None);
    }

    #[test]
    fn block_ref_document_tag() {
        let doc = json!({"blockType": "tool", "tag": "a"});
        assert_eq!(BlockRef::from(&doc).tag(), Some("a"));
        assert_eq!(BlockRef::Tag("").tag(), None);
    }
}
