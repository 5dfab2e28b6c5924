//! Tags manager block

use crate::blocks::common;
use crate::registry::{BlockAbout, BlockDefinition, BlockGroup, ChildrenType};

/// Block type tag
pub const BLOCK_TYPE: &str = "tagsManager";

/// Registry definition
#[must_use]
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        BLOCK_TYPE,
        BlockAbout::new("Tags", "Add 'Tags' Block")
            .with_group(BlockGroup::Tokens)
            .with_children(ChildrenType::None)
            .common(),
        common::validate,
    )
}
