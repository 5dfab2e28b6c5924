//! Layout container block

use crate::blocks::common;
use crate::registry::{BlockAbout, BlockDefinition, BlockGroup, ChildrenType};

/// Block type tag
pub const BLOCK_TYPE: &str = "interfaceContainerBlock";

/// Registry definition
#[must_use]
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        BLOCK_TYPE,
        BlockAbout::new("Container", "Add 'Container' Block")
            .with_group(BlockGroup::Containers)
            .with_children(ChildrenType::Any)
            .common(),
        common::validate,
    )
}
