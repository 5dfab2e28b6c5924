//! Built-in block validators

pub mod common;
pub mod container;
pub mod tags_manager;
pub mod tool;

use crate::registry::BlockDefinition;

/// Definitions of every built-in block type
#[must_use]
pub fn builtin() -> Vec<BlockDefinition> {
    vec![
        container::definition(),
        tool::definition(),
        tags_manager::definition(),
    ]
}
