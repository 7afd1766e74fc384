//! Recording policies consulted by the observers.
//!
//! Each policy is a trait so hosts can supply their own: node identity,
//! subtree blocking, value masking and structural serialization. A simple
//! default is provided for each.

pub mod mask;
pub mod mirror;
pub mod serialize;

use crate::host::node::NodeRef;

// Re-export commonly used types
pub use mask::{mask_value, MaskInputOptions, MaskPolicy, MASK_CHAR};
pub use mirror::{IdResolver, NodeMirror};
pub use serialize::{MutationSerializer, SimpleMutationSerializer};

/// Excludes opted-out subtrees from recording.
pub trait BlockPredicate {
    fn is_blocked(&self, node: &NodeRef, block_class: &str) -> bool;
}

/// Blocks a node when it, or any ancestor, carries the block class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassBlockPredicate;

impl BlockPredicate for ClassBlockPredicate {
    fn is_blocked(&self, node: &NodeRef, block_class: &str) -> bool {
        let mut current = Some(node.clone());
        while let Some(node) = current {
            if node.has_class(block_class) {
                return true;
            }
            current = node.parent();
        }
        false
    }
}
