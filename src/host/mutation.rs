//! Structural change notifications.

use crate::host::node::NodeRef;

/// One raw structural change, as delivered to mutation observers.
#[derive(Debug, Clone)]
pub enum MutationRecord {
    ChildList {
        target: NodeRef,
        added: Vec<NodeRef>,
        removed: Vec<NodeRef>,
        next_sibling: Option<NodeRef>,
    },
    Attributes {
        target: NodeRef,
        name: String,
        old_value: Option<String>,
    },
    CharacterData {
        target: NodeRef,
        old_value: String,
    },
}

impl MutationRecord {
    pub fn target(&self) -> &NodeRef {
        match self {
            MutationRecord::ChildList { target, .. }
            | MutationRecord::Attributes { target, .. }
            | MutationRecord::CharacterData { target, .. } => target,
        }
    }
}
