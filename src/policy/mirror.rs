//! Node identity assignment.

use crate::host::node::NodeRef;
use crate::record::{NodeId, MISSING_ID};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Maps a live node to its durable id.
pub trait IdResolver {
    /// The node's id, or [`MISSING_ID`] when it is not tracked.
    fn resolve_id(&self, node: &NodeRef) -> NodeId;
}

/// Sequential id assignment keyed by node identity.
///
/// Ids start at 1 and are never reused within one mirror.
pub struct NodeMirror {
    ids: RefCell<HashMap<u64, NodeId>>,
    next_id: Cell<NodeId>,
}

impl Default for NodeMirror {
    fn default() -> Self {
        Self {
            ids: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }
}

impl NodeMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id to `node` if it has none; returns its id.
    pub fn track(&self, node: &NodeRef) -> NodeId {
        *self.ids.borrow_mut().entry(node.key()).or_insert_with(|| {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            id
        })
    }

    /// Track `node` and all of its descendants.
    pub fn track_subtree(&self, node: &NodeRef) {
        for node in node.descendants() {
            self.track(&node);
        }
    }

    /// Forget `node` and all of its descendants.
    pub fn forget_subtree(&self, node: &NodeRef) {
        let mut ids = self.ids.borrow_mut();
        for node in node.descendants() {
            ids.remove(&node.key());
        }
    }

    pub fn has(&self, node: &NodeRef) -> bool {
        self.ids.borrow().contains_key(&node.key())
    }

    pub fn len(&self) -> usize {
        self.ids.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}

impl IdResolver for NodeMirror {
    fn resolve_id(&self, node: &NodeRef) -> NodeId {
        self.ids
            .borrow()
            .get(&node.key())
            .copied()
            .unwrap_or(MISSING_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Document;

    #[test]
    fn test_tracking_assigns_stable_ids() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(doc.root(), &div);
        doc.append_child(&div, &span);

        let mirror = NodeMirror::new();
        assert_eq!(mirror.resolve_id(&div), MISSING_ID);

        mirror.track_subtree(doc.root());
        assert_eq!(mirror.len(), 3);
        let id = mirror.resolve_id(&span);
        assert_eq!(mirror.track(&span), id);

        mirror.forget_subtree(&div);
        assert_eq!(mirror.resolve_id(&span), MISSING_ID);
        assert!(mirror.has(doc.root()));
    }
}
