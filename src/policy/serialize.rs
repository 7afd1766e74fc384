//! Structural change serialization.

use crate::host::mutation::MutationRecord;
use crate::host::node::{NodeKind, NodeRef};
use crate::policy::mirror::{IdResolver, NodeMirror};
use crate::policy::BlockPredicate;
use crate::record::{AddedNode, AttributeChange, MutationBatch, NodeId, RemovedNode, TextChange};
use std::collections::HashSet;
use std::rc::Rc;

/// Turns raw structural changes into a compact, id-based batch.
pub trait MutationSerializer {
    /// `None` when nothing in `records` is worth recording.
    fn serialize(&self, records: &[MutationRecord]) -> Option<MutationBatch>;
}

/// A straightforward serializer: one entry per raw change.
///
/// Added subtrees are assigned ids as they are serialized; removed subtrees
/// are forgotten after their ids are captured. A node is added at most once
/// per batch, so a later record for a node already serialized as part of an
/// added subtree is dropped. Changes inside blocked subtrees are skipped.
pub struct SimpleMutationSerializer {
    mirror: Rc<NodeMirror>,
    blocker: Rc<dyn BlockPredicate>,
    block_class: String,
}

impl SimpleMutationSerializer {
    pub fn new(mirror: Rc<NodeMirror>, blocker: Rc<dyn BlockPredicate>, block_class: &str) -> Self {
        Self {
            mirror,
            blocker,
            block_class: block_class.to_string(),
        }
    }

    fn is_blocked(&self, node: &NodeRef) -> bool {
        self.blocker.is_blocked(node, &self.block_class)
    }

    fn serialize_added(
        &self,
        batch: &mut MutationBatch,
        added: &mut HashSet<NodeId>,
        parent: &NodeRef,
        node: &NodeRef,
    ) {
        if added.contains(&self.mirror.resolve_id(node)) {
            return;
        }
        let parent_id = self.mirror.resolve_id(parent);
        let next_id = node.next_sibling().map(|next| self.mirror.resolve_id(&next));
        let id = self.mirror.track(node);
        added.insert(id);

        let (tag, attributes, text) = match node.kind() {
            NodeKind::Element(tag) => (Some(tag.to_ascii_lowercase()), node.attributes(), None),
            NodeKind::Text => (None, Default::default(), Some(node.data())),
            NodeKind::Document => (None, Default::default(), None),
        };

        batch.adds.push(AddedNode {
            parent_id,
            next_id,
            id,
            tag,
            attributes,
            text,
        });

        for child in node.children() {
            self.serialize_added(batch, added, node, &child);
        }
    }
}

impl MutationSerializer for SimpleMutationSerializer {
    fn serialize(&self, records: &[MutationRecord]) -> Option<MutationBatch> {
        let mut batch = MutationBatch::default();
        let mut added_ids = HashSet::new();

        for record in records {
            if self.is_blocked(record.target()) {
                continue;
            }
            match record {
                MutationRecord::ChildList {
                    target,
                    added,
                    removed,
                    ..
                } => {
                    for node in removed {
                        batch.removes.push(RemovedNode {
                            parent_id: self.mirror.resolve_id(target),
                            id: self.mirror.resolve_id(node),
                        });
                        self.mirror.forget_subtree(node);
                    }
                    for node in added.iter().filter(|node| !self.is_blocked(node)) {
                        self.serialize_added(&mut batch, &mut added_ids, target, node);
                    }
                }
                MutationRecord::Attributes { target, name, .. } => {
                    let id = self.mirror.resolve_id(target);
                    let value = target.attribute(name);
                    match batch.attributes.iter_mut().find(|change| change.id == id) {
                        Some(change) => {
                            change.attributes.insert(name.clone(), value);
                        }
                        None => batch.attributes.push(AttributeChange {
                            id,
                            attributes: [(name.clone(), value)].into_iter().collect(),
                        }),
                    }
                }
                MutationRecord::CharacterData { target, .. } => {
                    batch.texts.push(TextChange {
                        id: self.mirror.resolve_id(target),
                        value: target.data(),
                    });
                }
            }
        }

        (!batch.is_empty()).then_some(batch)
    }
}
