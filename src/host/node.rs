//! Nodes of the in-process document model.

use crate::host::stylesheet::StyleSheet;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared reference to a live node.
pub type NodeRef = Rc<Node>;

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    /// An element, with its upper-case tag name.
    Element(String),
    Text,
}

/// A node in the document tree.
///
/// Form state (`value`, `checked`, `selected_index`) lives on the node itself
/// and is only reachable for writing through the owning [`Document`], which
/// routes programmatic assignment through its property table.
///
/// [`Document`]: crate::host::Document
pub struct Node {
    key: u64,
    kind: NodeKind,
    attributes: RefCell<BTreeMap<String, String>>,
    data: RefCell<String>,
    value: RefCell<String>,
    checked: Cell<bool>,
    selected_index: Cell<i64>,
    scroll: Cell<(f64, f64)>,
    parent: RefCell<Weak<Node>>,
    children: RefCell<Vec<NodeRef>>,
    sheet: RefCell<Option<Rc<StyleSheet>>>,
}

impl Node {
    pub(crate) fn new(key: u64, kind: NodeKind) -> NodeRef {
        Rc::new(Self {
            key,
            kind,
            attributes: RefCell::new(BTreeMap::new()),
            data: RefCell::new(String::new()),
            value: RefCell::new(String::new()),
            checked: Cell::new(false),
            selected_index: Cell::new(-1),
            scroll: Cell::new((0.0, 0.0)),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            sheet: RefCell::new(None),
        })
    }

    /// Unique key within the owning document.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Upper-case tag name for elements.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.attributes.borrow().clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .borrow()
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// The form control type, following the host's conventions: the lower-case
    /// `type` attribute for inputs (default `text`), `textarea` and
    /// `select-one`/`select-multiple` for the other form controls.
    pub fn input_type(&self) -> Option<String> {
        match self.tag_name()? {
            "INPUT" => Some(
                self.attribute("type")
                    .map(|t| t.to_ascii_lowercase())
                    .unwrap_or_else(|| "text".to_string()),
            ),
            "TEXTAREA" => Some("textarea".to_string()),
            "SELECT" if self.attribute("multiple").is_some() => Some("select-multiple".to_string()),
            "SELECT" => Some("select-one".to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<String> {
        self.attribute("name")
    }

    /// Text content of a text node.
    pub fn data(&self) -> String {
        self.data.borrow().clone()
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn checked(&self) -> bool {
        self.checked.get()
    }

    pub fn selected_index(&self) -> i64 {
        self.selected_index.get()
    }

    pub fn scroll_offset(&self) -> (f64, f64) {
        self.scroll.get()
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    /// The stylesheet owned by this node, if any.
    pub fn sheet(&self) -> Option<Rc<StyleSheet>> {
        self.sheet.borrow().clone()
    }

    /// Topmost ancestor (the node itself when detached).
    pub fn root(self: &Rc<Self>) -> NodeRef {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// This node followed by its descendants in tree order.
    pub fn descendants(self: &Rc<Self>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Following sibling, if any.
    pub fn next_sibling(self: &Rc<Self>) -> Option<NodeRef> {
        let parent = self.parent()?;
        let children = parent.children.borrow();
        let index = children.iter().position(|c| Rc::ptr_eq(c, self))?;
        children.get(index + 1).cloned()
    }

    pub(crate) fn set_attribute_raw(&self, name: &str, value: &str) -> Option<String> {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string())
    }

    pub(crate) fn remove_attribute_raw(&self, name: &str) -> Option<String> {
        self.attributes.borrow_mut().remove(name)
    }

    pub(crate) fn set_data_raw(&self, data: &str) -> String {
        std::mem::replace(&mut *self.data.borrow_mut(), data.to_string())
    }

    pub(crate) fn set_value_raw(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
    }

    pub(crate) fn set_checked_raw(&self, checked: bool) {
        self.checked.set(checked);
    }

    pub(crate) fn set_selected_index_raw(&self, index: i64) {
        self.selected_index.set(index);
    }

    pub(crate) fn set_scroll_raw(&self, x: f64, y: f64) {
        self.scroll.set((x, y));
    }

    pub(crate) fn set_sheet(&self, sheet: Rc<StyleSheet>) {
        *self.sheet.borrow_mut() = Some(sheet);
    }

    pub(crate) fn attach(self: &Rc<Self>, child: &NodeRef, before: Option<&NodeRef>) {
        if let Some(old_parent) = child.parent() {
            old_parent.detach(child);
        }
        *child.parent.borrow_mut() = Rc::downgrade(self);

        let mut children = self.children.borrow_mut();
        let index = before
            .and_then(|b| children.iter().position(|c| Rc::ptr_eq(c, b)))
            .unwrap_or(children.len());
        children.insert(index, child.clone());
    }

    pub(crate) fn detach(&self, child: &NodeRef) -> bool {
        let mut children = self.children.borrow_mut();
        match children.iter().position(|c| Rc::ptr_eq(c, child)) {
            Some(index) => {
                children.remove(index);
                *child.parent.borrow_mut() = Weak::new();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("attributes", &*self.attributes.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(key: u64, tag: &str) -> NodeRef {
        Node::new(key, NodeKind::Element(tag.to_string()))
    }

    #[test]
    fn test_input_type_defaults() {
        let input = element(1, "INPUT");
        assert_eq!(input.input_type().as_deref(), Some("text"));

        input.set_attribute_raw("type", "CheckBox");
        assert_eq!(input.input_type().as_deref(), Some("checkbox"));

        assert_eq!(element(2, "TEXTAREA").input_type().as_deref(), Some("textarea"));
        assert_eq!(element(3, "SELECT").input_type().as_deref(), Some("select-one"));
        assert_eq!(element(4, "DIV").input_type(), None);
    }

    #[test]
    fn test_tree_order_and_siblings() {
        let root = element(1, "DIV");
        let a = element(2, "P");
        let b = element(3, "P");
        let c = element(4, "SPAN");

        root.attach(&a, None);
        root.attach(&b, None);
        a.attach(&c, None);

        let keys: Vec<u64> = root.descendants().iter().map(|n| n.key()).collect();
        assert_eq!(keys, vec![1, 2, 4, 3]);
        assert_eq!(a.next_sibling().map(|n| n.key()), Some(3));
        assert_eq!(c.root().key(), 1);

        assert!(root.detach(&a));
        assert!(a.parent().is_none());
        assert_eq!(c.root().key(), 2);
    }

    #[test]
    fn test_class_matching() {
        let div = element(1, "DIV");
        div.set_attribute_raw("class", "header rr-block");
        assert!(div.has_class("rr-block"));
        assert!(!div.has_class("rr"));
    }
}
