//! The in-process document: tree, notifications and instrumentable prototypes.

use crate::core::handle::ListenerHandle;
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent, ListenerRegistry};
use crate::host::mutation::MutationRecord;
use crate::host::node::{Node, NodeKind, NodeRef};
use crate::host::property::{
    self, assign_native, ElementClass, PropertyKey, PropertyTable, PropertyValue,
};
use crate::host::stylesheet::{StyleSheet, StyleSheetMethods};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback receiving one batch of structural changes.
pub type MutationHandler = Rc<dyn Fn(&[MutationRecord]) -> RecordResult<()>>;

#[derive(Default)]
struct MutationObservers {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(u64, MutationHandler)>>,
}

/// A document the recorder can observe.
///
/// Host adapters (or tests) drive it: building the tree, simulating user
/// interaction, assigning properties from script and editing stylesheets.
/// Structural changes are queued and delivered on [`Document::flush_mutations`],
/// mirroring how hosts batch them.
pub struct Document {
    root: NodeRef,
    next_key: Cell<u64>,
    listeners: Rc<ListenerRegistry>,
    observers: Rc<MutationObservers>,
    pending_mutations: RefCell<Vec<MutationRecord>>,
    properties: PropertyTable,
    style_sheet_methods: StyleSheetMethods,
    viewport: Cell<(u32, u32)>,
}

impl Document {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            root: Node::new(0, NodeKind::Document),
            next_key: Cell::new(1),
            listeners: Rc::new(ListenerRegistry::default()),
            observers: Rc::new(MutationObservers::default()),
            pending_mutations: RefCell::new(Vec::new()),
            properties: PropertyTable::native(),
            style_sheet_methods: StyleSheetMethods::native(),
            viewport: Cell::new((1024, 768)),
        })
    }

    /// The document node itself.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// The first element child of the document, usually `<html>`.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.root
            .children()
            .into_iter()
            .find(|n| n.tag_name().is_some())
    }

    /// The element whose offsets describe the document's scroll position.
    pub fn scrolling_element(&self) -> NodeRef {
        self.document_element().unwrap_or_else(|| self.root.clone())
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport.get()
    }

    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    pub fn style_sheet_methods(&self) -> &StyleSheetMethods {
        &self.style_sheet_methods
    }

    // ---- tree construction ----

    /// Create a detached element. The tag is normalized to upper case.
    pub fn create_element(&self, tag: &str) -> NodeRef {
        Node::new(self.next_key(), NodeKind::Element(tag.to_ascii_uppercase()))
    }

    /// Create a detached element with initial attributes.
    ///
    /// `value` and `checked` attributes also seed the control's form state.
    pub fn create_element_with(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeRef {
        let element = self.create_element(tag);
        for (name, value) in attributes {
            element.set_attribute_raw(name, value);
        }
        if let Some(value) = element.attribute("value") {
            element.set_value_raw(&value);
        }
        if element.attribute("checked").is_some() {
            element.set_checked_raw(true);
        }
        element
    }

    pub fn create_text(&self, data: &str) -> NodeRef {
        let text = Node::new(self.next_key(), NodeKind::Text);
        text.set_data_raw(data);
        text
    }

    /// Attach a stylesheet to `owner` (a `<style>` or `<link>` element).
    pub fn create_style_sheet(&self, owner: &NodeRef) -> Rc<StyleSheet> {
        let sheet = StyleSheet::new(owner);
        owner.set_sheet(sheet.clone());
        sheet
    }

    pub fn append_child(&self, parent: &NodeRef, child: &NodeRef) {
        self.insert_before(parent, child, None);
    }

    pub fn insert_before(&self, parent: &NodeRef, child: &NodeRef, before: Option<&NodeRef>) {
        if let Some(old_parent) = child.parent() {
            self.remove_child(&old_parent, child);
        }
        parent.attach(child, before);
        self.queue_mutation(|| MutationRecord::ChildList {
            target: parent.clone(),
            added: vec![child.clone()],
            removed: Vec::new(),
            next_sibling: child.next_sibling(),
        });
    }

    /// Detach `child` from `parent`. Returns whether it was a child.
    pub fn remove_child(&self, parent: &NodeRef, child: &NodeRef) -> bool {
        let next_sibling = child.next_sibling();
        if !parent.detach(child) {
            return false;
        }
        self.queue_mutation(|| MutationRecord::ChildList {
            target: parent.clone(),
            added: Vec::new(),
            removed: vec![child.clone()],
            next_sibling,
        });
        true
    }

    pub fn set_attribute(&self, element: &NodeRef, name: &str, value: &str) {
        let old_value = element.set_attribute_raw(name, value);
        self.queue_mutation(|| MutationRecord::Attributes {
            target: element.clone(),
            name: name.to_string(),
            old_value,
        });
    }

    pub fn remove_attribute(&self, element: &NodeRef, name: &str) {
        if let Some(old_value) = element.remove_attribute_raw(name) {
            self.queue_mutation(|| MutationRecord::Attributes {
                target: element.clone(),
                name: name.to_string(),
                old_value: Some(old_value),
            });
        }
    }

    pub fn set_text(&self, text: &NodeRef, data: &str) {
        let old_value = text.set_data_raw(data);
        self.queue_mutation(|| MutationRecord::CharacterData {
            target: text.clone(),
            old_value,
        });
    }

    /// All radio inputs in the document sharing `name`, in tree order.
    pub fn radio_group(&self, name: &str) -> Vec<NodeRef> {
        property::radio_group(&self.root, name)
    }

    // ---- notifications ----

    pub fn add_event_listener(&self, kind: EventKind, handler: EventHandler) -> ListenerHandle {
        self.listeners.add(kind, handler)
    }

    /// Deliver a notification to every listener for its kind.
    pub fn dispatch(&self, event: &HostEvent) -> RecordResult<()> {
        self.listeners.dispatch(event)
    }

    /// Number of registered event listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a structural-change observer for the whole document.
    pub fn observe_mutations(&self, handler: MutationHandler) -> ListenerHandle {
        let id = self.observers.next_id.get();
        self.observers.next_id.set(id + 1);
        self.observers.handlers.borrow_mut().push((id, handler));

        let observers = Rc::downgrade(&self.observers);
        ListenerHandle::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.handlers.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn mutation_observer_count(&self) -> usize {
        self.observers.handlers.borrow().len()
    }

    /// Deliver queued structural changes to every observer, in one batch.
    pub fn flush_mutations(&self) -> RecordResult<()> {
        let records = std::mem::take(&mut *self.pending_mutations.borrow_mut());
        if records.is_empty() {
            return Ok(());
        }
        let handlers: Vec<MutationHandler> = self
            .observers
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(records.as_slice())?;
        }
        Ok(())
    }

    // ---- programmatic assignment ----

    /// Assign a form property from script, through the descriptor table.
    pub fn set_property(
        &self,
        element: &NodeRef,
        key: PropertyKey,
        value: PropertyValue,
    ) -> RecordResult<()> {
        let descriptor =
            ElementClass::of(element).and_then(|class| self.properties.descriptor(class, key));
        match descriptor {
            Some(descriptor) => match descriptor.setter {
                Some(setter) => setter(element, &value),
                // Accessor without a setter: the assignment is ignored.
                None => Ok(()),
            },
            None => {
                assign_native(element, key, &value);
                Ok(())
            }
        }
    }

    pub fn set_value(&self, element: &NodeRef, value: &str) -> RecordResult<()> {
        self.set_property(element, PropertyKey::Value, PropertyValue::Text(value.to_string()))
    }

    pub fn set_checked(&self, element: &NodeRef, checked: bool) -> RecordResult<()> {
        self.set_property(element, PropertyKey::Checked, PropertyValue::Flag(checked))
    }

    pub fn set_selected_index(&self, element: &NodeRef, index: i64) -> RecordResult<()> {
        self.set_property(element, PropertyKey::SelectedIndex, PropertyValue::Index(index))
    }

    // ---- stylesheet edits ----

    /// `sheet.insertRule(rule, index)` through the current method table.
    pub fn insert_rule(
        &self,
        sheet: &StyleSheet,
        rule: &str,
        index: Option<usize>,
    ) -> RecordResult<usize> {
        let method = self.style_sheet_methods.insert_rule();
        method(sheet, rule, index)
    }

    /// `sheet.deleteRule(index)` through the current method table.
    pub fn delete_rule(&self, sheet: &StyleSheet, index: usize) -> RecordResult<()> {
        let method = self.style_sheet_methods.delete_rule();
        method(sheet, index)
    }

    // ---- simulated user interaction ----

    /// A keystroke-level edit: the control's value changes and `input` fires.
    pub fn user_input(&self, element: &NodeRef, value: &str) -> RecordResult<()> {
        assign_native(element, PropertyKey::Value, &PropertyValue::Text(value.to_string()));
        self.dispatch(&HostEvent::new(EventKind::Input, element.clone()))
    }

    /// The end of an edit: `change` fires.
    pub fn user_commit(&self, element: &NodeRef) -> RecordResult<()> {
        self.dispatch(&HostEvent::new(EventKind::Change, element.clone()))
    }

    /// Clicking a checkbox or radio: state changes, then `input` and `change`.
    pub fn user_check(&self, element: &NodeRef, checked: bool) -> RecordResult<()> {
        assign_native(element, PropertyKey::Checked, &PropertyValue::Flag(checked));
        self.dispatch(&HostEvent::new(EventKind::Input, element.clone()))?;
        self.user_commit(element)
    }

    /// Picking an option: selection changes, then `input` and `change`.
    pub fn user_select(&self, element: &NodeRef, index: i64) -> RecordResult<()> {
        assign_native(element, PropertyKey::SelectedIndex, &PropertyValue::Index(index));
        self.dispatch(&HostEvent::new(EventKind::Input, element.clone()))?;
        self.user_commit(element)
    }

    /// A pointer or touch notification at `(x, y)` over `target`.
    pub fn pointer(&self, kind: EventKind, target: &NodeRef, x: f64, y: f64) -> RecordResult<()> {
        self.dispatch(&HostEvent::pointer(kind, target.clone(), x, y))
    }

    /// Scroll `target` (or the document, when given the root) and notify.
    pub fn scroll_to(&self, target: &NodeRef, x: f64, y: f64) -> RecordResult<()> {
        if target.is_document() {
            self.scrolling_element().set_scroll_raw(x, y);
        } else {
            target.set_scroll_raw(x, y);
        }
        self.dispatch(&HostEvent::new(EventKind::Scroll, target.clone()))
    }

    /// Resize the viewport and notify.
    pub fn resize(&self, width: u32, height: u32) -> RecordResult<()> {
        self.viewport.set((width, height));
        self.dispatch(&HostEvent::new(EventKind::Resize, self.root.clone()))
    }

    pub fn play(&self, media: &NodeRef) -> RecordResult<()> {
        self.dispatch(&HostEvent::new(EventKind::Play, media.clone()))
    }

    pub fn pause(&self, media: &NodeRef) -> RecordResult<()> {
        self.dispatch(&HostEvent::new(EventKind::Pause, media.clone()))
    }

    fn next_key(&self) -> u64 {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        key
    }

    /// Structural changes are only recorded while someone observes them.
    fn queue_mutation(&self, record: impl FnOnce() -> MutationRecord) {
        if self.mutation_observer_count() > 0 {
            self.pending_mutations.borrow_mut().push(record());
        }
    }
}
