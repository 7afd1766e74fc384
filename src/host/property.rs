//! Property descriptors for form-control prototypes.
//!
//! Programmatic assignment (`input.value = ...`) is routed through a table of
//! per-prototype setters. A setter can be replaced only while its descriptor
//! is configurable; some hosts lock them, in which case programmatic changes
//! simply bypass any instrumentation.

use crate::error::{RecordError, RecordResult};
use crate::host::node::{Node, NodeRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Prototype families that carry instrumentable form properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Input,
    Select,
    TextArea,
}

impl ElementClass {
    pub fn of(node: &Node) -> Option<Self> {
        match node.tag_name()? {
            "INPUT" => Some(Self::Input),
            "SELECT" => Some(Self::Select),
            "TEXTAREA" => Some(Self::TextArea),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Value,
    Checked,
    SelectedIndex,
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Value => write!(f, "value"),
            PropertyKey::Checked => write!(f, "checked"),
            PropertyKey::SelectedIndex => write!(f, "selectedIndex"),
        }
    }
}

/// A value being assigned to a form property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Flag(bool),
    Index(i64),
}

/// Setter invoked with the element being assigned to and the new value.
pub type Setter = Rc<dyn Fn(&NodeRef, &PropertyValue) -> RecordResult<()>>;

#[derive(Clone)]
pub struct PropertyDescriptor {
    pub setter: Option<Setter>,
    pub configurable: bool,
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("has_setter", &self.setter.is_some())
            .field("configurable", &self.configurable)
            .finish()
    }
}

/// Every instrumentable (prototype, property) pair.
pub const FORM_PROPERTIES: [(ElementClass, PropertyKey); 5] = [
    (ElementClass::Input, PropertyKey::Value),
    (ElementClass::Input, PropertyKey::Checked),
    (ElementClass::Select, PropertyKey::Value),
    (ElementClass::TextArea, PropertyKey::Value),
    (ElementClass::Select, PropertyKey::SelectedIndex),
];

/// The document's descriptor table.
pub struct PropertyTable {
    descriptors: RefCell<HashMap<(ElementClass, PropertyKey), PropertyDescriptor>>,
}

impl PropertyTable {
    /// A table holding the host's native, configurable setters.
    pub fn native() -> Self {
        let descriptors = FORM_PROPERTIES
            .iter()
            .map(|&(class, key)| {
                let setter: Setter = Rc::new(move |node: &NodeRef, value: &PropertyValue| {
                    assign_native(node, key, value);
                    Ok(())
                });
                (
                    (class, key),
                    PropertyDescriptor {
                        setter: Some(setter),
                        configurable: true,
                    },
                )
            })
            .collect();

        Self {
            descriptors: RefCell::new(descriptors),
        }
    }

    pub fn descriptor(&self, class: ElementClass, key: PropertyKey) -> Option<PropertyDescriptor> {
        self.descriptors.borrow().get(&(class, key)).cloned()
    }

    /// Replace a descriptor. Fails when the existing one is not configurable.
    pub fn define(
        &self,
        class: ElementClass,
        key: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> RecordResult<()> {
        let mut descriptors = self.descriptors.borrow_mut();
        if let Some(existing) = descriptors.get(&(class, key)) {
            if !existing.configurable {
                return Err(RecordError::NotConfigurable(key.to_string()));
            }
        }
        descriptors.insert((class, key), descriptor);
        Ok(())
    }

    /// Mark a descriptor as non-configurable, as hardened hosts do.
    pub fn lock(&self, class: ElementClass, key: PropertyKey) {
        if let Some(descriptor) = self.descriptors.borrow_mut().get_mut(&(class, key)) {
            descriptor.configurable = false;
        }
    }
}

/// The host's own assignment semantics, bypassing the descriptor table.
pub(crate) fn assign_native(node: &NodeRef, key: PropertyKey, value: &PropertyValue) {
    match (key, value) {
        (PropertyKey::Checked, PropertyValue::Flag(checked)) => {
            node.set_checked_raw(*checked);
            if *checked {
                uncheck_radio_group(node);
            }
        }
        (PropertyKey::SelectedIndex, PropertyValue::Index(index)) => select_option(node, *index),
        (PropertyKey::Value, PropertyValue::Text(text)) if node.tag_name() == Some("SELECT") => {
            let index = options(node)
                .iter()
                .position(|option| option_value(option) == *text)
                .map(|i| i as i64)
                .unwrap_or(-1);
            select_option(node, index);
        }
        (PropertyKey::Value, PropertyValue::Text(text)) => node.set_value_raw(text),
        _ => {}
    }
}

/// Checking a radio silently unchecks the others sharing its name.
fn uncheck_radio_group(node: &NodeRef) {
    if node.input_type().as_deref() != Some("radio") {
        return;
    }
    let Some(name) = node.name() else {
        return;
    };
    for other in radio_group(&node.root(), &name) {
        if !Rc::ptr_eq(&other, node) {
            other.set_checked_raw(false);
        }
    }
}

/// All radio inputs under `root` with the given `name`, in tree order.
pub(crate) fn radio_group(root: &NodeRef, name: &str) -> Vec<NodeRef> {
    root.descendants()
        .into_iter()
        .filter(|n| {
            n.tag_name() == Some("INPUT")
                && n.input_type().as_deref() == Some("radio")
                && n.name().as_deref() == Some(name)
        })
        .collect()
}

fn options(select: &NodeRef) -> Vec<NodeRef> {
    select
        .descendants()
        .into_iter()
        .filter(|n| n.tag_name() == Some("OPTION"))
        .collect()
}

fn option_value(option: &NodeRef) -> String {
    option.attribute("value").unwrap_or_else(|| {
        option
            .children()
            .iter()
            .map(|child| child.data())
            .collect::<String>()
    })
}

fn select_option(select: &NodeRef, index: i64) {
    let value = usize::try_from(index)
        .ok()
        .and_then(|i| options(select).get(i).map(option_value));
    match value {
        Some(value) => {
            select.set_selected_index_raw(index);
            select.set_value_raw(&value);
        }
        None => {
            select.set_selected_index_raw(-1);
            select.set_value_raw("");
        }
    }
}
