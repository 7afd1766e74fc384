//! Setter interception for programmatic property assignment.

use crate::core::handle::ListenerHandle;
use crate::error::RecordResult;
use crate::host::document::Document;
use crate::host::node::NodeRef;
use crate::host::property::{ElementClass, PropertyDescriptor, PropertyKey, PropertyValue, Setter};
use std::rc::Rc;

/// Called with the assigned element after the original setter has run.
pub type AfterSet = Rc<dyn Fn(&NodeRef) -> RecordResult<()>>;

/// Wrap the setter of `class.key` so every assignment runs the original
/// setter and then `after(element)`.
///
/// Returns `None`, leaving the property untouched, when there is no setter to
/// wrap or the descriptor is not configurable. Disposing the returned handle
/// restores the original descriptor.
pub fn hook_setter(
    doc: &Rc<Document>,
    class: ElementClass,
    key: PropertyKey,
    after: AfterSet,
) -> Option<ListenerHandle> {
    let original = doc.properties().descriptor(class, key)?;
    let Some(original_setter) = original.setter.clone() else {
        tracing::debug!(?class, %key, "No setter to intercept");
        return None;
    };
    if !original.configurable {
        tracing::debug!(?class, %key, "Setter is not configurable; programmatic changes go unobserved");
        return None;
    }

    let setter: Setter = Rc::new(move |element: &NodeRef, value: &PropertyValue| {
        original_setter(element, value)?;
        after(element)
    });
    let installed = PropertyDescriptor {
        setter: Some(setter),
        configurable: true,
    };
    if let Err(e) = doc.properties().define(class, key, installed) {
        tracing::debug!(?class, %key, "Could not install setter hook: {e}");
        return None;
    }

    let doc = Rc::downgrade(doc);
    Some(ListenerHandle::new(move || {
        let Some(doc) = doc.upgrade() else {
            return;
        };
        if let Err(e) = doc.properties().define(class, key, original) {
            tracing::warn!(?class, %key, "Could not restore original setter: {e}");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_hook(seen: &Rc<RefCell<Vec<String>>>) -> AfterSet {
        let seen = seen.clone();
        Rc::new(move |element: &NodeRef| {
            seen.borrow_mut().push(element.value());
            Ok(())
        })
    }

    #[test]
    fn test_assignment_happens_before_hook() {
        let doc = Document::new();
        let input = doc.create_element("input");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let handle = hook_setter(
            &doc,
            ElementClass::Input,
            PropertyKey::Value,
            recording_hook(&seen),
        )
        .unwrap();

        doc.set_value(&input, "new").unwrap();
        assert_eq!(input.value(), "new");
        assert_eq!(*seen.borrow(), vec!["new".to_string()]);

        handle.dispose();
        doc.set_value(&input, "after").unwrap();
        assert_eq!(input.value(), "after");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_locked_property_is_left_alone() {
        let doc = Document::new();
        doc.properties().lock(ElementClass::TextArea, PropertyKey::Value);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let handle = hook_setter(
            &doc,
            ElementClass::TextArea,
            PropertyKey::Value,
            recording_hook(&seen),
        );
        assert!(handle.is_none());

        let area = doc.create_element("textarea");
        doc.set_value(&area, "x").unwrap();
        assert_eq!(area.value(), "x");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_missing_descriptor_is_not_hooked() {
        let doc = Document::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let handle = hook_setter(
            &doc,
            ElementClass::TextArea,
            PropertyKey::Checked,
            recording_hook(&seen),
        );
        assert!(handle.is_none());
    }
}
