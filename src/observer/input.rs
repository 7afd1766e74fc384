//! Form input observation with per-target deduplication.
//!
//! User edits arrive as `input` (per keystroke) and `change` (end of edit)
//! notifications; programmatic assignment is captured by wrapping the form
//! property setters. Both paths funnel into [`InputObserver::handle`], which
//! applies the same filtering, masking and deduplication, so a single edit
//! produces at most one record however many notifications it raised.

use crate::config::InputSampling;
use crate::core::dedup::DedupCache;
use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::core::intercept::{hook_setter, AfterSet};
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent};
use crate::host::node::{Node, NodeRef};
use crate::host::property::{ElementClass, PropertyKey, FORM_PROPERTIES};
use crate::observer::ObserverContext;
use crate::record::{InputRecord, InputValue};
use std::rc::Rc;

const INPUT_TAGS: [&str; 3] = ["INPUT", "TEXTAREA", "SELECT"];

pub struct InputObserver {
    ctx: Rc<ObserverContext>,
    cb: Callback<InputRecord>,
    last_values: DedupCache<Node, InputValue>,
}

impl InputObserver {
    pub fn new(ctx: Rc<ObserverContext>, cb: Callback<InputRecord>) -> Rc<Self> {
        Rc::new(Self {
            ctx,
            cb,
            last_values: DedupCache::new(),
        })
    }

    /// Process a possible value change on `target`.
    pub fn handle(&self, target: &NodeRef) -> RecordResult<()> {
        let Some(tag) = target.tag_name() else {
            return Ok(());
        };
        if !INPUT_TAGS.contains(&tag) || self.ctx.is_blocked(target) {
            return Ok(());
        }
        let input_type = target.input_type().unwrap_or_default();
        if input_type == "password" || target.has_class(&self.ctx.config.ignore_class) {
            return Ok(());
        }

        let mut text = target.value();
        let mut is_checked = false;
        if input_type == "radio" || input_type == "checkbox" {
            is_checked = target.checked();
        } else if self.ctx.masking.should_mask(&tag.to_ascii_lowercase())
            || self.ctx.masking.should_mask(&input_type)
        {
            text = self.ctx.masking.mask(&text);
        }

        self.emit_if_changed(target, InputValue { text, is_checked })?;

        // Checking a radio unchecks the rest of its group without notifying them.
        if input_type == "radio" && is_checked {
            if let Some(name) = target.name().filter(|name| !name.is_empty()) {
                for sibling in self.ctx.doc.radio_group(&name) {
                    if Rc::ptr_eq(&sibling, target) {
                        continue;
                    }
                    let value = InputValue {
                        text: sibling.value(),
                        is_checked: false,
                    };
                    self.emit_if_changed(&sibling, value)?;
                }
            }
        }
        Ok(())
    }

    fn emit_if_changed(&self, target: &NodeRef, value: InputValue) -> RecordResult<()> {
        if !self.last_values.update(target, &value) {
            return Ok(());
        }
        (self.cb)(&InputRecord {
            value,
            id: self.ctx.resolve_id(target),
        })
    }

    /// Number of targets with a remembered value.
    pub fn tracked_targets(&self) -> usize {
        self.last_values.len()
    }
}

/// Listen for user edits and intercept programmatic assignment.
///
/// With `input` sampling set to `last` only end-of-edit notifications are
/// observed. Setter interception is installed only when the host exposes a
/// setter for `input.value`; locked properties are skipped individually.
pub fn observe_input(
    ctx: &Rc<ObserverContext>,
    cb: Callback<InputRecord>,
) -> RecordResult<ListenerHandle> {
    let observer = InputObserver::new(ctx.clone(), cb);

    let kinds: &[EventKind] = match ctx.config.sampling.input {
        InputSampling::Last => &[EventKind::Change],
        InputSampling::All => &[EventKind::Input, EventKind::Change],
    };

    let mut handles = Vec::new();
    for &kind in kinds {
        let observer = observer.clone();
        let handler: EventHandler = Rc::new(move |event: &HostEvent| observer.handle(&event.target));
        handles.push(ctx.doc.add_event_listener(kind, handler));
    }

    let has_value_setter = ctx
        .doc
        .properties()
        .descriptor(ElementClass::Input, PropertyKey::Value)
        .is_some_and(|descriptor| descriptor.setter.is_some());
    if has_value_setter {
        for (class, key) in FORM_PROPERTIES {
            let observer = observer.clone();
            let after: AfterSet = Rc::new(move |element: &NodeRef| observer.handle(element));
            if let Some(handle) = hook_setter(&ctx.doc, class, key, after) {
                handles.push(handle);
            }
        }
    } else {
        tracing::debug!("No value setter on inputs; programmatic changes go unobserved");
    }

    handles.push(ListenerHandle::new(move || observer.last_values.clear()));

    Ok(ListenerHandle::combine(handles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::observer::test_support::*;
    use crate::policy::{IdResolver, MaskInputOptions, MASK_CHAR};

    #[test]
    fn test_identical_values_are_deduplicated() {
        let fx = fixture(RecorderConfig::default());
        let field = attach(&fx, "input", &[]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.user_input(&field, "hello").unwrap();
        fx.doc.user_commit(&field).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        fx.doc.user_input(&field, "hello!").unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                InputRecord {
                    value: InputValue {
                        text: "hello".to_string(),
                        is_checked: false,
                    },
                    id: fx.mirror.resolve_id(&field),
                },
                InputRecord {
                    value: InputValue {
                        text: "hello!".to_string(),
                        is_checked: false,
                    },
                    id: fx.mirror.resolve_id(&field),
                },
            ]
        );
        handle.dispose();
    }

    #[test]
    fn test_radio_group_siblings_are_unchecked() {
        let fx = fixture(RecorderConfig::default());
        let a = attach(&fx, "input", &[("type", "radio"), ("name", "size"), ("value", "s")]);
        let b = attach(&fx, "input", &[("type", "radio"), ("name", "size"), ("value", "m")]);
        let c = attach(&fx, "input", &[("type", "radio"), ("name", "size"), ("value", "l")]);
        let other = attach(&fx, "input", &[("type", "radio"), ("name", "color"), ("value", "red")]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.user_check(&a, true).unwrap();

        let records: Vec<(i64, String, bool)> = seen
            .borrow()
            .iter()
            .map(|r| (r.id, r.value.text.clone(), r.value.is_checked))
            .collect();
        assert_eq!(
            records,
            vec![
                (fx.mirror.resolve_id(&a), "s".to_string(), true),
                (fx.mirror.resolve_id(&b), "m".to_string(), false),
                (fx.mirror.resolve_id(&c), "l".to_string(), false),
            ]
        );
        assert!(!records.iter().any(|r| r.0 == fx.mirror.resolve_id(&other)));
        handle.dispose();
    }

    #[test]
    fn test_masked_text_preserves_length() {
        let mut config = RecorderConfig::default();
        config.mask_inputs = MaskInputOptions::new(["email", "textarea"]);
        let fx = fixture(config);
        let email = attach(&fx, "input", &[("type", "email")]);
        let notes = attach(&fx, "textarea", &[]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.user_input(&email, "me@example.com").unwrap();
        fx.doc.user_input(&notes, "secret").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].value.text.chars().count(), "me@example.com".len());
        assert!(seen[0].value.text.chars().all(|c| c == MASK_CHAR));
        assert_eq!(seen[1].value.text, "******");
        drop(seen);
        handle.dispose();
    }

    #[test]
    fn test_ignored_targets_produce_nothing() {
        let fx = fixture(RecorderConfig::default());
        let password = attach(&fx, "input", &[("type", "password")]);
        let ignored = attach(&fx, "input", &[("class", "rr-ignore")]);
        let blocked = attach(&fx, "input", &[("class", "rr-block")]);
        let div = attach(&fx, "div", &[]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        for target in [&password, &ignored, &blocked, &div] {
            fx.doc.user_input(target, "typed").unwrap();
        }
        assert!(seen.borrow().is_empty());
        handle.dispose();
    }

    #[test]
    fn test_last_sampling_listens_to_change_only() {
        let mut config = RecorderConfig::default();
        config.sampling.input = InputSampling::Last;
        let fx = fixture(config);
        let field = attach(&fx, "input", &[]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.user_input(&field, "h").unwrap();
        fx.doc.user_input(&field, "hi").unwrap();
        assert!(seen.borrow().is_empty());

        fx.doc.user_commit(&field).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].value.text, "hi");
        handle.dispose();
    }

    #[test]
    fn test_programmatic_assignment_is_captured_once() {
        let fx = fixture(RecorderConfig::default());
        let field = attach(&fx, "input", &[]);
        let toggle = attach(&fx, "input", &[("type", "checkbox")]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.set_value(&field, "scripted").unwrap();
        fx.doc.set_value(&field, "scripted").unwrap();
        fx.doc.set_checked(&toggle, true).unwrap();

        let values: Vec<InputValue> = seen.borrow().iter().map(|r| r.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                InputValue {
                    text: "scripted".to_string(),
                    is_checked: false,
                },
                InputValue {
                    text: String::new(),
                    is_checked: true,
                },
            ]
        );
        handle.dispose();
    }

    #[test]
    fn test_locked_setter_still_records_user_edits() {
        let fx = fixture(RecorderConfig::default());
        fx.doc
            .properties()
            .lock(ElementClass::TextArea, PropertyKey::Value);
        let notes = attach(&fx, "textarea", &[]);
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.set_value(&notes, "from script").unwrap();
        assert!(seen.borrow().is_empty());

        fx.doc.user_input(&notes, "typed").unwrap();
        assert_eq!(seen.borrow().len(), 1);
        handle.dispose();
    }

    #[test]
    fn test_select_by_index_is_recorded() {
        let fx = fixture(RecorderConfig::default());
        let select = attach(&fx, "select", &[]);
        for value in ["a", "b"] {
            let option = fx.doc.create_element_with("option", &[("value", value)]);
            fx.doc.append_child(&select, &option);
        }
        let (cb, seen) = collect::<InputRecord>();
        let handle = observe_input(&fx.ctx, cb).unwrap();

        fx.doc.set_selected_index(&select, 1).unwrap();
        fx.doc.user_select(&select, 1).unwrap();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].value.text, "b");
        handle.dispose();
    }
}
