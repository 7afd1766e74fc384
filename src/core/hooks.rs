//! Sink callbacks and auxiliary hook composition.
//!
//! A [`HookSet`] lets secondary consumers (debuggers, statistics, mirrors to
//! another sink) see every record the primary sink sees. Hooks run first, with
//! the same argument, and cannot veto or alter what the primary receives.

use crate::error::RecordResult;
use crate::record::{
    InputRecord, MediaInteractionRecord, MouseInteractionRecord, MovementBatch, MutationBatch,
    RecordedEvent, ScrollPosition, StyleSheetRuleChange, ViewportDimensions,
};
use std::rc::Rc;

/// A record consumer for one category.
pub type Callback<T> = Rc<dyn Fn(&T) -> RecordResult<()>>;

/// The primary sink: one callback per record category.
#[derive(Clone)]
pub struct Callbacks {
    pub mutation: Callback<MutationBatch>,
    pub mousemove: Callback<MovementBatch>,
    pub mouse_interaction: Callback<MouseInteractionRecord>,
    pub scroll: Callback<ScrollPosition>,
    pub viewport_resize: Callback<ViewportDimensions>,
    pub input: Callback<InputRecord>,
    pub media_interaction: Callback<MediaInteractionRecord>,
    pub style_sheet_rule: Callback<StyleSheetRuleChange>,
}

impl Callbacks {
    /// Route every category into a single function taking [`RecordedEvent`].
    pub fn from_fn(f: impl Fn(RecordedEvent) -> RecordResult<()> + 'static) -> Self {
        let f: Rc<dyn Fn(RecordedEvent) -> RecordResult<()>> = Rc::new(f);
        Self {
            mutation: route(&f, RecordedEvent::Mutation),
            mousemove: route(&f, RecordedEvent::MouseMove),
            mouse_interaction: route(&f, RecordedEvent::MouseInteraction),
            scroll: route(&f, RecordedEvent::Scroll),
            viewport_resize: route(&f, RecordedEvent::ViewportResize),
            input: route(&f, RecordedEvent::Input),
            media_interaction: route(&f, RecordedEvent::MediaInteraction),
            style_sheet_rule: route(&f, RecordedEvent::StyleSheetRule),
        }
    }
}

/// Optional auxiliary callbacks; absent entries are no-ops.
#[derive(Clone, Default)]
pub struct HookSet {
    pub mutation: Option<Callback<MutationBatch>>,
    pub mousemove: Option<Callback<MovementBatch>>,
    pub mouse_interaction: Option<Callback<MouseInteractionRecord>>,
    pub scroll: Option<Callback<ScrollPosition>>,
    pub viewport_resize: Option<Callback<ViewportDimensions>>,
    pub input: Option<Callback<InputRecord>>,
    pub media_interaction: Option<Callback<MediaInteractionRecord>>,
    pub style_sheet_rule: Option<Callback<StyleSheetRuleChange>>,
}

impl HookSet {
    /// A hook for every category, routed into one function.
    pub fn from_fn(f: impl Fn(RecordedEvent) -> RecordResult<()> + 'static) -> Self {
        let callbacks = Callbacks::from_fn(f);
        Self {
            mutation: Some(callbacks.mutation),
            mousemove: Some(callbacks.mousemove),
            mouse_interaction: Some(callbacks.mouse_interaction),
            scroll: Some(callbacks.scroll),
            viewport_resize: Some(callbacks.viewport_resize),
            input: Some(callbacks.input),
            media_interaction: Some(callbacks.media_interaction),
            style_sheet_rule: Some(callbacks.style_sheet_rule),
        }
    }
}

fn route<T: Clone + 'static>(
    f: &Rc<dyn Fn(RecordedEvent) -> RecordResult<()>>,
    wrap: fn(T) -> RecordedEvent,
) -> Callback<T> {
    let f = f.clone();
    Rc::new(move |record: &T| f(wrap(record.clone())))
}

/// Sequence `[hook, primary]` behind one callback.
///
/// A failing hook propagates its error and the primary is not invoked.
pub fn chain<T: 'static>(primary: Callback<T>, hook: Option<Callback<T>>) -> Callback<T> {
    match hook {
        None => primary,
        Some(hook) => Rc::new(move |record: &T| {
            hook(record)?;
            primary(record)
        }),
    }
}

/// Compose every primary callback with its hook, if any.
pub fn merge_hooks(callbacks: Callbacks, hooks: &HookSet) -> Callbacks {
    Callbacks {
        mutation: chain(callbacks.mutation, hooks.mutation.clone()),
        mousemove: chain(callbacks.mousemove, hooks.mousemove.clone()),
        mouse_interaction: chain(callbacks.mouse_interaction, hooks.mouse_interaction.clone()),
        scroll: chain(callbacks.scroll, hooks.scroll.clone()),
        viewport_resize: chain(callbacks.viewport_resize, hooks.viewport_resize.clone()),
        input: chain(callbacks.input, hooks.input.clone()),
        media_interaction: chain(callbacks.media_interaction, hooks.media_interaction.clone()),
        style_sheet_rule: chain(callbacks.style_sheet_rule, hooks.style_sheet_rule.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use std::cell::RefCell;

    fn scroll(id: i64) -> ScrollPosition {
        ScrollPosition { id, x: 0.0, y: 10.0 }
    }

    #[test]
    fn test_hook_runs_before_primary_with_same_record() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = order.clone();
        let callbacks = Callbacks::from_fn(move |event| {
            log.borrow_mut().push(format!("primary:{}", event.category()));
            Ok(())
        });

        let log = order.clone();
        let hooks = HookSet {
            scroll: Some(Rc::new(move |record: &ScrollPosition| {
                log.borrow_mut().push(format!("hook:{}", record.id));
                Ok(())
            })),
            ..HookSet::default()
        };

        let merged = merge_hooks(callbacks, &hooks);
        (merged.scroll)(&scroll(9)).unwrap();
        (merged.input)(&InputRecord {
            value: crate::record::InputValue {
                text: String::new(),
                is_checked: false,
            },
            id: 1,
        })
        .unwrap();

        assert_eq!(
            *order.borrow(),
            vec!["hook:9", "primary:scroll", "primary:input"]
        );
    }

    #[test]
    fn test_failing_hook_propagates() {
        let delivered = Rc::new(RefCell::new(0));
        let counter = delivered.clone();
        let primary: Callback<ScrollPosition> = Rc::new(move |_: &ScrollPosition| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        let hook: Callback<ScrollPosition> =
            Rc::new(|_: &ScrollPosition| Err(RecordError::Callback("hook".to_string())));

        let chained = chain(primary, Some(hook));
        assert!(chained(&scroll(1)).is_err());
        assert_eq!(*delivered.borrow(), 0);
    }

    #[test]
    fn test_missing_hook_returns_primary() {
        let primary: Callback<ScrollPosition> = Rc::new(|_: &ScrollPosition| Ok(()));
        let chained = chain(primary.clone(), None);
        assert!(Rc::ptr_eq(&primary, &chained));
    }
}
