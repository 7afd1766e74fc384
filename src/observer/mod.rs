//! Observation sources and the registry that starts them together.
//!
//! Every source follows the same shape: register listeners (or interceptors)
//! against the [`Document`], filter and extract, rate-limit or deduplicate as
//! needed, then hand a finished record to its sink callback. Each returns a
//! [`ListenerHandle`] that undoes exactly what it installed.

pub mod input;
pub mod interaction;
pub mod media;
pub mod movement;
pub mod mutation;
pub mod scroll;
pub mod stylesheet;
pub mod viewport;

use crate::config::RecorderConfig;
use crate::core::handle::ListenerHandle;
use crate::core::hooks::{merge_hooks, Callbacks, HookSet};
use crate::core::timer::SharedScheduler;
use crate::error::RecordResult;
use crate::host::document::Document;
use crate::host::node::NodeRef;
use crate::policy::{BlockPredicate, IdResolver, MaskPolicy, MutationSerializer};
use crate::record::NodeId;
use std::rc::Rc;

pub use input::InputObserver;
pub use movement::PositionBatcher;

/// Everything an observation source needs from its environment.
pub struct ObserverContext {
    pub doc: Rc<Document>,
    pub scheduler: SharedScheduler,
    pub ids: Rc<dyn IdResolver>,
    pub blocker: Rc<dyn BlockPredicate>,
    pub masking: Rc<dyn MaskPolicy>,
    pub serializer: Rc<dyn MutationSerializer>,
    pub config: RecorderConfig,
}

impl ObserverContext {
    /// Ids are resolved on every emission, never cached.
    pub fn resolve_id(&self, node: &NodeRef) -> NodeId {
        self.ids.resolve_id(node)
    }

    pub fn is_blocked(&self, node: &NodeRef) -> bool {
        self.blocker.is_blocked(node, &self.config.block_class)
    }
}

/// Compose `hooks` into `callbacks` and start every observation source.
///
/// Sources start in a fixed order: structural changes, movement,
/// interactions, scroll, viewport, input, media, stylesheet. If one fails to
/// start, the ones after it are never started and the error is returned;
/// sources already started are left running for the caller to handle.
pub fn init_observers(
    ctx: &Rc<ObserverContext>,
    callbacks: Callbacks,
    hooks: &HookSet,
) -> RecordResult<ListenerHandle> {
    let cb = merge_hooks(callbacks, hooks);

    let handles = vec![
        mutation::observe_mutations(ctx, cb.mutation)?,
        movement::observe_movement(ctx, cb.mousemove)?,
        interaction::observe_mouse_interactions(ctx, cb.mouse_interaction)?,
        scroll::observe_scroll(ctx, cb.scroll)?,
        viewport::observe_viewport_resize(ctx, cb.viewport_resize)?,
        input::observe_input(ctx, cb.input)?,
        media::observe_media_interactions(ctx, cb.media_interaction)?,
        stylesheet::observe_style_sheet_rules(ctx, cb.style_sheet_rule)?,
    ];
    tracing::debug!(sources = handles.len(), "Observers started");

    Ok(ListenerHandle::combine(handles))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::RecordError;
    use crate::host::events::EventKind;
    use crate::record::RecordedEvent;
    use std::cell::RefCell;

    fn recording_callbacks() -> (Callbacks, Rc<RefCell<Vec<RecordedEvent>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let callbacks = Callbacks::from_fn(move |event| {
            sink.borrow_mut().push(event);
            Ok(())
        });
        (callbacks, seen)
    }

    #[test]
    fn test_teardown_removes_everything_and_is_idempotent() {
        let fx = fixture(RecorderConfig::default());
        let (callbacks, _seen) = recording_callbacks();

        let handle = init_observers(&fx.ctx, callbacks, &HookSet::default()).unwrap();
        assert!(fx.doc.listener_count() > 0);
        assert_eq!(fx.doc.mutation_observer_count(), 1);

        handle.dispose();
        assert_eq!(fx.doc.listener_count(), 0);
        assert_eq!(fx.doc.mutation_observer_count(), 0);
        assert_eq!(fx.clock.pending_count(), 0);

        handle.dispose();
        assert!(handle.is_disposed());
        assert_eq!(fx.doc.listener_count(), 0);
    }

    #[test]
    fn test_hooks_see_records_before_the_sink() {
        let fx = fixture(RecorderConfig::default());
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = order.clone();
        let callbacks = Callbacks::from_fn(move |event| {
            log.borrow_mut().push(format!("sink:{}", event.category()));
            Ok(())
        });
        let log = order.clone();
        let hooks = HookSet::from_fn(move |event| {
            log.borrow_mut().push(format!("hook:{}", event.category()));
            Ok(())
        });

        let video = attach(&fx, "video", &[]);
        let handle = init_observers(&fx.ctx, callbacks, &hooks).unwrap();
        fx.doc.play(&video).unwrap();

        assert_eq!(
            *order.borrow(),
            vec!["hook:media_interaction", "sink:media_interaction"]
        );
        handle.dispose();
    }

    #[test]
    fn test_hook_failure_reaches_the_host() {
        let fx = fixture(RecorderConfig::default());
        let (callbacks, seen) = recording_callbacks();
        let hooks = HookSet::from_fn(|_| Err(RecordError::Callback("hook failed".to_string())));

        let button = attach(&fx, "button", &[]);
        let handle = init_observers(&fx.ctx, callbacks, &hooks).unwrap();

        let result = fx.doc.pointer(EventKind::Click, &button, 1.0, 2.0);
        assert_eq!(result, Err(RecordError::Callback("hook failed".to_string())));
        assert!(seen.borrow().is_empty());
        handle.dispose();
    }

    #[test]
    fn test_interception_is_restored_on_teardown() {
        let fx = fixture(RecorderConfig::default());
        let (callbacks, seen) = recording_callbacks();
        let input = attach(&fx, "input", &[]);

        let handle = init_observers(&fx.ctx, callbacks, &HookSet::default()).unwrap();
        fx.doc.set_value(&input, "scripted").unwrap();
        assert_eq!(seen.borrow().len(), 1);

        handle.dispose();
        fx.doc.set_value(&input, "after").unwrap();
        assert_eq!(input.value(), "after");
        assert_eq!(seen.borrow().len(), 1);
    }
}
