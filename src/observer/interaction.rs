//! Discrete mouse and touch interactions.

use crate::config::InteractionSampling;
use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent, Point};
use crate::observer::ObserverContext;
use crate::record::{MouseInteraction, MouseInteractionRecord};
use std::rc::Rc;

fn event_kind(interaction: MouseInteraction) -> EventKind {
    match interaction {
        MouseInteraction::MouseUp => EventKind::MouseUp,
        MouseInteraction::MouseDown => EventKind::MouseDown,
        MouseInteraction::Click => EventKind::Click,
        MouseInteraction::ContextMenu => EventKind::ContextMenu,
        MouseInteraction::DblClick => EventKind::DblClick,
        MouseInteraction::Focus => EventKind::Focus,
        MouseInteraction::Blur => EventKind::Blur,
        MouseInteraction::TouchStart => EventKind::TouchStart,
        MouseInteraction::TouchEnd => EventKind::TouchEnd,
    }
}

/// Record clicks, presses, focus changes and touches, one listener per
/// enabled interaction.
pub fn observe_mouse_interactions(
    ctx: &Rc<ObserverContext>,
    cb: Callback<MouseInteractionRecord>,
) -> RecordResult<ListenerHandle> {
    let sampling = &ctx.config.sampling.mouse_interaction;
    if *sampling == InteractionSampling::Enabled(false) {
        tracing::debug!("Mouse interaction sampling disabled");
        return Ok(ListenerHandle::noop());
    }

    let mut handles = Vec::new();
    for interaction in MouseInteraction::ALL {
        if !sampling.is_enabled(interaction) {
            continue;
        }
        let observer = ctx.clone();
        let cb = cb.clone();
        let handler: EventHandler = Rc::new(move |event: &HostEvent| {
            if observer.is_blocked(&event.target) {
                return Ok(());
            }
            let point = match event.client_point() {
                Some(point) => point,
                // A touch notification without changed touches has no position.
                None if event.is_touch() => return Ok(()),
                None => Point { x: 0.0, y: 0.0 },
            };
            cb(&MouseInteractionRecord {
                kind: interaction,
                id: observer.resolve_id(&event.target),
                x: point.x,
                y: point.y,
            })
        });
        handles.push(ctx.doc.add_event_listener(event_kind(interaction), handler));
    }

    Ok(ListenerHandle::combine(handles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::observer::test_support::*;
    use crate::policy::IdResolver;
    use std::collections::BTreeMap;

    #[test]
    fn test_click_is_recorded_with_coordinates() {
        let fx = fixture(RecorderConfig::default());
        let button = attach(&fx, "button", &[]);
        let (cb, seen) = collect::<MouseInteractionRecord>();
        let handle = observe_mouse_interactions(&fx.ctx, cb).unwrap();

        fx.doc.pointer(EventKind::Click, &button, 12.0, 34.0).unwrap();
        fx.doc
            .pointer(EventKind::TouchStart, &button, 5.0, 6.0)
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                MouseInteractionRecord {
                    kind: MouseInteraction::Click,
                    id: fx.mirror.resolve_id(&button),
                    x: 12.0,
                    y: 34.0,
                },
                MouseInteractionRecord {
                    kind: MouseInteraction::TouchStart,
                    id: fx.mirror.resolve_id(&button),
                    x: 5.0,
                    y: 6.0,
                },
            ]
        );
        handle.dispose();
        assert_eq!(fx.doc.listener_count(), 0);
    }

    #[test]
    fn test_blocked_targets_and_empty_touches_are_skipped() {
        let fx = fixture(RecorderConfig::default());
        let blocked = attach(&fx, "div", &[("class", "rr-block")]);
        let open = attach(&fx, "div", &[]);
        let (cb, seen) = collect::<MouseInteractionRecord>();
        let handle = observe_mouse_interactions(&fx.ctx, cb).unwrap();

        fx.doc.pointer(EventKind::Click, &blocked, 1.0, 1.0).unwrap();
        fx.doc
            .dispatch(&HostEvent::new(EventKind::TouchEnd, open.clone()))
            .unwrap();
        assert!(seen.borrow().is_empty());

        fx.doc
            .dispatch(&HostEvent::new(EventKind::Focus, open.clone()))
            .unwrap();
        assert_eq!(seen.borrow()[0].kind, MouseInteraction::Focus);
        handle.dispose();
    }

    #[test]
    fn test_per_event_sampling_map() {
        let mut config = RecorderConfig::default();
        config.sampling.mouse_interaction = InteractionSampling::PerEvent(BTreeMap::from([
            (MouseInteraction::Click, false),
            (MouseInteraction::MouseUp, true),
        ]));
        let fx = fixture(config);
        let button = attach(&fx, "button", &[]);
        let (cb, seen) = collect::<MouseInteractionRecord>();
        let handle = observe_mouse_interactions(&fx.ctx, cb).unwrap();

        assert_eq!(fx.doc.listener_count(), MouseInteraction::ALL.len() - 1);
        fx.doc.pointer(EventKind::Click, &button, 0.0, 0.0).unwrap();
        fx.doc.pointer(EventKind::MouseUp, &button, 0.0, 0.0).unwrap();

        let kinds: Vec<MouseInteraction> = seen.borrow().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![MouseInteraction::MouseUp]);
        handle.dispose();
    }

    #[test]
    fn test_disabled_sampling_registers_nothing() {
        let mut config = RecorderConfig::default();
        config.sampling.mouse_interaction = InteractionSampling::Enabled(false);
        let fx = fixture(config);
        let (cb, _seen) = collect::<MouseInteractionRecord>();

        let handle = observe_mouse_interactions(&fx.ctx, cb).unwrap();
        assert_eq!(fx.doc.listener_count(), 0);
        handle.dispose();
    }
}
