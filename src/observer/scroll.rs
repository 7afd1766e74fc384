//! Scroll position tracking.

use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::core::throttle::{throttle, ThrottleOptions};
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent};
use crate::observer::ObserverContext;
use crate::record::ScrollPosition;
use std::rc::Rc;

/// Record scroll offsets, throttled at the configured scroll interval.
///
/// A scroll on the document itself reports the scrolling element's offsets
/// against the document's id.
pub fn observe_scroll(
    ctx: &Rc<ObserverContext>,
    cb: Callback<ScrollPosition>,
) -> RecordResult<ListenerHandle> {
    let observer = ctx.clone();
    let updater = throttle(
        move |event: HostEvent| {
            let target = &event.target;
            if observer.is_blocked(target) {
                return Ok(());
            }
            let (x, y) = if target.is_document() {
                observer.doc.scrolling_element().scroll_offset()
            } else {
                target.scroll_offset()
            };
            cb(&ScrollPosition {
                id: observer.resolve_id(target),
                x,
                y,
            })
        },
        ctx.config.sampling.scroll_interval(),
        ThrottleOptions::default(),
        ctx.scheduler.clone(),
    );

    let listener = updater.clone();
    let handler: EventHandler = Rc::new(move |event: &HostEvent| listener.call(event.clone()));
    let registration = ctx.doc.add_event_listener(EventKind::Scroll, handler);

    Ok(ListenerHandle::new(move || {
        registration.dispose();
        updater.cancel();
    }))
}
