//! Viewport resize tracking.

use crate::config::VIEWPORT_RESIZE_THROTTLE;
use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::core::throttle::{throttle, ThrottleOptions};
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent};
use crate::observer::ObserverContext;
use crate::record::ViewportDimensions;
use std::cell::Cell;
use std::rc::Rc;

/// Record viewport dimensions whenever they actually change.
pub fn observe_viewport_resize(
    ctx: &Rc<ObserverContext>,
    cb: Callback<ViewportDimensions>,
) -> RecordResult<ListenerHandle> {
    let last: Cell<Option<(u32, u32)>> = Cell::new(None);
    let observer = ctx.clone();
    let updater = throttle(
        move |_: ()| {
            let (width, height) = observer.doc.viewport();
            if last.get() == Some((width, height)) {
                return Ok(());
            }
            last.set(Some((width, height)));
            cb(&ViewportDimensions { width, height })
        },
        VIEWPORT_RESIZE_THROTTLE,
        ThrottleOptions::default(),
        ctx.scheduler.clone(),
    );

    let listener = updater.clone();
    let handler: EventHandler = Rc::new(move |_: &HostEvent| listener.call(()));
    let registration = ctx.doc.add_event_listener(EventKind::Resize, handler);

    Ok(ListenerHandle::new(move || {
        registration.dispose();
        updater.cancel();
    }))
}
