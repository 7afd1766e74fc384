//! Host notifications and the listener registry.

use crate::core::handle::ListenerHandle;
use crate::error::RecordResult;
use crate::host::node::NodeRef;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Notification types the host can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseMove,
    TouchMove,
    MouseUp,
    MouseDown,
    Click,
    ContextMenu,
    DblClick,
    Focus,
    Blur,
    TouchStart,
    TouchEnd,
    Scroll,
    Resize,
    Input,
    Change,
    Play,
    Pause,
}

impl EventKind {
    pub fn is_touch(self) -> bool {
        matches!(
            self,
            EventKind::TouchMove | EventKind::TouchStart | EventKind::TouchEnd
        )
    }
}

/// Viewport-relative pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A single host notification.
#[derive(Debug, Clone)]
pub struct HostEvent {
    pub kind: EventKind,
    pub target: NodeRef,
    /// Pointer coordinates for mouse events.
    pub point: Option<Point>,
    /// Touch points that changed, for touch events.
    pub changed_touches: Vec<Point>,
}

impl HostEvent {
    pub fn new(kind: EventKind, target: NodeRef) -> Self {
        Self {
            kind,
            target,
            point: None,
            changed_touches: Vec::new(),
        }
    }

    /// A pointer notification at `(x, y)`; touch kinds carry the point as
    /// their first changed touch.
    pub fn pointer(kind: EventKind, target: NodeRef, x: f64, y: f64) -> Self {
        let point = Point { x, y };
        let mut event = Self::new(kind, target);
        if kind.is_touch() {
            event.changed_touches.push(point);
        } else {
            event.point = Some(point);
        }
        event
    }

    pub fn is_touch(&self) -> bool {
        self.kind.is_touch()
    }

    /// Coordinates of the mouse, or of the first changed touch.
    pub fn client_point(&self) -> Option<Point> {
        if self.is_touch() {
            self.changed_touches.first().copied()
        } else {
            self.point
        }
    }
}

/// Callback registered for one kind of notification.
pub type EventHandler = Rc<dyn Fn(&HostEvent) -> RecordResult<()>>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, EventKind, EventHandler)>>,
}

impl ListenerRegistry {
    pub(crate) fn add(self: &Rc<Self>, kind: EventKind, handler: EventHandler) -> ListenerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, kind, handler));

        let registry = Rc::downgrade(self);
        ListenerHandle::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.entries.borrow_mut().retain(|(entry, _, _)| *entry != id);
            }
        })
    }

    /// Deliver to every handler registered for the event's kind.
    ///
    /// Handlers are snapshotted first so they may add or remove listeners.
    pub(crate) fn dispatch(&self, event: &HostEvent) -> RecordResult<()> {
        let handlers: Vec<EventHandler> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(event)?;
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}
