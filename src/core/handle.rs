//! Idempotent disposers for registered observation sources.

use std::cell::Cell;
use std::fmt;

/// An opaque, no-argument disposer.
///
/// Calling [`ListenerHandle::dispose`] runs the teardown at most once; every
/// later call is a no-op. Dropping a handle does *not* dispose it.
pub struct ListenerHandle {
    dispose: Cell<Option<Box<dyn FnOnce()>>>,
}

impl ListenerHandle {
    /// Wrap a teardown closure.
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Cell::new(Some(Box::new(dispose))),
        }
    }

    /// A handle with nothing to tear down.
    pub fn noop() -> Self {
        Self {
            dispose: Cell::new(None),
        }
    }

    /// Combine several handles into one that disposes each of them once.
    pub fn combine(handles: Vec<ListenerHandle>) -> Self {
        Self::new(move || {
            for handle in &handles {
                handle.dispose();
            }
        })
    }

    /// Run the teardown if it has not run yet.
    pub fn dispose(&self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    /// Whether the teardown has already run (or there never was one).
    pub fn is_disposed(&self) -> bool {
        let dispose = self.dispose.take();
        let disposed = dispose.is_none();
        self.dispose.set(dispose);
        disposed
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_dispose_runs_once() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let handle = ListenerHandle::new(move || counter.set(counter.get() + 1));

        assert!(!handle.is_disposed());
        handle.dispose();
        handle.dispose();

        assert_eq!(count.get(), 1);
        assert!(handle.is_disposed());
    }

    #[test]
    fn test_combined_disposes_every_handle() {
        let count = Rc::new(Cell::new(0));
        let handles = (0..3)
            .map(|_| {
                let counter = count.clone();
                ListenerHandle::new(move || counter.set(counter.get() + 1))
            })
            .collect();

        let combined = ListenerHandle::combine(handles);
        combined.dispose();
        combined.dispose();

        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_noop_handle() {
        let handle = ListenerHandle::noop();
        assert!(handle.is_disposed());
        handle.dispose();
    }
}
