//! Leading/trailing call throttling.

use crate::core::timer::{duration_ms, ms_duration, SharedScheduler, TimerHandle};
use crate::error::RecordResult;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Which edges of a throttle window invoke the wrapped function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOptions {
    /// Fire immediately on the first call of a window.
    pub leading: bool,
    /// Fire once the window elapses, with the last call's arguments.
    pub trailing: bool,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            leading: true,
            trailing: true,
        }
    }
}

impl ThrottleOptions {
    pub fn leading_only() -> Self {
        Self {
            leading: true,
            trailing: false,
        }
    }

    pub fn trailing_only() -> Self {
        Self {
            leading: false,
            trailing: true,
        }
    }
}

struct ThrottleState<A> {
    func: Box<dyn Fn(A) -> RecordResult<()>>,
    wait_ms: f64,
    options: ThrottleOptions,
    scheduler: SharedScheduler,
    /// Start of the current window; `None` means no window is open.
    previous: Cell<Option<f64>>,
    timer: RefCell<Option<TimerHandle>>,
    pending: RefCell<Option<A>>,
}

/// A throttled wrapper around a function taking `A`.
///
/// Within one window at most two invocations happen: a leading one with the
/// first call's arguments and a trailing one with the last call's arguments.
/// Every other call is swallowed. Cloning shares the same window state.
pub struct Throttled<A> {
    state: Rc<ThrottleState<A>>,
}

impl<A> Clone for Throttled<A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

/// Wrap `func` so that it runs at most once per `wait` on each enabled edge.
pub fn throttle<A: 'static>(
    func: impl Fn(A) -> RecordResult<()> + 'static,
    wait: Duration,
    options: ThrottleOptions,
    scheduler: SharedScheduler,
) -> Throttled<A> {
    Throttled {
        state: Rc::new(ThrottleState {
            func: Box::new(func),
            wait_ms: duration_ms(wait),
            options,
            scheduler,
            previous: Cell::new(None),
            timer: RefCell::new(None),
            pending: RefCell::new(None),
        }),
    }
}

impl<A: 'static> Throttled<A> {
    /// Submit a call. Returns the wrapped function's result when it runs
    /// synchronously (leading edge), `Ok(())` otherwise.
    pub fn call(&self, args: A) -> RecordResult<()> {
        let state = &self.state;
        let now = state.scheduler.now();

        if state.previous.get().is_none() && !state.options.leading {
            state.previous.set(Some(now));
        }

        let remaining = match state.previous.get() {
            Some(previous) => state.wait_ms - (now - previous),
            None => 0.0,
        };

        // `remaining > wait` means the clock went backwards; treat it as a new window.
        if remaining <= 0.0 || remaining > state.wait_ms {
            if let Some(timer) = state.timer.borrow_mut().take() {
                timer.cancel();
            }
            state.pending.borrow_mut().take();
            state.previous.set(Some(now));
            return (state.func)(args);
        }

        if state.options.trailing {
            *state.pending.borrow_mut() = Some(args);

            if state.timer.borrow().is_none() {
                let weak = Rc::downgrade(state);
                let delay = ms_duration(remaining);
                let timer = state
                    .scheduler
                    .schedule(delay, Box::new(move || fire_trailing(&weak)));
                *state.timer.borrow_mut() = Some(timer);
            }
        }

        Ok(())
    }

    /// Drop any pending trailing call and reset the window.
    pub fn cancel(&self) {
        if let Some(timer) = self.state.timer.borrow_mut().take() {
            timer.cancel();
        }
        self.state.pending.borrow_mut().take();
        self.state.previous.set(None);
    }

    /// Whether a trailing invocation is currently scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.timer.borrow().is_some()
    }
}

fn fire_trailing<A>(weak: &Weak<ThrottleState<A>>) -> RecordResult<()> {
    let Some(state) = weak.upgrade() else {
        return Ok(());
    };

    state.previous.set(if state.options.leading {
        Some(state.scheduler.now())
    } else {
        None
    });
    state.timer.borrow_mut().take();

    let args = state.pending.borrow_mut().take();
    match args {
        Some(args) => (state.func)(args),
        None => Ok(()),
    }
}
