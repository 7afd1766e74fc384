//! Monotonic clock and deferred-task scheduling.
//!
//! All timing-gated behavior (throttle windows, movement flushes) goes through
//! a [`Scheduler`]. Two implementations are provided:
//!
//! - [`ManualScheduler`]: a virtual clock advanced explicitly. Used by tests
//!   and by scenario playback in virtual time.
//! - [`TokioScheduler`]: real time on a tokio `LocalSet`.

use crate::error::RecordResult;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// A deferred unit of work. Failures are reported by the scheduler that runs it.
pub type Task = Box<dyn FnOnce() -> RecordResult<()>>;

/// Shared scheduler reference used throughout the pipeline.
pub type SharedScheduler = Rc<dyn Scheduler>;

/// A monotonic clock that can run tasks after a delay.
pub trait Scheduler {
    /// Milliseconds since an arbitrary fixed origin.
    fn now(&self) -> f64;

    /// Run `task` once `delay` has elapsed, unless the returned handle is
    /// cancelled first.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Convert a duration to fractional milliseconds without rounding drift.
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Convert fractional milliseconds to a duration, clamping negatives to zero.
pub fn ms_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms.max(0.0) * 1_000_000.0).round() as u64)
}

/// Cancellation token for a scheduled task.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
    abort: Option<tokio::task::AbortHandle>,
}

impl TimerHandle {
    fn new(cancelled: Rc<Cell<bool>>) -> Self {
        Self {
            cancelled,
            abort: None,
        }
    }

    /// Prevent the task from running. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        if let Some(ref abort) = self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct PendingTask {
    deadline: f64,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    task: Task,
}

/// Virtual-time scheduler.
///
/// Time only moves when [`ManualScheduler::advance`] is called. Due tasks run
/// in deadline order (ties in scheduling order), with the clock set to each
/// task's deadline while it runs.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<f64>,
    seq: Cell<u64>,
    queue: RefCell<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Move the clock forward, running every task that falls due.
    ///
    /// Stops at the first failing task and returns its error; the clock is
    /// left at that task's deadline.
    pub fn advance(&self, by: Duration) -> RecordResult<()> {
        self.advance_ms(duration_ms(by))
    }

    /// Millisecond variant of [`ManualScheduler::advance`].
    pub fn advance_ms(&self, ms: f64) -> RecordResult<()> {
        let target = self.now.get() + ms;

        while let Some(pending) = self.pop_due(target) {
            self.now.set(pending.deadline);
            (pending.task)()?;
        }

        self.now.set(target);
        Ok(())
    }

    /// Number of scheduled tasks that have not run and are not cancelled.
    pub fn pending_count(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|pending| !pending.cancelled.get())
            .count()
    }

    fn pop_due(&self, target: f64) -> Option<PendingTask> {
        let mut queue = self.queue.borrow_mut();
        queue.retain(|pending| !pending.cancelled.get());

        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.deadline <= target)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(index, _)| index)?;

        Some(queue.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let seq = self.seq.get();
        self.seq.set(seq + 1);

        self.queue.borrow_mut().push(PendingTask {
            deadline: self.now.get() + duration_ms(delay),
            seq,
            cancelled: cancelled.clone(),
            task,
        });

        TimerHandle::new(cancelled)
    }
}

/// Real-time scheduler backed by tokio.
///
/// Tasks are spawned with `tokio::task::spawn_local`, so `schedule` must be
/// called from within a `LocalSet`. Task failures have no caller to return
/// to and are logged.
pub struct TokioScheduler {
    origin: tokio::time::Instant,
}

impl TokioScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            origin: tokio::time::Instant::now(),
        })
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();

        let join = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if flag.get() {
                return;
            }
            if let Err(e) = task() {
                tracing::error!("Deferred recording task failed: {e}");
            }
        });

        TimerHandle {
            cancelled,
            abort: Some(join.abort_handle()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;

    fn recorder(log: &Rc<RefCell<Vec<(u32, f64)>>>, scheduler: &Rc<ManualScheduler>, tag: u32) -> Task {
        let log = log.clone();
        let scheduler = scheduler.clone();
        Box::new(move || {
            log.borrow_mut().push((tag, scheduler.now()));
            Ok(())
        })
    }

    #[test]
    fn test_manual_scheduler_runs_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        scheduler.schedule(Duration::from_millis(300), recorder(&log, &scheduler, 1));
        scheduler.schedule(Duration::from_millis(100), recorder(&log, &scheduler, 2));
        scheduler.schedule(Duration::from_millis(100), recorder(&log, &scheduler, 3));

        scheduler.advance(Duration::from_millis(250)).unwrap();
        assert_eq!(*log.borrow(), vec![(2, 100.0), (3, 100.0)]);
        assert_eq!(scheduler.now(), 250.0);

        scheduler.advance(Duration::from_millis(100)).unwrap();
        assert_eq!(log.borrow().last(), Some(&(1, 300.0)));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handle = scheduler.schedule(Duration::from_millis(10), recorder(&log, &scheduler, 1));
        handle.cancel();
        handle.cancel();

        scheduler.advance(Duration::from_millis(20)).unwrap();
        assert!(log.borrow().is_empty());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_task_error_propagates_from_advance() {
        let scheduler = ManualScheduler::new();
        scheduler.schedule(
            Duration::from_millis(5),
            Box::new(|| Err(RecordError::Callback("boom".to_string()))),
        );

        let result = scheduler.advance(Duration::from_millis(10));
        assert_eq!(result, Err(RecordError::Callback("boom".to_string())));
        assert_eq!(scheduler.now(), 5.0);
    }

    #[test]
    fn test_tasks_scheduled_while_advancing_run_if_due() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_log = log.clone();
        let inner_scheduler = scheduler.clone();
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let task = recorder(&inner_log, &inner_scheduler, 2);
                inner_scheduler.schedule(Duration::from_millis(10), task);
                Ok(())
            }),
        );

        scheduler.advance(Duration::from_millis(30)).unwrap();
        assert_eq!(*log.borrow(), vec![(2, 20.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_and_cancels() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let fired = Rc::new(Cell::new(0));

                let counter = fired.clone();
                scheduler.schedule(
                    Duration::from_millis(50),
                    Box::new(move || {
                        counter.set(counter.get() + 1);
                        Ok(())
                    }),
                );

                let counter = fired.clone();
                let cancelled = scheduler.schedule(
                    Duration::from_millis(50),
                    Box::new(move || {
                        counter.set(counter.get() + 10);
                        Ok(())
                    }),
                );
                cancelled.cancel();

                tokio::time::sleep(Duration::from_millis(100)).await;
                assert_eq!(fired.get(), 1);
                assert!(scheduler.now() >= 100.0);
            })
            .await;
    }
}
