//! Pointer movement batching.

use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::core::throttle::{throttle, ThrottleOptions, Throttled};
use crate::core::timer::SharedScheduler;
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent};
use crate::observer::ObserverContext;
use crate::record::{MovementBatch, MovementSource, NodeId, Position};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Accumulates timestamped positions between flushes.
///
/// While pending, each sample's `time_offset` is measured from the batch
/// baseline (the first sample). On [`drain`](Self::drain) offsets are
/// rewritten relative to the flush instant, so every drained offset is <= 0
/// and says how long before the flush the sample was taken.
pub struct PositionBatcher {
    scheduler: SharedScheduler,
    positions: RefCell<Vec<Position>>,
    baseline: Cell<Option<f64>>,
}

impl PositionBatcher {
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            scheduler,
            positions: RefCell::new(Vec::new()),
            baseline: Cell::new(None),
        }
    }

    pub fn push(&self, x: f64, y: f64, id: NodeId) {
        let now = self.scheduler.now();
        let baseline = match self.baseline.get() {
            Some(baseline) => baseline,
            None => {
                self.baseline.set(Some(now));
                now
            }
        };
        self.positions.borrow_mut().push(Position {
            x,
            y,
            id,
            time_offset: now - baseline,
        });
    }

    /// Take every pending position, renormalized to the current instant,
    /// and reset the baseline.
    pub fn drain(&self) -> Vec<Position> {
        let now = self.scheduler.now();
        let total_offset = self.baseline.take().map_or(0.0, |baseline| now - baseline);

        let mut positions = std::mem::take(&mut *self.positions.borrow_mut());
        for position in &mut positions {
            position.time_offset -= total_offset;
        }
        positions
    }

    pub fn len(&self) -> usize {
        self.positions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.positions.borrow_mut().clear();
        self.baseline.set(None);
    }
}

/// Collect pointer and touch movement and deliver it in periodic batches.
///
/// Every notification is kept unless an explicit sampling interval is
/// configured, in which case samples are throttled (leading edge only) to
/// one per interval. Batches flush on the trailing edge of the flush window,
/// at most once per window. A batch is tagged with the source of its latest
/// sample, so a window mixing touch and mouse input is reported under
/// whichever kind arrived last. With movement sampling disabled nothing is
/// registered.
pub fn observe_movement(
    ctx: &Rc<ObserverContext>,
    cb: Callback<MovementBatch>,
) -> RecordResult<ListenerHandle> {
    if !ctx.config.sampling.mousemove.is_enabled() {
        tracing::debug!("Movement sampling disabled");
        return Ok(ListenerHandle::noop());
    }

    let batcher = Rc::new(PositionBatcher::new(ctx.scheduler.clone()));

    let flush = {
        let batcher = batcher.clone();
        throttle(
            move |source: MovementSource| {
                let positions = batcher.drain();
                if positions.is_empty() {
                    return Ok(());
                }
                cb(&MovementBatch { positions, source })
            },
            ctx.config.movement_flush(),
            ThrottleOptions::trailing_only(),
            ctx.scheduler.clone(),
        )
    };

    let record: Rc<dyn Fn(HostEvent) -> RecordResult<()>> = {
        let batcher = batcher.clone();
        let flush = flush.clone();
        let recorder = ctx.clone();
        Rc::new(move |event: HostEvent| {
            let Some(point) = event.client_point() else {
                return Ok(());
            };
            batcher.push(point.x, point.y, recorder.resolve_id(&event.target));
            flush.call(if event.is_touch() {
                MovementSource::TouchMove
            } else {
                MovementSource::MouseMove
            })
        })
    };

    let sampler: Option<Throttled<HostEvent>> =
        ctx.config.sampling.mousemove.interval().map(|interval| {
            let record = record.clone();
            throttle(
                move |event: HostEvent| record(event),
                interval,
                ThrottleOptions::leading_only(),
                ctx.scheduler.clone(),
            )
        });

    let mut handles = Vec::new();
    for kind in [EventKind::MouseMove, EventKind::TouchMove] {
        let record = record.clone();
        let sampler = sampler.clone();
        let handler: EventHandler = Rc::new(move |event: &HostEvent| match sampler {
            Some(ref sampler) => sampler.call(event.clone()),
            None => record(event.clone()),
        });
        handles.push(ctx.doc.add_event_listener(kind, handler));
    }
    handles.push(ListenerHandle::new(move || {
        if let Some(ref sampler) = sampler {
            sampler.cancel();
        }
        flush.cancel();
        batcher.clear();
    }));

    Ok(ListenerHandle::combine(handles))
}
