//! Channel-backed recording sink.
//!
//! Records are wrapped in an [`Envelope`] carrying the session id and wall
//! clock time, then sent on a bounded channel. A consumer (a writer thread,
//! an uploader) drains the receiving end at its own pace.

use crate::core::hooks::Callbacks;
use crate::error::{RecordError, RecordResult};
use crate::record::RecordedEvent;
use crate::transparency::SharedTransparencyLog;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A record as delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: RecordedEvent,
}

pub struct ChannelSink {
    session_id: Uuid,
    sender: Sender<Envelope>,
    log: Option<SharedTransparencyLog>,
}

impl ChannelSink {
    /// Create a sink for a new session, returning the consumer's end.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Envelope>) {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(capacity);
        let sink = Self {
            session_id: Uuid::new_v4(),
            sender,
            log: None,
        };
        (sink, receiver)
    }

    /// Count dropped records in `log`.
    pub fn with_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Send one record.
    ///
    /// When the channel is full the record is dropped with a warning so the
    /// host is never blocked; a disconnected consumer is an error.
    pub fn send(&self, event: RecordedEvent) -> RecordResult<()> {
        let envelope = Envelope {
            session_id: self.session_id,
            timestamp: Utc::now(),
            event,
        };
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(envelope)) => {
                tracing::warn!(
                    category = envelope.event.category(),
                    "Sink channel full, dropping record"
                );
                if let Some(ref log) = self.log {
                    log.record_dropped();
                }
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(RecordError::SinkClosed),
        }
    }

    /// Primary callbacks that send every category on this sink.
    pub fn callbacks(self: &Rc<Self>) -> Callbacks {
        let sink = Rc::clone(self);
        Callbacks::from_fn(move |event| sink.send(event))
    }
}
