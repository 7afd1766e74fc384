//! Error types for the recording pipeline.

use thiserror::Error;

/// Errors raised while recording.
///
/// Nothing in the pipeline retries: host failures, hook failures and sink
/// failures all surface to whoever dispatched the notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Index {index} is out of range for a rule list of length {len}")]
    IndexSize { index: usize, len: usize },

    #[error("Property {0} is not configurable")]
    NotConfigurable(String),

    #[error("Recording sink is closed")]
    SinkClosed,

    #[error("Recorder is already running")]
    AlreadyRunning,

    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

/// Result type for recording operations.
pub type RecordResult<T> = Result<T, RecordError>;
