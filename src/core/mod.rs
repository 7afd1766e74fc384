//! Core primitives of the normalization pipeline.
//!
//! This module contains:
//! - Deferred scheduling against a monotonic clock
//! - Leading/trailing throttling
//! - The weak-keyed last-value cache
//! - Sink callbacks and hook composition
//! - Setter interception
//! - Idempotent listener handles

pub mod dedup;
pub mod handle;
pub mod hooks;
pub mod intercept;
pub mod throttle;
pub mod timer;

// Re-export commonly used types
pub use dedup::DedupCache;
pub use handle::ListenerHandle;
pub use hooks::{chain, merge_hooks, Callback, Callbacks, HookSet};
pub use intercept::{hook_setter, AfterSet};
pub use throttle::{throttle, ThrottleOptions, Throttled};
pub use timer::{ManualScheduler, Scheduler, SharedScheduler, TimerHandle, TokioScheduler};
