//! Interaction Recorder - normalize interface change notifications into
//! replayable records.
//!
//! The recorder watches a document for structural changes, pointer movement,
//! discrete interactions, scrolling, viewport resizes, form input, media
//! playback and stylesheet rule edits, and turns each into a typed
//! [`RecordedEvent`] delivered to caller-supplied callbacks.
//!
//! # Guarantees
//!
//! - **Throttled**: high-frequency sources are rate limited and movement is
//!   batched, with offsets relative to the flush instant
//! - **Deduplicated**: an input value is only reported when it changes
//! - **Private**: password fields are never recorded and configured types
//!   are masked
//! - **Reversible**: teardown restores every listener, setter and stylesheet
//!   method it replaced, and is idempotent
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Interaction Recorder                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Host     │──▶│  Observers  │──▶│ Hook chain  │       │
//! │  │ (document)  │   │ (throttled) │   │ (callbacks) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │  Policies   │   │    Sink     │       │
//! │                    │ (ids, mask) │   │  (channel)  │       │
//! │                    └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use interaction_recorder::{
//!     core::ManualScheduler, Callbacks, Document, Recorder, RecorderConfig,
//! };
//!
//! let doc = Document::new();
//! let callbacks = Callbacks::from_fn(|event| {
//!     println!("{}", event.category());
//!     Ok(())
//! });
//!
//! let recorder = Recorder::new(doc, ManualScheduler::new(), RecorderConfig::default(), callbacks);
//! recorder.start().expect("Failed to start recorder");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod observer;
pub mod policy;
pub mod record;
pub mod recorder;
pub mod scenario;
pub mod sink;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{RecorderConfig, SamplingConfig};
pub use core::{Callbacks, HookSet, ListenerHandle};
pub use error::{RecordError, RecordResult};
pub use host::Document;
pub use observer::{init_observers, ObserverContext};
pub use record::{NodeId, RecordedEvent, MISSING_ID};
pub use recorder::Recorder;
pub use sink::{ChannelSink, Envelope};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
