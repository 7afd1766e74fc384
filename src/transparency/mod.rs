//! Transparency module for the interaction recorder.
//!
//! This module tracks and exposes what the recorder has produced,
//! supporting operator trust and auditing.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
