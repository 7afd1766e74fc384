//! Recording transparency log.
//!
//! Counts what the recorder has produced, per category, without keeping any
//! record content. Attach it to a recorder through [`TransparencyLog::hooks`].
//!
//! Unlike the rest of the crate the log is `Send + Sync`: counters are atomic
//! and the log is shared through `Arc`, so a thread other than the recording
//! thread (a writer, a status reporter) can read stats while records flow.

use crate::core::hooks::HookSet;
use crate::record::RecordedEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Record statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Structural change batches
    mutation_batches: AtomicU64,
    /// Movement batches flushed
    movement_batches: AtomicU64,
    /// Pointer samples inside those batches
    movement_positions: AtomicU64,
    mouse_interactions: AtomicU64,
    scrolls: AtomicU64,
    viewport_resizes: AtomicU64,
    inputs: AtomicU64,
    media_interactions: AtomicU64,
    style_sheet_rules: AtomicU64,
    /// Records the sink could not accept
    records_dropped: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            mutation_batches: AtomicU64::new(0),
            movement_batches: AtomicU64::new(0),
            movement_positions: AtomicU64::new(0),
            mouse_interactions: AtomicU64::new(0),
            scrolls: AtomicU64::new(0),
            viewport_resizes: AtomicU64::new(0),
            inputs: AtomicU64::new(0),
            media_interactions: AtomicU64::new(0),
            style_sheet_rules: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    /// Count one record.
    pub fn record(&self, event: &RecordedEvent) {
        let counter = match event {
            RecordedEvent::Mutation(_) => &self.mutation_batches,
            RecordedEvent::MouseMove(batch) => {
                self.movement_positions
                    .fetch_add(batch.positions.len() as u64, Ordering::Relaxed);
                &self.movement_batches
            }
            RecordedEvent::MouseInteraction(_) => &self.mouse_interactions,
            RecordedEvent::Scroll(_) => &self.scrolls,
            RecordedEvent::ViewportResize(_) => &self.viewport_resizes,
            RecordedEvent::Input(_) => &self.inputs,
            RecordedEvent::MediaInteraction(_) => &self.media_interactions,
            RecordedEvent::StyleSheetRule(_) => &self.style_sheet_rules,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a record the sink dropped.
    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Hooks that count every record a recorder emits.
    pub fn hooks(self: &Arc<Self>) -> HookSet {
        let log = Arc::clone(self);
        HookSet::from_fn(move |event| {
            log.record(&event);
            Ok(())
        })
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            mutation_batches: self.mutation_batches.load(Ordering::Relaxed),
            movement_batches: self.movement_batches.load(Ordering::Relaxed),
            movement_positions: self.movement_positions.load(Ordering::Relaxed),
            mouse_interactions: self.mouse_interactions.load(Ordering::Relaxed),
            scrolls: self.scrolls.load(Ordering::Relaxed),
            viewport_resizes: self.viewport_resizes.load(Ordering::Relaxed),
            inputs: self.inputs.load(Ordering::Relaxed),
            media_interactions: self.media_interactions.load(Ordering::Relaxed),
            style_sheet_rules: self.style_sheet_rules.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Mutation batches: {}\n\
             - Movement batches: {} ({} samples)\n\
             - Mouse interactions: {}\n\
             - Scroll records: {}\n\
             - Viewport resizes: {}\n\
             - Input records: {}\n\
             - Media interactions: {}\n\
             - Stylesheet rule changes: {}\n\
             - Records dropped: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Masked input values are never recorded in clear\n\
             - Password fields are never recorded\n\
             - Blocked subtrees are never recorded",
            stats.mutation_batches,
            stats.movement_batches,
            stats.movement_positions,
            stats.mouse_interactions,
            stats.scrolls,
            stats.viewport_resizes,
            stats.inputs,
            stats.media_interactions,
            stats.style_sheet_rules,
            stats.records_dropped,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                counts: stats.counts(),
                records_dropped: stats.records_dropped,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                for (counter, value) in self.counters().into_iter().zip(persisted.counts) {
                    counter.store(value, Ordering::Relaxed);
                }
                self.records_dropped
                    .store(persisted.records_dropped, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
        self.records_dropped.store(0, Ordering::Relaxed);
    }

    /// Per-category counters, in [`TransparencyStats::counts`] order.
    fn counters(&self) -> [&AtomicU64; 9] {
        [
            &self.mutation_batches,
            &self.movement_batches,
            &self.movement_positions,
            &self.mouse_interactions,
            &self.scrolls,
            &self.viewport_resizes,
            &self.inputs,
            &self.media_interactions,
            &self.style_sheet_rules,
        ]
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub mutation_batches: u64,
    pub movement_batches: u64,
    pub movement_positions: u64,
    pub mouse_interactions: u64,
    pub scrolls: u64,
    pub viewport_resizes: u64,
    pub inputs: u64,
    pub media_interactions: u64,
    pub style_sheet_rules: u64,
    pub records_dropped: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl TransparencyStats {
    fn counts(&self) -> [u64; 9] {
        [
            self.mutation_batches,
            self.movement_batches,
            self.movement_positions,
            self.mouse_interactions,
            self.scrolls,
            self.viewport_resizes,
            self.inputs,
            self.media_interactions,
            self.style_sheet_rules,
        ]
    }

    /// Records delivered across all categories (movement counted per batch).
    pub fn total_records(&self) -> u64 {
        self.mutation_batches
            + self.movement_batches
            + self.mouse_interactions
            + self.scrolls
            + self.viewport_resizes
            + self.inputs
            + self.media_interactions
            + self.style_sheet_rules
    }
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    counts: [u64; 9],
    records_dropped: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        MediaInteraction, MediaInteractionRecord, MovementBatch, MovementSource, Position,
        ScrollPosition,
    };

    fn movement(samples: usize) -> RecordedEvent {
        RecordedEvent::MouseMove(MovementBatch {
            positions: (0..samples)
                .map(|i| Position {
                    x: i as f64,
                    y: 0.0,
                    id: 1,
                    time_offset: -(i as f64),
                })
                .collect(),
            source: MovementSource::MouseMove,
        })
    }

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record(&movement(3));
        log.record(&RecordedEvent::Scroll(ScrollPosition {
            id: 1,
            x: 0.0,
            y: 5.0,
        }));
        log.record(&RecordedEvent::Scroll(ScrollPosition {
            id: 1,
            x: 0.0,
            y: 9.0,
        }));

        let stats = log.stats();
        assert_eq!(stats.movement_batches, 1);
        assert_eq!(stats.movement_positions, 3);
        assert_eq!(stats.scrolls, 2);
        assert_eq!(stats.total_records(), 3);
    }

    #[test]
    fn test_hooks_count_records() {
        let log = create_shared_log();
        let hooks = log.hooks();

        let play = MediaInteractionRecord {
            kind: MediaInteraction::Play,
            id: 4,
        };
        hooks.media_interaction.as_ref().unwrap()(&play).unwrap();
        assert_eq!(log.stats().media_interactions, 1);
    }

    #[test]
    fn test_stats_readable_from_another_thread() {
        let log = create_shared_log();
        log.record(&movement(2));
        log.record_dropped();

        let reader = log.clone();
        let stats = std::thread::spawn(move || reader.stats())
            .join()
            .unwrap();
        assert_eq!(stats.movement_positions, 2);
        assert_eq!(stats.records_dropped, 1);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record(&movement(10));
        log.record_dropped();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.movement_batches, 0);
        assert_eq!(stats.movement_positions, 0);
        assert_eq!(stats.records_dropped, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record(&movement(2));
        log.record_dropped();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path);
        let stats = reloaded.stats();
        assert_eq!(stats.movement_batches, 1);
        assert_eq!(stats.movement_positions, 2);
        assert_eq!(stats.records_dropped, 1);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Movement batches"));
        assert!(summary.contains("Input records"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("Password fields are never recorded"));
    }
}
