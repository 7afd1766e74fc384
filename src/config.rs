//! Configuration for the interaction recorder.

use crate::policy::MaskInputOptions;
use crate::record::MouseInteraction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default scroll throttle, in milliseconds.
pub const DEFAULT_SCROLL_MS: u64 = 100;

/// Default movement batch flush window, in milliseconds.
pub const DEFAULT_MOVEMENT_FLUSH_MS: u64 = 500;

/// Viewport resize notifications are throttled to this window.
pub const VIEWPORT_RESIZE_THROTTLE: Duration = Duration::from_millis(200);

/// Main configuration for a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Class marking subtrees that must not be recorded
    pub block_class: String,

    /// Class marking form controls whose input is ignored
    pub ignore_class: String,

    /// Tag names and input types whose values are masked
    pub mask_inputs: MaskInputOptions,

    /// Per-category sampling policy
    pub sampling: SamplingConfig,

    /// Movement batch flush window (in milliseconds)
    pub movement_flush_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            block_class: "rr-block".to_string(),
            ignore_class: "rr-ignore".to_string(),
            mask_inputs: MaskInputOptions::new(["password"]),
            sampling: SamplingConfig::default(),
            movement_flush_ms: DEFAULT_MOVEMENT_FLUSH_MS,
        }
    }
}

impl RecorderConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RecorderConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("interaction-recorder")
            .join("config.json")
    }

    pub fn movement_flush(&self) -> Duration {
        Duration::from_millis(self.movement_flush_ms)
    }
}

/// Per-category sampling policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingConfig {
    /// `false` disables movement capture; a number throttles samples to one
    /// per interval, `true` keeps every sample
    pub mousemove: MovementSampling,

    /// `false` disables interactions; a map disables individual ones
    pub mouse_interaction: InteractionSampling,

    /// Scroll throttle (in milliseconds)
    pub scroll: u64,

    /// Which input notifications to listen to
    pub input: InputSampling,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mousemove: MovementSampling::Enabled(true),
            mouse_interaction: InteractionSampling::Enabled(true),
            scroll: DEFAULT_SCROLL_MS,
            input: InputSampling::All,
        }
    }
}

impl SamplingConfig {
    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovementSampling {
    Enabled(bool),
    /// Throttle interval in milliseconds
    Interval(u64),
}

impl MovementSampling {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, MovementSampling::Enabled(false))
    }

    /// Per-sample throttle interval. Only an explicit interval sets one.
    pub fn interval(&self) -> Option<Duration> {
        match *self {
            MovementSampling::Interval(ms) => Some(Duration::from_millis(ms)),
            MovementSampling::Enabled(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InteractionSampling {
    Enabled(bool),
    /// Interactions mapped to `false` are not captured
    PerEvent(BTreeMap<MouseInteraction, bool>),
}

impl InteractionSampling {
    pub fn is_enabled(&self, interaction: MouseInteraction) -> bool {
        match self {
            InteractionSampling::Enabled(enabled) => *enabled,
            InteractionSampling::PerEvent(map) => map.get(&interaction) != Some(&false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSampling {
    /// Per-keystroke `input` and end-of-edit `change`
    #[default]
    All,
    /// End-of-edit `change` only
    Last,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
