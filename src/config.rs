//! Game tuning and discovery settings
//!
//! Loaded from a TOML file; every field falls back to its default when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::seconds_to_ticks;

/// Errors produced while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How scene discovery locates battery nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Substring a node name must contain to count as a battery
    pub name_prefix: String,
    /// Name of the node whose children are the batteries (skips auto-detection)
    pub parent_override: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_BATTERY_NAME_PREFIX.to_string(),
            parent_override: None,
        }
    }
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Balls & levels ===
    /// Shots available per round
    pub max_balls: u32,
    /// Batteries added per level (level N activates N * this, clamped)
    pub batteries_per_level: u32,

    // === Knockdown ===
    /// Drop below the initial height that counts as fallen
    pub height_threshold: f32,
    /// Straight-line displacement that counts as disorganised
    pub displacement_threshold: f32,
    /// Rotation (degrees) that counts as tipped over
    pub rotation_threshold_degrees: f32,

    // === Timing ===
    /// Grace period after a round is decided, before the board resets
    pub reset_delay_seconds: f32,
    /// Wait after teleporting batteries before physics is re-enabled
    pub settle_seconds: f32,
    /// Simulation ticks per second
    pub tick_hz: f32,

    /// Scene discovery
    pub discovery: DiscoveryConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_balls: DEFAULT_MAX_BALLS,
            batteries_per_level: DEFAULT_BATTERIES_PER_LEVEL,

            height_threshold: DEFAULT_HEIGHT_THRESHOLD,
            displacement_threshold: DEFAULT_DISPLACEMENT_THRESHOLD,
            rotation_threshold_degrees: DEFAULT_ROTATION_THRESHOLD_DEG,

            reset_delay_seconds: DEFAULT_RESET_DELAY_SECS,
            settle_seconds: DEFAULT_SETTLE_SECS,
            tick_hz: DEFAULT_TICK_HZ,

            discovery: DiscoveryConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    /// Reject values the state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_balls == 0 {
            return Err(ConfigError::Invalid("max_balls must be at least 1".into()));
        }
        if self.batteries_per_level == 0 {
            return Err(ConfigError::Invalid(
                "batteries_per_level must be at least 1".into(),
            ));
        }
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_hz must be positive, got {}",
                self.tick_hz
            )));
        }

        let non_negative = [
            ("height_threshold", self.height_threshold),
            ("displacement_threshold", self.displacement_threshold),
            ("rotation_threshold_degrees", self.rotation_threshold_degrees),
            ("reset_delay_seconds", self.reset_delay_seconds),
            ("settle_seconds", self.settle_seconds),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.discovery.name_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.name_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolving grace period in ticks
    pub fn reset_delay_ticks(&self) -> u32 {
        seconds_to_ticks(self.reset_delay_seconds, self.tick_hz)
    }

    /// Settle wait in ticks (not counting the mandatory first tick)
    pub fn settle_ticks(&self) -> u32 {
        seconds_to_ticks(self.settle_seconds, self.tick_hz)
    }

    /// Fixed timestep implied by `tick_hz`
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz
    }
}
