//! Battery Knockdown - level/ball/battery state machine for a shooting minigame
//!
//! Core modules:
//! - `sim`: Tick-driven game core (registry, knockdown classifier, level controller, reset sequence)
//! - `config`: Data-driven game tuning loaded from TOML
//! - `sandbox`: In-memory scene + physics collaborator for headless runs and tests

pub mod config;
pub mod sandbox;
pub mod sim;

pub use config::{ConfigError, DiscoveryConfig, GameConfig};
pub use sim::GameCore;

use glam::Quat;

/// Game configuration constants
pub mod consts {
    /// Default simulation tick rate (120 Hz, fixed timestep)
    pub const DEFAULT_TICK_HZ: f32 = 120.0;
    /// Fixed simulation timestep at the default tick rate
    pub const SIM_DT: f32 = 1.0 / DEFAULT_TICK_HZ;

    /// Ball budget per level
    pub const DEFAULT_MAX_BALLS: u32 = 4;
    /// Additional batteries activated per level
    pub const DEFAULT_BATTERIES_PER_LEVEL: u32 = 2;

    /// Knockdown thresholds
    pub const DEFAULT_HEIGHT_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_DISPLACEMENT_THRESHOLD: f32 = 0.2;
    pub const DEFAULT_ROTATION_THRESHOLD_DEG: f32 = 30.0;

    /// Grace period between a round being decided and the board resetting
    pub const DEFAULT_RESET_DELAY_SECS: f32 = 2.0;
    /// Extra wait after teleporting batteries before physics resumes
    pub const DEFAULT_SETTLE_SECS: f32 = 0.05;

    /// Scene-name convention used by discovery
    pub const DEFAULT_BATTERY_NAME_PREFIX: &str = "Battery Interactable";
}

/// Convert a duration in seconds to a whole number of ticks (rounded up)
#[inline]
pub fn seconds_to_ticks(seconds: f32, tick_hz: f32) -> u32 {
    if seconds <= 0.0 || tick_hz <= 0.0 {
        return 0;
    }
    // Tolerance keeps float noise (0.05 * 120 = 6.0000005) from adding a tick
    (seconds * tick_hz - 1e-3).ceil().max(0.0) as u32
}

/// Angular distance between two rotations, in degrees [0, 180]
#[inline]
pub fn angle_between_degrees(a: Quat, b: Quat) -> f32 {
    // |dot| handles the q / -q double cover
    let dot = a.normalize().dot(b.normalize()).abs().min(1.0);
    (2.0 * dot.acos()).to_degrees()
}
