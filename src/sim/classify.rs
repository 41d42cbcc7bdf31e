//! Knockdown classification
//!
//! A battery counts as knocked down when its sampled pose has drifted past any
//! one of three tolerances from its registration pose. The check is a pure OR;
//! stickiness is applied by the caller.

use serde::{Deserialize, Serialize};

use super::pose::Pose;
use crate::config::GameConfig;

/// Tolerances used by [`classify`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnockdownThresholds {
    pub height: f32,
    pub rotation_degrees: f32,
    pub displacement: f32,
}

impl KnockdownThresholds {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            height: config.height_threshold,
            rotation_degrees: config.rotation_threshold_degrees,
            displacement: config.displacement_threshold,
        }
    }
}

impl Default for KnockdownThresholds {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Which check tripped first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnockdownReason {
    /// Fell below its starting height
    HeightDrop,
    /// Tipped past the rotation tolerance
    Rotation,
    /// Slid or was pushed away from its spot
    Displacement,
}

/// Classify a pose against its baseline. `None` means still standing.
pub fn classify(
    initial: &Pose,
    current: &Pose,
    thresholds: &KnockdownThresholds,
) -> Option<KnockdownReason> {
    if current.height_drop_from(initial) > thresholds.height {
        return Some(KnockdownReason::HeightDrop);
    }
    if current.angle_to_degrees(initial) > thresholds.rotation_degrees {
        return Some(KnockdownReason::Rotation);
    }
    if current.distance_to(initial) > thresholds.displacement {
        return Some(KnockdownReason::Displacement);
    }
    None
}
