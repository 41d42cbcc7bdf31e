//! Rigid transform of a battery in world space
//!
//! A pose is position + rotation + scale, the same triple the scene stores
//! for every node. Batteries capture one at registration as their reset target.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::angle_between_degrees;

/// World-space transform of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Unrotated, unit-scale pose at a position
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// How far this pose has dropped below `baseline` (positive = lower)
    #[inline]
    pub fn height_drop_from(&self, baseline: &Pose) -> f32 {
        baseline.position.y - self.position.y
    }

    /// Straight-line distance to another pose
    #[inline]
    pub fn distance_to(&self, other: &Pose) -> f32 {
        self.position.distance(other.position)
    }

    /// Angular distance to another pose, in degrees
    #[inline]
    pub fn angle_to_degrees(&self, other: &Pose) -> f32 {
        angle_between_degrees(self.rotation, other.rotation)
    }
}
