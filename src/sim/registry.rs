//! Battery registry
//!
//! The fixed pool of knockable targets, in registration order. Targets are
//! registered once at scene setup and never recreated; levels only toggle
//! which prefix of the pool is active.

use serde::{Deserialize, Serialize};

use super::classify::{KnockdownThresholds, classify};
use super::physics::{BodyId, NodeId, PhysicsBackend};
use super::pose::Pose;

/// Stable index of a target in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// One physical battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryTarget {
    pub id: TargetId,
    pub node: NodeId,
    /// Rigid body, if the node is physically simulated
    pub body: Option<BodyId>,
    /// Pose at registration: reset target and knockdown baseline
    initial: Pose,
    /// Sticky within a round; cleared only by a reset
    pub knocked_down: bool,
    /// Participates in the current level
    pub active: bool,
    /// Node could not be sampled on the last check; left out of the win test
    #[serde(default)]
    pub stale: bool,
}

impl BatteryTarget {
    pub fn initial_pose(&self) -> &Pose {
        &self.initial
    }
}

/// Ordered pool of battery targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatteryRegistry {
    targets: Vec<BatteryTarget>,
    /// Set once discovery has run (successfully or not)
    discovered: bool,
}

impl BatteryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a battery; its current pose becomes its permanent baseline
    pub fn register(&mut self, node: NodeId, initial: Pose, body: Option<BodyId>) -> TargetId {
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(BatteryTarget {
            id,
            node,
            body,
            initial,
            knocked_down: false,
            active: false,
            stale: false,
        });
        id
    }

    pub fn mark_discovered(&mut self) {
        self.discovered = true;
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&BatteryTarget> {
        self.targets.get(id.0 as usize)
    }

    pub fn targets(&self) -> &[BatteryTarget] {
        &self.targets
    }

    pub fn active(&self) -> impl Iterator<Item = &BatteryTarget> {
        self.targets.iter().filter(|t| t.active)
    }

    pub(crate) fn active_mut(&mut self) -> impl Iterator<Item = &mut BatteryTarget> {
        self.targets.iter_mut().filter(|t| t.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Number of targets a level asks for, clamped to what is registered
    pub fn target_count_for_level(&self, level: u32, per_level: u32) -> usize {
        let wanted = (level as usize).saturating_mul(per_level as usize);
        wanted.min(self.targets.len())
    }

    /// Activate the first N targets for `level` and disable the rest.
    ///
    /// Returns the number of active targets. Nodes the backend no longer knows
    /// are skipped; their active flag still follows the level.
    pub fn activate_for_level<P: PhysicsBackend + ?Sized>(
        &mut self,
        level: u32,
        per_level: u32,
        physics: &mut P,
    ) -> usize {
        let count = self.target_count_for_level(level, per_level);

        for (i, target) in self.targets.iter_mut().enumerate() {
            let enable = i < count;
            target.active = enable;
            if !enable {
                target.knocked_down = false;
            }
            if let Err(e) = physics.set_node_enabled(target.node, enable) {
                log::warn!("Skipping battery {:?} during level setup: {}", target.id, e);
            }
        }

        log::info!("Level {}: {} batteries active", level, count);
        count
    }

    /// Sample every active target and latch newly knocked-down ones.
    ///
    /// A target whose node can no longer be sampled keeps its flag and is
    /// marked stale.
    pub fn update_knockdowns<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &P,
        thresholds: &KnockdownThresholds,
    ) {
        for target in self.active_mut() {
            if target.knocked_down {
                continue;
            }
            let Some(current) = physics.sample_pose(target.node) else {
                if !target.stale {
                    log::warn!("Battery {:?} node is gone, ignoring it for the win check", target.id);
                    target.stale = true;
                }
                continue;
            };
            target.stale = false;
            if let Some(reason) = classify(&target.initial, &current, thresholds) {
                target.knocked_down = true;
                log::debug!("Battery {:?} knocked down ({:?})", target.id, reason);
            }
        }
    }

    /// True when at least one live target is active and every live active
    /// one is down. Stale targets are not counted either way.
    pub fn all_active_knocked_down(&self) -> bool {
        let mut any = false;
        for target in self.active().filter(|t| !t.stale) {
            any = true;
            if !target.knocked_down {
                return false;
            }
        }
        any
    }

    /// Drop every target (scene teardown)
    pub fn clear(&mut self) {
        self.targets.clear();
        self.discovered = false;
    }
}
