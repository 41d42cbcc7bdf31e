//! Physics-safe battery reset
//!
//! Teleporting a simulated body while the solver still owns it leaves residual
//! velocity and lets the next step drag it off its mark. The reset therefore
//! runs in two halves separated by a settle wait:
//!
//! 1. `begin`: freeze bodies, teleport to the initial pose, resync replicas,
//!    clear knockdown flags
//! 2. after one tick + the settle time: unfreeze the bodies that were frozen
//!
//! The wait is a tick countdown stored here, advanced by the game loop.

use serde::{Deserialize, Serialize};

use super::physics::{BodyId, PhysicsBackend};
use super::registry::BatteryRegistry;

/// Where the reset sequence currently is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ResetStage {
    /// No reset in flight
    #[default]
    Idle,
    /// Batteries placed and frozen, waiting for transforms to propagate
    Settling {
        ticks_remaining: u32,
        /// Bodies to hand back to the solver when the wait ends
        frozen: Vec<BodyId>,
    },
}

/// Result of advancing the reset by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetProgress {
    Idle,
    Pending,
    /// Physics resumed this tick
    Completed,
}

/// Drives the freeze -> teleport -> settle -> unfreeze sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetChoreographer {
    stage: ResetStage,
    /// Settle ticks after the mandatory first tick
    settle_ticks: u32,
}

impl ResetChoreographer {
    pub fn new(settle_ticks: u32) -> Self {
        Self {
            stage: ResetStage::Idle,
            settle_ticks,
        }
    }

    pub fn stage(&self) -> &ResetStage {
        &self.stage
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.stage, ResetStage::Idle)
    }

    /// Freeze and reposition every active battery.
    ///
    /// Returns `false` without touching anything if a reset is already in
    /// flight. A stale body only skips the freeze; the node is still placed
    /// and its flag cleared. A stale node skips that battery entirely.
    pub fn begin<P: PhysicsBackend + ?Sized>(
        &mut self,
        registry: &mut BatteryRegistry,
        physics: &mut P,
    ) -> bool {
        if !self.is_idle() {
            log::debug!("Reset already in progress, ignoring second request");
            return false;
        }

        let mut frozen = Vec::new();
        for target in registry.active_mut() {
            if let Some(body) = target.body {
                match physics.freeze(body) {
                    Ok(()) => frozen.push(body),
                    Err(e) => log::warn!("Battery {:?}: {}, placing without freeze", target.id, e),
                }
            }

            if let Err(e) = physics.teleport(target.node, target.initial_pose()) {
                log::warn!("Battery {:?}: {}, skipping reset", target.id, e);
                target.stale = true;
                continue;
            }
            target.stale = false;

            match physics.reset_replicated(target.node) {
                Ok(true) => log::trace!("Battery {:?}: replicated pose resynced", target.id),
                Ok(false) => {}
                Err(e) => log::warn!("Battery {:?}: replica resync failed: {}", target.id, e),
            }

            target.knocked_down = false;
        }

        self.stage = ResetStage::Settling {
            // One scheduling tick for the transforms, then the settle time
            ticks_remaining: 1 + self.settle_ticks,
            frozen,
        };
        true
    }

    /// Count down the settle wait; unfreeze bodies once it expires
    pub fn advance<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) -> ResetProgress {
        let ResetStage::Settling {
            ticks_remaining,
            frozen,
        } = &mut self.stage
        else {
            return ResetProgress::Idle;
        };

        *ticks_remaining = ticks_remaining.saturating_sub(1);
        if *ticks_remaining > 0 {
            return ResetProgress::Pending;
        }

        for body in frozen.drain(..) {
            if let Err(e) = physics.unfreeze(body) {
                log::warn!("Could not re-enable physics: {}", e);
            }
        }
        self.stage = ResetStage::Idle;
        log::info!("Batteries reset to initial positions");
        ResetProgress::Completed
    }
}
