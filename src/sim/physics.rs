//! Physics collaborator interface
//!
//! The game core never owns rigid bodies. It samples poses and issues
//! freeze / teleport / unfreeze requests through [`PhysicsBackend`], which the
//! host engine implements.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pose::Pose;

/// Opaque handle to a scene node (the transform a battery lives on)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Opaque handle to a rigid body attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// A handle the backend no longer recognises (destroyed externally)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    #[error("scene node {0:?} no longer exists")]
    StaleNode(NodeId),
    #[error("rigid body {0:?} no longer exists")]
    StaleBody(BodyId),
}

/// Operations the game core needs from the physics / scene engine.
///
/// All calls happen on the simulation thread, between physics steps.
pub trait PhysicsBackend {
    /// Current world pose of a node, or `None` if the node is gone
    fn sample_pose(&self, node: NodeId) -> Option<Pose>;

    /// Show/enable or hide/disable a node (and its body) for the current level
    fn set_node_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), PhysicsError>;

    /// Take a body out of simulation: zero linear and angular velocity, make
    /// it kinematic and put it to sleep
    fn freeze(&mut self, body: BodyId) -> Result<(), PhysicsError>;

    /// Write a pose directly to the node, bypassing the solver
    fn teleport(&mut self, node: NodeId, pose: &Pose) -> Result<(), PhysicsError>;

    /// Ask the replication layer to resync this node to its authoritative
    /// pose. Returns `Ok(false)` when the node is not replicated.
    fn reset_replicated(&mut self, _node: NodeId) -> Result<bool, PhysicsError> {
        Ok(false)
    }

    /// Wake a frozen body and hand it back to the solver
    fn unfreeze(&mut self, body: BodyId) -> Result<(), PhysicsError>;
}
