//! In-memory scene + physics world
//!
//! Implements [`PhysicsBackend`] and [`SceneQuery`] without a real solver:
//! bodies integrate their velocity each step unless frozen or disabled. Used
//! by the headless runner and by tests, which also use it to simulate nodes
//! being destroyed behind the game's back.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use rand::Rng;

use crate::sim::discovery::{SceneNode, SceneQuery};
use crate::sim::physics::{BodyId, NodeId, PhysicsBackend, PhysicsError};
use crate::sim::pose::Pose;

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    parent: Option<NodeId>,
    pose: Pose,
    body: Option<BodyId>,
    enabled: bool,
    replicated: bool,
    replica_resyncs: u32,
}

#[derive(Debug, Clone, Default)]
struct BodyData {
    node: Option<NodeId>,
    linear_vel: Vec3,
    angular_vel: Vec3,
    kinematic: bool,
    sleeping: bool,
}

/// Toy physics world
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    nodes: BTreeMap<NodeId, NodeData>,
    bodies: BTreeMap<BodyId, BodyData>,
    next_id: u32,
    /// Teleports issued while the target body was still simulated
    unsafe_teleports: u32,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a node without a body (decoration, parent)
    pub fn spawn_node(&mut self, name: &str, parent: Option<NodeId>, pose: Pose) -> NodeId {
        let node = NodeId(self.next_entity_id());
        self.nodes.insert(
            node,
            NodeData {
                name: name.to_string(),
                parent,
                pose,
                body: None,
                enabled: true,
                replicated: false,
                replica_resyncs: 0,
            },
        );
        node
    }

    /// Add a node with a dynamic rigid body
    pub fn spawn_battery(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        pose: Pose,
    ) -> (NodeId, BodyId) {
        let node = self.spawn_node(name, parent, pose);
        let body = BodyId(self.next_entity_id());
        self.bodies.insert(
            body,
            BodyData {
                node: Some(node),
                ..Default::default()
            },
        );
        if let Some(data) = self.nodes.get_mut(&node) {
            data.body = Some(body);
        }
        (node, body)
    }

    /// Integrate every awake, enabled, non-kinematic body
    pub fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kinematic || body.sleeping {
                continue;
            }
            let Some(node) = body.node.and_then(|n| self.nodes.get_mut(&n)) else {
                continue;
            };
            if !node.enabled {
                continue;
            }
            node.pose.position += body.linear_vel * dt;
            let spin = body.angular_vel * dt;
            if spin.length_squared() > 0.0 {
                node.pose.rotation = (Quat::from_scaled_axis(spin) * node.pose.rotation).normalize();
            }
        }
    }

    /// Topple a node: tip it 90 degrees, drop it and send it sliding
    pub fn knock_over(&mut self, node: NodeId) {
        let Some(data) = self.nodes.get_mut(&node) else {
            return;
        };
        data.pose.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2) * data.pose.rotation;
        data.pose.position += Vec3::new(0.4, -0.6, 0.0);
        if let Some(body) = data.body.and_then(|b| self.bodies.get_mut(&b)) {
            body.linear_vel = Vec3::new(1.0, 0.0, 0.0);
            body.angular_vel = Vec3::new(0.0, 0.0, 2.0);
            body.sleeping = false;
        }
    }

    /// Small random shove that stays under the knockdown tolerances
    pub fn jostle<R: Rng>(&mut self, node: NodeId, rng: &mut R) {
        if let Some(data) = self.nodes.get_mut(&node) {
            let dx = rng.random_range(-0.05..0.05);
            let dz = rng.random_range(-0.05..0.05);
            data.pose.position += Vec3::new(dx, 0.0, dz);
        }
    }

    pub fn set_pose(&mut self, node: NodeId, pose: Pose) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.pose = pose;
        }
    }

    pub fn set_velocity(&mut self, body: BodyId, linear: Vec3, angular: Vec3) {
        if let Some(data) = self.bodies.get_mut(&body) {
            data.linear_vel = linear;
            data.angular_vel = angular;
            data.sleeping = false;
        }
    }

    pub fn set_replicated(&mut self, node: NodeId, replicated: bool) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.replicated = replicated;
        }
    }

    /// Remove a node as if the scene destroyed it
    pub fn destroy_node(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.remove(&node) {
            if let Some(body) = data.body {
                self.bodies.remove(&body);
            }
        }
    }

    /// Remove only the rigid body; the node stays
    pub fn destroy_body(&mut self, body: BodyId) {
        if let Some(data) = self.bodies.remove(&body) {
            if let Some(node) = data.node.and_then(|n| self.nodes.get_mut(&n)) {
                node.body = None;
            }
        }
    }

    pub fn is_enabled(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.enabled)
    }

    pub fn is_frozen(&self, body: BodyId) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.kinematic)
    }

    pub fn velocity(&self, body: BodyId) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.linear_vel)
    }

    pub fn replica_resyncs(&self, node: NodeId) -> u32 {
        self.nodes.get(&node).map_or(0, |n| n.replica_resyncs)
    }

    pub fn unsafe_teleports(&self) -> u32 {
        self.unsafe_teleports
    }
}

impl PhysicsBackend for SandboxWorld {
    fn sample_pose(&self, node: NodeId) -> Option<Pose> {
        self.nodes.get(&node).map(|n| n.pose)
    }

    fn set_node_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), PhysicsError> {
        let data = self.nodes.get_mut(&node).ok_or(PhysicsError::StaleNode(node))?;
        data.enabled = enabled;
        Ok(())
    }

    fn freeze(&mut self, body: BodyId) -> Result<(), PhysicsError> {
        let data = self.bodies.get_mut(&body).ok_or(PhysicsError::StaleBody(body))?;
        data.kinematic = true;
        data.linear_vel = Vec3::ZERO;
        data.angular_vel = Vec3::ZERO;
        data.sleeping = true;
        Ok(())
    }

    fn teleport(&mut self, node: NodeId, pose: &Pose) -> Result<(), PhysicsError> {
        let data = self.nodes.get_mut(&node).ok_or(PhysicsError::StaleNode(node))?;
        let simulated = data
            .body
            .and_then(|b| self.bodies.get(&b))
            .is_some_and(|b| !b.kinematic);
        if simulated {
            self.unsafe_teleports += 1;
        }
        data.pose = *pose;
        Ok(())
    }

    fn reset_replicated(&mut self, node: NodeId) -> Result<bool, PhysicsError> {
        let data = self.nodes.get_mut(&node).ok_or(PhysicsError::StaleNode(node))?;
        if !data.replicated {
            return Ok(false);
        }
        data.replica_resyncs += 1;
        Ok(true)
    }

    fn unfreeze(&mut self, body: BodyId) -> Result<(), PhysicsError> {
        let data = self.bodies.get_mut(&body).ok_or(PhysicsError::StaleBody(body))?;
        data.kinematic = false;
        data.sleeping = false;
        Ok(())
    }
}

impl SceneQuery for SandboxWorld {
    fn nodes(&self) -> Vec<SceneNode> {
        self.nodes
            .iter()
            .map(|(&node, data)| SceneNode {
                node,
                name: data.name.clone(),
                parent: data.parent,
                pose: data.pose,
                body: data.body,
            })
            .collect()
    }
}
