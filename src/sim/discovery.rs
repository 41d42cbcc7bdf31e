//! Scene discovery
//!
//! Adapter for scenes that mark batteries by name instead of registering them
//! explicitly. Finds battery nodes once and hands them to the registry.

use super::physics::{BodyId, NodeId};
use super::pose::Pose;
use super::registry::BatteryRegistry;
use crate::config::DiscoveryConfig;

/// A node as reported by the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub node: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub pose: Pose,
    pub body: Option<BodyId>,
}

/// Read-only view of the scene graph
pub trait SceneQuery {
    /// Every node, in scene order
    fn nodes(&self) -> Vec<SceneNode>;

    /// First node with exactly this name
    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().into_iter().find(|n| n.name == name).map(|n| n.node)
    }

    /// Direct children of `parent`, in child order
    fn children_of(&self, parent: NodeId) -> Vec<SceneNode> {
        self.nodes()
            .into_iter()
            .filter(|n| n.parent == Some(parent))
            .collect()
    }
}

/// Resolve which node holds the batteries.
///
/// The override wins; otherwise the parent of the first matching node.
fn resolve_parent<S: SceneQuery + ?Sized>(scene: &S, config: &DiscoveryConfig) -> Option<NodeId> {
    if let Some(name) = &config.parent_override {
        match scene.find_by_name(name) {
            Some(node) => return Some(node),
            None => log::warn!("Battery parent override {:?} not found, auto-detecting", name),
        }
    }
    scene
        .nodes()
        .into_iter()
        .find(|n| n.name.contains(&config.name_prefix))
        .and_then(|n| n.parent)
}

/// Find battery nodes and register them. Runs once; later calls are no-ops.
///
/// Returns the registry size. An empty scene is not an error: the game keeps
/// running with nothing to knock down.
pub fn discover<S: SceneQuery + ?Sized>(
    registry: &mut BatteryRegistry,
    scene: &S,
    config: &DiscoveryConfig,
) -> usize {
    if registry.is_discovered() {
        return registry.len();
    }
    registry.mark_discovered();

    let candidates = match resolve_parent(scene, config) {
        Some(parent) => scene.children_of(parent),
        None => scene.nodes(),
    };

    for node in candidates
        .into_iter()
        .filter(|n| n.name.contains(&config.name_prefix))
    {
        registry.register(node.node, node.pose, node.body);
    }

    if registry.is_empty() {
        log::warn!(
            "No batteries matching {:?} found; the level cannot be completed",
            config.name_prefix
        );
    } else {
        log::info!("Found {} total batteries", registry.len());
    }
    registry.len()
}
