//! Battery game simulation
//!
//! All gameplay decisions live here. This module must stay engine-agnostic:
//! - Fixed timestep only, timed waits are tick countdowns
//! - Stable iteration order (registration order)
//! - Physics and scene access only through the collaborator traits

pub mod classify;
pub mod discovery;
pub mod events;
pub mod physics;
pub mod pose;
pub mod registry;
pub mod reset;
pub mod state;
pub mod tick;

pub use classify::{KnockdownReason, KnockdownThresholds, classify};
pub use discovery::{SceneNode, SceneQuery, discover};
pub use events::{EventBus, GameEvent, GameListener};
pub use physics::{BodyId, NodeId, PhysicsBackend, PhysicsError};
pub use pose::Pose;
pub use registry::{BatteryRegistry, BatteryTarget, TargetId};
pub use reset::{ResetChoreographer, ResetProgress, ResetStage};
pub use state::{GamePhase, GameState, RoundOutcome};
pub use tick::GameCore;
