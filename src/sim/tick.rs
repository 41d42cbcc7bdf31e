//! Fixed timestep game core
//!
//! [`GameCore`] owns the battery registry, ball budget, level and reset
//! sequence. The host calls [`GameCore::tick`] once per simulation frame,
//! after physics has stepped, and [`GameCore::try_consume_ball`] whenever a
//! firing mechanism wants to shoot.
//!
//! Per tick, knockdown classification always runs before the round-end check.
//! Timed waits (the resolving grace period and the reset settle) are tick
//! countdowns held in state, so nothing blocks and other per-frame work keeps
//! running while a reset is pending.

use super::classify::KnockdownThresholds;
use super::discovery::{SceneQuery, discover};
use super::events::{EventBus, GameEvent, GameListener};
use super::physics::{BodyId, NodeId, PhysicsBackend};
use super::pose::Pose;
use super::registry::{BatteryRegistry, TargetId};
use super::reset::{ResetChoreographer, ResetProgress};
use super::state::{GamePhase, GameState, RoundOutcome};
use crate::config::{ConfigError, GameConfig};

/// The battery knockdown game
#[derive(Debug)]
pub struct GameCore {
    config: GameConfig,
    thresholds: KnockdownThresholds,
    state: GameState,
    registry: BatteryRegistry,
    reset: ResetChoreographer,
    events: EventBus,
    started: bool,
}

impl GameCore {
    /// Create a core for one scene. Batteries are added with
    /// [`register_battery`](Self::register_battery) or
    /// [`discover`](Self::discover) before [`start`](Self::start).
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            thresholds: KnockdownThresholds::from_config(&config),
            state: GameState::new(config.max_balls),
            registry: BatteryRegistry::new(),
            reset: ResetChoreographer::new(config.settle_ticks()),
            events: EventBus::new(),
            started: false,
            config,
        })
    }

    // === Setup ===

    /// Explicitly register a battery at its resting pose
    pub fn register_battery(&mut self, node: NodeId, pose: Pose, body: Option<BodyId>) -> TargetId {
        self.registry.register(node, pose, body)
    }

    /// Register batteries found in the scene by name convention
    pub fn discover<S: SceneQuery + ?Sized>(&mut self, scene: &S) -> usize {
        discover(&mut self.registry, scene, &self.config.discovery)
    }

    pub fn subscribe(&mut self, listener: Box<dyn GameListener>) {
        self.events.subscribe(listener);
    }

    /// Set up level 1 and announce the starting ball count and level.
    ///
    /// Batteries are placed with a full reset, so shooting opens once that
    /// settles.
    pub fn start<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        if self.started {
            log::warn!("GameCore::start called twice, ignoring");
            return;
        }
        self.started = true;

        self.state = GameState::new(self.config.max_balls);
        self.setup_level(physics);
        self.events
            .publish(GameEvent::BallCountChanged(self.state.balls_remaining));
        self.events
            .publish(GameEvent::LevelChanged(self.state.current_level));
    }

    /// Scene teardown: forget batteries and listeners
    pub fn teardown(&mut self) {
        log::info!(
            "Tearing down battery game at level {} ({} batteries)",
            self.state.current_level,
            self.registry.len()
        );
        self.events.clear();
        self.registry.clear();
        self.reset = ResetChoreographer::new(self.config.settle_ticks());
        self.state = GameState::new(self.config.max_balls);
        self.started = false;
    }

    // === Per frame ===

    /// Advance the game by one fixed timestep
    pub fn tick<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        if !self.started {
            return;
        }
        self.state.time_ticks += 1;

        match self.state.phase {
            GamePhase::Playing => {
                self.registry.update_knockdowns(&*physics, &self.thresholds);

                if let Some(outcome) = self.check_round_end() {
                    log::info!(
                        "Level {} round over: {:?} ({} balls left)",
                        self.state.current_level,
                        outcome,
                        self.state.balls_remaining
                    );
                    self.state.phase = GamePhase::Resolving {
                        outcome,
                        ticks_remaining: self.config.reset_delay_ticks(),
                    };
                }
            }

            GamePhase::Resolving {
                outcome,
                ticks_remaining,
            } => {
                // Flags keep latching while the last shot settles
                self.registry.update_knockdowns(&*physics, &self.thresholds);

                let left = ticks_remaining.saturating_sub(1);
                if left == 0 {
                    self.resolve(outcome, physics);
                } else {
                    self.state.phase = GamePhase::Resolving {
                        outcome,
                        ticks_remaining: left,
                    };
                }
            }

            GamePhase::Resetting => match self.reset.advance(physics) {
                ResetProgress::Pending => {}
                ResetProgress::Completed => {
                    self.state.phase = GamePhase::Playing;
                    self.events.publish(GameEvent::BatteriesReset);
                }
                ResetProgress::Idle => {
                    log::warn!("Resetting with no reset in flight, resuming play");
                    self.state.phase = GamePhase::Playing;
                }
            },
        }
    }

    /// Spend a ball for a shot. `false` when out of balls or between rounds.
    pub fn try_consume_ball(&mut self) -> bool {
        if !self.state.consume_ball() {
            return false;
        }
        self.events
            .publish(GameEvent::BallCountChanged(self.state.balls_remaining));
        true
    }

    /// Debug: win the current round immediately
    pub fn debug_advance_level<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        if !self.state.phase.is_playing() {
            return;
        }
        self.resolve(RoundOutcome::Win, physics);
    }

    // === Queries ===

    pub fn can_shoot(&self) -> bool {
        self.state.can_shoot()
    }

    pub fn current_balls(&self) -> u32 {
        self.state.balls_remaining
    }

    pub fn max_balls(&self) -> u32 {
        self.state.max_balls
    }

    pub fn current_level(&self) -> u32 {
        self.state.current_level
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn active_count(&self) -> usize {
        self.state.active_count
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn registry(&self) -> &BatteryRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // === Internals ===

    /// Win is checked first; it needs at least one active battery
    fn check_round_end(&self) -> Option<RoundOutcome> {
        if self.state.balls_remaining > 0 && self.registry.all_active_knocked_down() {
            return Some(RoundOutcome::Win);
        }
        if self.state.balls_remaining == 0 {
            return Some(RoundOutcome::Lose);
        }
        None
    }

    fn resolve<P: PhysicsBackend + ?Sized>(&mut self, outcome: RoundOutcome, physics: &mut P) {
        let finished = self.state.current_level;
        self.state.apply_outcome(outcome);
        match outcome {
            RoundOutcome::Win => log::info!(
                "Level {} complete! Starting level {}",
                finished,
                self.state.current_level
            ),
            RoundOutcome::Lose => log::info!("Out of balls on level {}, back to level 1", finished),
        }
        self.events
            .publish(GameEvent::LevelChanged(self.state.current_level));

        self.setup_level(physics);

        self.state.refill_balls();
        self.events
            .publish(GameEvent::BallCountChanged(self.state.balls_remaining));
    }

    /// Activate the batteries for the current level and start putting them back
    fn setup_level<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        self.state.active_count = self.registry.activate_for_level(
            self.state.current_level,
            self.config.batteries_per_level,
            physics,
        );
        if !self.reset.begin(&mut self.registry, physics) {
            log::warn!("Level setup while a reset is still settling");
        }
        self.state.phase = GamePhase::Resetting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quick_config() -> GameConfig {
        GameConfig {
            reset_delay_seconds: 0.1,
            settle_seconds: 0.0,
            tick_hz: 100.0,
            ..Default::default()
        }
    }

    fn game_with(n: usize) -> (GameCore, SandboxWorld, Rc<RefCell<Vec<GameEvent>>>) {
        let mut world = SandboxWorld::new();
        for i in 0..n {
            world.spawn_battery(
                &format!("Battery Interactable {i}"),
                None,
                Pose::at(Vec3::new(i as f32 * 0.3, 1.0, 0.0)),
            );
        }
        let mut game = GameCore::new(quick_config()).unwrap();
        game.discover(&world);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        game.subscribe(Box::new(move |e: &GameEvent| sink.borrow_mut().push(*e)));
        game.start(&mut world);
        (game, world, events)
    }

    fn run_until_playing(game: &mut GameCore, world: &mut SandboxWorld) {
        for _ in 0..1000 {
            if game.phase().is_playing() {
                return;
            }
            game.tick(world);
        }
        panic!("game never returned to Playing");
    }

    #[test]
    fn test_startup_events_and_initial_reset() {
        let (mut game, mut world, events) = game_with(4);
        assert_eq!(
            *events.borrow(),
            vec![GameEvent::BallCountChanged(4), GameEvent::LevelChanged(1)]
        );
        assert_eq!(game.phase(), GamePhase::Resetting);
        assert!(!game.can_shoot());
        assert_eq!(game.active_count(), 2);

        // One propagation tick, zero settle ticks
        game.tick(&mut world);
        assert!(game.phase().is_playing());
        assert_eq!(events.borrow().last(), Some(&GameEvent::BatteriesReset));
        assert!(game.can_shoot());
    }

    #[test]
    fn test_consume_publishes_count() {
        let (mut game, mut world, events) = game_with(2);
        run_until_playing(&mut game, &mut world);
        events.borrow_mut().clear();

        assert!(game.try_consume_ball());
        assert_eq!(game.current_balls(), 3);
        assert_eq!(*events.borrow(), vec![GameEvent::BallCountChanged(3)]);
    }

    #[test]
    fn test_no_consume_while_resolving() {
        let (mut game, mut world, _) = game_with(2);
        run_until_playing(&mut game, &mut world);
        for _ in 0..4 {
            assert!(game.try_consume_ball());
        }
        game.tick(&mut world);
        assert!(matches!(
            game.phase(),
            GamePhase::Resolving {
                outcome: RoundOutcome::Lose,
                ..
            }
        ));
        assert!(!game.try_consume_ball());
        assert_eq!(game.current_balls(), 0);
    }

    #[test]
    fn test_win_checked_before_lose_on_same_tick() {
        let (mut game, mut world, _) = game_with(2);
        run_until_playing(&mut game, &mut world);

        // Last needed knockdown lands on the same tick a third ball is fired
        assert!(game.try_consume_ball());
        assert!(game.try_consume_ball());
        assert!(game.try_consume_ball());
        for t in game.registry().targets().to_vec() {
            world.knock_over(t.node);
        }
        game.tick(&mut world);
        assert!(matches!(
            game.phase(),
            GamePhase::Resolving {
                outcome: RoundOutcome::Win,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_scene_never_wins() {
        let (mut game, mut world, _) = game_with(0);
        run_until_playing(&mut game, &mut world);
        assert_eq!(game.active_count(), 0);
        for _ in 0..50 {
            game.tick(&mut world);
        }
        assert!(game.phase().is_playing());
        assert_eq!(game.current_level(), 1);

        // Running out of balls still resets the round
        for _ in 0..4 {
            game.try_consume_ball();
        }
        game.tick(&mut world);
        assert!(matches!(
            game.phase(),
            GamePhase::Resolving {
                outcome: RoundOutcome::Lose,
                ..
            }
        ));
    }

    #[test]
    fn test_debug_advance_level() {
        let (mut game, mut world, events) = game_with(6);
        run_until_playing(&mut game, &mut world);
        events.borrow_mut().clear();

        game.debug_advance_level(&mut world);
        assert_eq!(game.current_level(), 2);
        assert_eq!(game.active_count(), 4);
        assert_eq!(game.phase(), GamePhase::Resetting);
        assert_eq!(
            *events.borrow(),
            vec![GameEvent::LevelChanged(2), GameEvent::BallCountChanged(4)]
        );

        // Ignored outside Playing
        game.debug_advance_level(&mut world);
        assert_eq!(game.current_level(), 2);
    }

    #[test]
    fn test_teardown_drops_listeners() {
        let (mut game, mut world, events) = game_with(2);
        game.teardown();
        assert!(!game.is_started());
        assert!(game.registry().is_empty());

        let before = events.borrow().len();
        game.tick(&mut world);
        assert!(!game.try_consume_ball());
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            max_balls: 0,
            ..Default::default()
        };
        assert!(GameCore::new(config).is_err());
    }
}
