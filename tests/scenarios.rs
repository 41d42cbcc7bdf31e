//! End-to-end rounds against the sandbox world.

use std::cell::RefCell;
use std::rc::Rc;

use battery_knockdown::sandbox::SandboxWorld;
use battery_knockdown::sim::{GameEvent, GamePhase, PhysicsBackend, Pose, RoundOutcome};
use battery_knockdown::{GameConfig, GameCore};
use glam::{Quat, Vec3};

const TICK_HZ: f32 = 60.0;

fn config() -> GameConfig {
    GameConfig {
        tick_hz: TICK_HZ,
        ..Default::default()
    }
}

struct Harness {
    game: GameCore,
    world: SandboxWorld,
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl Harness {
    fn new(targets: usize) -> Self {
        let mut world = SandboxWorld::new();
        let rack = world.spawn_node("Battery Rack", None, Pose::default());
        for i in 0..targets {
            let pose = Pose::new(
                Vec3::new(i as f32 * 0.4, 1.0, 2.0),
                Quat::from_rotation_y(i as f32 * 0.1),
                Vec3::splat(0.5),
            );
            world.spawn_battery(&format!("Battery Interactable {i}"), Some(rack), pose);
        }

        let mut game = GameCore::new(config()).unwrap();
        assert_eq!(game.discover(&world), targets);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        game.subscribe(Box::new(move |e: &GameEvent| sink.borrow_mut().push(*e)));
        game.start(&mut world);

        let mut harness = Self {
            game,
            world,
            events,
        };
        harness.settle();
        harness
    }

    fn tick(&mut self) {
        self.world.step(1.0 / TICK_HZ);
        self.game.tick(&mut self.world);
    }

    /// Tick until shots are allowed again
    fn settle(&mut self) {
        for _ in 0..10_000 {
            if self.game.phase() == GamePhase::Playing {
                return;
            }
            self.tick();
        }
        panic!("never returned to Playing");
    }

    fn knock_active(&mut self, index: usize) {
        let node = self
            .game
            .registry()
            .active()
            .nth(index)
            .expect("active target")
            .node;
        self.world.knock_over(node);
    }

    fn count(&self, event: GameEvent) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }
}

#[test]
fn level_complete_advances_and_refills() {
    let mut h = Harness::new(6);
    assert_eq!(h.game.active_count(), 2);

    assert!(h.game.try_consume_ball());
    h.knock_active(0);
    h.tick();
    assert!(h.game.try_consume_ball());
    h.knock_active(1);
    h.tick();

    assert_eq!(
        h.game.phase(),
        GamePhase::Resolving {
            outcome: RoundOutcome::Win,
            ticks_remaining: h.game.config().reset_delay_ticks(),
        }
    );
    assert_eq!(h.game.current_balls(), 2);

    // Nothing changes during the grace period
    for _ in 0..h.game.config().reset_delay_ticks() - 1 {
        h.tick();
        assert_eq!(h.game.current_level(), 1);
    }
    h.tick();
    assert_eq!(h.game.current_level(), 2);
    assert_eq!(h.game.current_balls(), 4);
    assert_eq!(h.game.active_count(), 4);
    assert_eq!(h.game.phase(), GamePhase::Resetting);

    h.settle();
    assert!(h.game.can_shoot());
    assert_eq!(h.count(GameEvent::LevelChanged(2)), 1);
    // Startup reset + level-up reset
    assert_eq!(h.count(GameEvent::BatteriesReset), 2);
}

#[test]
fn running_out_of_balls_restarts_at_level_one() {
    let mut h = Harness::new(6);
    h.game.debug_advance_level(&mut h.world);
    h.settle();
    assert_eq!(h.game.current_level(), 2);

    for _ in 0..4 {
        assert!(h.game.try_consume_ball());
        h.tick();
    }
    assert!(!h.game.try_consume_ball());
    assert!(matches!(
        h.game.phase(),
        GamePhase::Resolving {
            outcome: RoundOutcome::Lose,
            ..
        }
    ));

    h.settle();
    assert_eq!(h.game.current_level(), 1);
    assert_eq!(h.game.current_balls(), 4);
    assert_eq!(h.game.active_count(), 2);
    assert_eq!(h.events.borrow().iter().rev().nth(2), Some(&GameEvent::LevelChanged(1)));

    // Batteries past level 1 are hidden again
    let hidden = h.game.registry().targets()[2].node;
    assert!(!h.world.is_enabled(hidden));
}

#[test]
fn high_level_clamps_to_registered_batteries() {
    let mut h = Harness::new(6);
    for _ in 0..9 {
        h.game.debug_advance_level(&mut h.world);
        h.settle();
    }
    assert_eq!(h.game.current_level(), 10);
    assert_eq!(h.game.active_count(), 6);

    // Win is judged against exactly the six registered batteries
    assert!(h.game.try_consume_ball());
    for i in 0..5 {
        h.knock_active(i);
    }
    h.tick();
    assert_eq!(h.game.phase(), GamePhase::Playing);
    h.knock_active(5);
    h.tick();
    assert!(matches!(
        h.game.phase(),
        GamePhase::Resolving {
            outcome: RoundOutcome::Win,
            ..
        }
    ));
}

#[test]
fn destroyed_body_does_not_block_reset() {
    let mut h = Harness::new(4);
    let targets = h.game.registry().targets().to_vec();
    h.world.knock_over(targets[0].node);
    h.world.knock_over(targets[1].node);
    h.world.destroy_body(targets[0].body.unwrap());

    for _ in 0..4 {
        h.game.try_consume_ball();
    }
    let resets_before = h.count(GameEvent::BatteriesReset);
    h.settle();

    assert_eq!(h.count(GameEvent::BatteriesReset), resets_before + 1);
    let t = &h.game.registry().targets()[1];
    assert_eq!(h.world.sample_pose(t.node), Some(*t.initial_pose()));
    assert!(!h.world.is_frozen(t.body.unwrap()));

    // The battery that lost its body is still put back and counts as standing
    let t = &h.game.registry().targets()[0];
    assert_eq!(h.world.sample_pose(t.node), Some(*t.initial_pose()));
    assert!(!t.knocked_down);
    assert_eq!(h.world.unsafe_teleports(), 0);

    assert!(h.game.try_consume_ball());
    h.tick();
    assert_eq!(h.game.phase(), GamePhase::Playing);
}

#[test]
fn destroyed_battery_does_not_block_win() {
    let mut h = Harness::new(2);
    let targets = h.game.registry().targets().to_vec();
    h.world.destroy_node(targets[0].node);

    assert!(h.game.try_consume_ball());
    h.world.knock_over(targets[1].node);
    h.tick();
    assert!(matches!(
        h.game.phase(),
        GamePhase::Resolving {
            outcome: RoundOutcome::Win,
            ..
        }
    ));

    // The reset skips the missing battery and still completes
    h.settle();
    assert_eq!(h.game.current_level(), 2);
    let t = &h.game.registry().targets()[1];
    assert_eq!(h.world.sample_pose(t.node), Some(*t.initial_pose()));
    assert!(!t.knocked_down);
}

#[test]
fn all_batteries_destroyed_only_loses() {
    let mut h = Harness::new(2);
    for t in h.game.registry().targets().to_vec() {
        h.world.destroy_node(t.node);
    }
    for _ in 0..5 {
        h.tick();
    }
    assert_eq!(h.game.phase(), GamePhase::Playing);

    for _ in 0..4 {
        assert!(h.game.try_consume_ball());
    }
    h.tick();
    assert!(matches!(
        h.game.phase(),
        GamePhase::Resolving {
            outcome: RoundOutcome::Lose,
            ..
        }
    ));
}

#[test]
fn reset_restores_exact_poses_without_fighting_physics() {
    let mut h = Harness::new(4);
    assert_eq!(h.world.unsafe_teleports(), 0);

    h.game.try_consume_ball();
    h.knock_active(0);
    h.knock_active(1);
    // Let the toppled batteries slide for a while
    for _ in 0..30 {
        h.tick();
    }
    h.settle();

    for t in h.game.registry().active() {
        assert_eq!(h.world.sample_pose(t.node), Some(*t.initial_pose()));
        assert!(!t.knocked_down);
    }
    assert_eq!(h.world.unsafe_teleports(), 0);

    // Bodies stay put once physics resumes
    for _ in 0..10 {
        h.tick();
    }
    for t in h.game.registry().active() {
        assert_eq!(h.world.sample_pose(t.node), Some(*t.initial_pose()));
    }
}

#[test]
fn knockdown_stays_counted_after_righting() {
    let mut h = Harness::new(2);
    let target = h.game.registry().targets()[0].clone();

    h.world.knock_over(target.node);
    h.tick();
    // Physics puts it back upright and still
    h.world.set_velocity(target.body.unwrap(), Vec3::ZERO, Vec3::ZERO);
    h.world.set_pose(target.node, *target.initial_pose());
    for _ in 0..5 {
        h.tick();
    }
    assert!(h.game.registry().targets()[0].knocked_down);
}

#[test]
fn decorative_battery_without_body_is_reset() {
    let mut world = SandboxWorld::new();
    let node = world.spawn_node("Battery Interactable Prop", None, Pose::at(Vec3::Y));
    let mut game = GameCore::new(config()).unwrap();
    game.register_battery(node, Pose::at(Vec3::Y), None);
    game.start(&mut world);
    while game.phase() != GamePhase::Playing {
        game.tick(&mut world);
    }

    world.set_pose(node, Pose::at(Vec3::ZERO));
    game.tick(&mut world);
    assert!(game.registry().targets()[0].knocked_down);

    game.debug_advance_level(&mut world);
    assert_eq!(world.sample_pose(node), Some(Pose::at(Vec3::Y)));
}
