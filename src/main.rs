//! Battery Knockdown headless runner
//!
//! Builds a sandbox scene, fires shots on a fixed cadence and lets a seeded
//! RNG decide what each shot knocks over. Useful for tuning thresholds and
//! timings without an engine attached.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use battery_knockdown::sandbox::SandboxWorld;
use battery_knockdown::sim::{GameEvent, GameState, Pose};
use battery_knockdown::{GameConfig, GameCore};

#[derive(Parser, Debug)]
#[command(about = "Run the battery knockdown game headless with simulated shots", version)]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// RNG seed for shot outcomes
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Simulation ticks to run
    #[arg(long, default_value_t = 12_000)]
    ticks: u64,
    /// Batteries placed in the scene
    #[arg(long, default_value_t = 6)]
    targets: u32,
    /// Chance (0-1) that a shot knocks over a standing battery
    #[arg(long, default_value_t = 0.6)]
    hit_chance: f64,
    /// Ticks between shot attempts
    #[arg(long, default_value_t = 45)]
    shot_interval: u64,
    /// Ticks a ball is in the air before it lands
    #[arg(long, default_value_t = 30)]
    flight_ticks: u64,
    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

/// Aggregates gathered from game events
#[derive(Debug, Default, Serialize)]
struct RunStats {
    shots: u32,
    hits: u32,
    level_changes: u32,
    highest_level: u32,
    resets: u32,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    seed: u64,
    ticks: u64,
    stats: &'a RunStats,
    state: &'a GameState,
}

/// Rack of batteries in rows of three, parented like the original scene
fn build_scene(targets: u32) -> SandboxWorld {
    let mut world = SandboxWorld::new();
    let rack = world.spawn_node("Battery Rack", None, Pose::at(Vec3::new(0.0, 1.0, 3.0)));
    world.spawn_node("Rack Sign", Some(rack), Pose::at(Vec3::new(0.0, 1.8, 3.0)));
    for i in 0..targets {
        let row = (i / 3) as f32;
        let col = (i % 3) as f32;
        let pose = Pose::at(Vec3::new(col * 0.35 - 0.35, 1.0 + row * 0.25, 3.0));
        world.spawn_battery(&format!("Battery Interactable {i}"), Some(rack), pose);
    }
    world
}

/// Land a ball: maybe topple one standing battery, otherwise jostle one
fn land_shot(game: &GameCore, world: &mut SandboxWorld, rng: &mut Pcg32, hit_chance: f64) -> bool {
    let standing: Vec<_> = game
        .registry()
        .active()
        .filter(|t| !t.knocked_down)
        .map(|t| t.node)
        .collect();
    if standing.is_empty() {
        return false;
    }
    let node = standing[rng.random_range(0..standing.len())];
    if rng.random_bool(hit_chance.clamp(0.0, 1.0)) {
        world.knock_over(node);
        true
    } else {
        world.jostle(node, rng);
        false
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let dt = config.dt();

    let mut world = build_scene(args.targets);
    let mut game = GameCore::new(config).context("creating game")?;
    game.discover(&world);

    let stats = Rc::new(RefCell::new(RunStats {
        highest_level: 1,
        ..Default::default()
    }));
    let sink = Rc::clone(&stats);
    game.subscribe(Box::new(move |event: &GameEvent| {
        let mut stats = sink.borrow_mut();
        match *event {
            GameEvent::LevelChanged(level) => {
                stats.level_changes += 1;
                stats.highest_level = stats.highest_level.max(level);
            }
            GameEvent::BatteriesReset => stats.resets += 1,
            GameEvent::BallCountChanged(balls) => log::debug!("Balls: {}", balls),
        }
    }));

    game.start(&mut world);
    log::info!("Battery game running with seed: {}", args.seed);

    let mut rng = Pcg32::seed_from_u64(args.seed);
    let mut in_flight: VecDeque<u64> = VecDeque::new();

    for tick in 0..args.ticks {
        if tick % args.shot_interval.max(1) == 0 && game.try_consume_ball() {
            stats.borrow_mut().shots += 1;
            in_flight.push_back(tick + args.flight_ticks);
        }
        while in_flight.front().is_some_and(|&lands| lands <= tick) {
            in_flight.pop_front();
            if land_shot(&game, &mut world, &mut rng, args.hit_chance) {
                stats.borrow_mut().hits += 1;
            }
        }

        world.step(dt);
        game.tick(&mut world);
    }

    let stats = stats.borrow();
    if args.json {
        let summary = Summary {
            seed: args.seed,
            ticks: args.ticks,
            stats: &stats,
            state: game.state(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} ticks: {} shots, {} hits, level {} (best {}), {} wins / {} losses, {} resets",
            args.ticks,
            stats.shots,
            stats.hits,
            game.current_level(),
            stats.highest_level,
            game.state().wins,
            game.state().losses,
            stats.resets
        );
    }

    game.teardown();
    Ok(())
}
