//! Game state and phases
//!
//! Everything the level/ball controller decides on lives here and is
//! serialisable, so a run can be snapshotted and inspected.

use serde::{Deserialize, Serialize};

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Every active battery down with balls to spare
    Win,
    /// Out of balls first
    Lose,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Shots allowed, batteries being judged every tick
    Playing,
    /// Round decided; grace period so the last shot can settle
    Resolving {
        outcome: RoundOutcome,
        ticks_remaining: u32,
    },
    /// Batteries being put back; physics frozen until the reset settles
    Resetting,
}

impl GamePhase {
    pub fn is_playing(&self) -> bool {
        matches!(self, GamePhase::Playing)
    }
}

/// Ball budget, level and phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Balls left this round (0..=max_balls)
    pub balls_remaining: u32,
    /// Ball budget per round
    pub max_balls: u32,
    /// 1-based level
    pub current_level: u32,
    /// Batteries in play this level
    pub active_count: usize,
    /// Current phase
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Rounds won / lost so far
    pub wins: u32,
    pub losses: u32,
}

impl GameState {
    /// Fresh state at level 1; starts in `Resetting` until the initial
    /// placement of the batteries settles
    pub fn new(max_balls: u32) -> Self {
        Self {
            balls_remaining: max_balls,
            max_balls,
            current_level: 1,
            active_count: 0,
            phase: GamePhase::Resetting,
            time_ticks: 0,
            wins: 0,
            losses: 0,
        }
    }

    pub fn can_shoot(&self) -> bool {
        self.phase.is_playing() && self.balls_remaining > 0
    }

    /// Spend a ball if allowed. Returns whether a ball was spent.
    pub fn consume_ball(&mut self) -> bool {
        if !self.can_shoot() {
            return false;
        }
        self.balls_remaining -= 1;
        true
    }

    pub fn refill_balls(&mut self) {
        self.balls_remaining = self.max_balls;
    }

    /// Level to play after `outcome`
    pub fn apply_outcome(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Win => {
                self.current_level = self.current_level.saturating_add(1);
                self.wins += 1;
            }
            RoundOutcome::Lose => {
                self.current_level = 1;
                self.losses += 1;
            }
        }
    }
}
