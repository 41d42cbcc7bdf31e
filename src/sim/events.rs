//! Notifications published by the game core
//!
//! HUD, signboard and audio layers subscribe here instead of polling.

use serde::{Deserialize, Serialize};

/// Something collaborators may want to re-render on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Balls left this round (on every shot, every reset and at startup)
    BallCountChanged(u32),
    /// Level now being played (on win, on lose and at startup)
    LevelChanged(u32),
    /// Reset sequence finished; batteries are back under physics
    BatteriesReset,
}

/// Receiver of [`GameEvent`]s
pub trait GameListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> GameListener for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Ordered list of listeners; events are delivered in subscription order
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn GameListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn GameListener>) {
        self.listeners.push(listener);
    }

    pub fn publish(&mut self, event: GameEvent) {
        log::trace!("event {:?} -> {} listeners", event, self.listeners.len());
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop every listener (scene teardown)
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
