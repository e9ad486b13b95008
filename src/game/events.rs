use chess::Piece;
use std::time::Duration;

use crate::game::side::Side;
use crate::game::status::GameOverReason;

/// Receives the notifications the controller emits for display.
///
/// All methods default to doing nothing.
pub trait GameObserver {
    /// A piece of `side` was taken off the board.
    fn piece_captured(&mut self, _piece: Piece, _side: Side) {}

    fn game_over(&mut self, _reason: GameOverReason) {}

    /// Called on every tick of the running clock with its formatted time.
    fn clock_changed(&mut self, _side: Side, _remaining: Duration, _display: &str) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GameObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Captured {
        piece: Piece,
        side: Side,
    },
    GameOver(GameOverReason),
    Clock {
        side: Side,
        remaining: Duration,
        display: String,
    },
}

/// Buffers notifications until the owner drains them.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn captures(&self) -> Vec<(Piece, Side)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GameEvent::Captured { piece, side } => Some((*piece, *side)),
                _ => None,
            })
            .collect()
    }

    pub fn game_overs(&self) -> Vec<GameOverReason> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GameEvent::GameOver(reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

impl GameObserver for EventQueue {
    fn piece_captured(&mut self, piece: Piece, side: Side) {
        self.events.push(GameEvent::Captured { piece, side });
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.events.push(GameEvent::GameOver(reason));
    }

    fn clock_changed(&mut self, side: Side, remaining: Duration, display: &str) {
        self.events.push(GameEvent::Clock {
            side,
            remaining,
            display: display.to_string(),
        });
    }
}
