use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::side::Side;

/// Why a game ended in a draw.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

/// Why a game is over.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOverReason {
    Checkmate { winner: Side },
    Draw { reason: DrawReason },
    Timeout { loser: Side },
}

impl GameOverReason {
    /// The side that won, if the game was not drawn.
    pub fn winner(&self) -> Option<Side> {
        match *self {
            GameOverReason::Checkmate { winner } => Some(winner),
            GameOverReason::Timeout { loser } => Some(loser.opposite()),
            GameOverReason::Draw { .. } => None,
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::Checkmate { winner } => write!(f, "Checkmate! {:?} wins", winner),
            GameOverReason::Draw { reason } => write!(f, "Draw ({:?})", reason),
            GameOverReason::Timeout { loser } => {
                write!(f, "Out of time. {:?} wins", loser.opposite())
            }
        }
    }
}

/// Whether the game is still being played. Once `Over`, it stays over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    #[default]
    InProgress,
    Over(GameOverReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, GameStatus::Over(_))
    }

    /// Short status string sent to clients.
    pub fn label(&self, side_to_move: Side) -> String {
        match self {
            GameStatus::InProgress => match side_to_move {
                Side::White => "white_turn".to_string(),
                Side::Black => "black_turn".to_string(),
            },
            GameStatus::Over(reason) => match reason.winner() {
                Some(Side::White) => "white_wins".to_string(),
                Some(Side::Black) => "black_wins".to_string(),
                None => "draw".to_string(),
            },
        }
    }
}
