use chess::{ChessMove, Piece};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{format_clock, GameObserver, GameOverReason, Side, SquareCategory, TurnController};
use crate::models::utils::{piece_to_string, side_to_string};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ClientMessage {
    pub message_type: String,
    pub square: Option<String>,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    pub start_time_minutes: Option<u64>,
    pub increment_seconds: Option<u64>,
    /// "white", "black" or "none" for two humans
    pub computer_color: Option<String>,
    pub promote_to: Option<String>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServerMessage {
    pub message_type: String,
    pub fen: Option<String>,
    /// Square categories, row 0 being rank 8
    pub squares: Option<Vec<Vec<SquareCategory>>>,
    pub selected: Option<String>,
    pub reachable: Option<Vec<String>>,
    pub last_move: Option<LastMove>,
    pub white_time_ms: Option<u64>,
    pub black_time_ms: Option<u64>,
    pub white_clock: Option<String>,
    pub black_clock: Option<String>,
    pub active_color: Option<String>,
    pub game_status: Option<String>,
    pub game_over_reason: Option<GameOverReason>,
    pub captured_piece: Option<String>,
    pub captured_color: Option<String>,
    pub error: Option<String>,
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
}

impl From<ChessMove> for LastMove {
    fn from(mv: ChessMove) -> Self {
        Self {
            from: mv.get_source().to_string(),
            to: mv.get_dest().to_string(),
        }
    }
}

impl ServerMessage {
    fn new(message_type: &str) -> Self {
        Self {
            message_type: message_type.to_string(),
            ..Self::default()
        }
    }

    /// Full snapshot of the game as seen by the client.
    pub fn state<O: GameObserver>(game: &TurnController<O>) -> Self {
        let selection = game.selection();
        let white = game.clock(Side::White).remaining();
        let black = game.clock(Side::Black).remaining();

        Self {
            fen: Some(game.position().board().to_string()),
            squares: Some(game.render().iter().map(|row| row.to_vec()).collect()),
            selected: selection.selected().map(|square| square.to_string()),
            reachable: Some(selection.reachable().map(|square| square.to_string()).collect()),
            last_move: game.last_move().map(LastMove::from),
            white_time_ms: Some(white.as_millis() as u64),
            black_time_ms: Some(black.as_millis() as u64),
            white_clock: Some(format_clock(white)),
            black_clock: Some(format_clock(black)),
            active_color: Some(side_to_string(game.active_side())),
            game_status: Some(game.status().label(game.active_side())),
            ..Self::new("state")
        }
    }

    pub fn clock(side: Side, remaining: Duration, display: &str) -> Self {
        let millis = Some(remaining.as_millis() as u64);
        let mut msg = Self {
            active_color: Some(side_to_string(side)),
            ..Self::new("clock")
        };
        match side {
            Side::White => {
                msg.white_time_ms = millis;
                msg.white_clock = Some(display.to_string());
            }
            Side::Black => {
                msg.black_time_ms = millis;
                msg.black_clock = Some(display.to_string());
            }
        }
        msg
    }

    pub fn captured(piece: Piece, side: Side) -> Self {
        Self {
            captured_piece: Some(piece_to_string(piece)),
            captured_color: Some(side_to_string(side)),
            ..Self::new("captured")
        }
    }

    pub fn game_over(reason: GameOverReason, status: String) -> Self {
        Self {
            game_status: Some(status),
            game_over_reason: Some(reason),
            ..Self::new("game_over")
        }
    }

    pub fn error(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new("error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::{AlphaBetaSearch, NoopObserver};
    use chess::Square;
    use serde_json::Value;
    use std::sync::Arc;

    #[test]
    fn client_message_fields_are_optional() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"message_type": "click", "square": "e2"}"#).unwrap();
        assert_eq!(msg.message_type, "click");
        assert_eq!(msg.square.as_deref(), Some("e2"));
        assert!(msg.move_from.is_none());
    }

    #[test]
    fn oversized_start_time_is_refused() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"message_type": "new_game", "start_time_minutes": 18446744073709551615}"#,
        )
        .unwrap();
        assert_eq!(msg.start_time_minutes, Some(u64::MAX));

        let result = GameConfig::default().with_time_control(msg.start_time_minutes, msg.increment_seconds);
        assert!(matches!(result, Err(crate::error::TurnError::InvalidTimeControl { .. })));
    }

    #[test]
    fn state_message_describes_the_board() {
        let config = GameConfig::default().with_computer(None);
        let mut game = TurnController::new(config, Arc::new(AlphaBetaSearch::default()), NoopObserver);
        game.select(Some(Square::E2)).unwrap();

        let json: Value = serde_json::to_value(ServerMessage::state(&game)).unwrap();
        assert_eq!(json["message_type"], "state");
        assert_eq!(json["selected"], "e2");
        assert_eq!(json["reachable"], serde_json::json!(["e3", "e4"]));
        assert_eq!(json["active_color"], "white");
        assert_eq!(json["game_status"], "white_turn");
        assert_eq!(json["white_clock"], "5:00");
        assert_eq!(json["squares"][0][0], "light");
        assert_eq!(json["squares"][5][4], "selection_highlight");
    }

    #[test]
    fn clock_message_only_carries_one_side() {
        let msg = ServerMessage::clock(Side::Black, Duration::from_millis(61_500), "1:02");
        assert_eq!(msg.black_clock.as_deref(), Some("1:02"));
        assert_eq!(msg.black_time_ms, Some(61_500));
        assert!(msg.white_clock.is_none());
    }
}
