//! Game and server configuration.
//!
//! A [`GameConfig`] is built for every new game, usually from the client's
//! `new_game` message layered over the defaults. The [`ServerConfig`] comes
//! from the environment at startup.

use chess::Piece;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::{TurnError, TurnResult};
use crate::game::clock::DEFAULT_TICK_INTERVAL;
use crate::game::side::{PlayerKind, Side};

/// Environment variable holding the address the server binds to
pub const BIND_ADDR_VAR: &str = "CHESS_BIND_ADDR";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Starting time on each clock: five minutes.
pub const DEFAULT_START_TIME_MS: u64 = 300_000;

/// Longest starting time a client may ask for: one day.
pub const MAX_START_TIME_MINUTES: u64 = 24 * 60;

pub const MAX_INCREMENT_SECONDS: u64 = 60 * 60;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub start_time_ms: u64,
    pub increment_ms: u64,
    pub tick_interval_ms: u64,
    pub white: PlayerKind,
    pub black: PlayerKind,
    /// Piece a pawn becomes when a move does not name one.
    #[serde(deserialize_with = "deserialize_piece")]
    pub promotion: Piece,
    pub search: SearchConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_time_ms: DEFAULT_START_TIME_MS,
            increment_ms: 0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            white: PlayerKind::Human,
            black: PlayerKind::Computer,
            promotion: Piece::Queen,
            search: SearchConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn player(&self, side: Side) -> PlayerKind {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    /// A config where `computer` (if any) is played by the engine and the
    /// other side by a human.
    pub fn with_computer(mut self, computer: Option<Side>) -> Self {
        self.white = PlayerKind::Human;
        self.black = PlayerKind::Human;
        match computer {
            Some(Side::White) => self.white = PlayerKind::Computer,
            Some(Side::Black) => self.black = PlayerKind::Computer,
            None => {}
        }
        self
    }

    /// Applies a time control given in client units: whole minutes on each
    /// clock and whole seconds of increment. Values out of range are refused.
    pub fn with_time_control(
        mut self,
        start_minutes: Option<u64>,
        increment_seconds: Option<u64>,
    ) -> TurnResult<Self> {
        if let Some(minutes) = start_minutes {
            if minutes == 0 || minutes > MAX_START_TIME_MINUTES {
                return Err(TurnError::InvalidTimeControl {
                    reason: format!(
                        "start time must be between 1 and {} minutes, got {}",
                        MAX_START_TIME_MINUTES, minutes
                    ),
                });
            }
            self.start_time_ms = minutes * 60_000;
        }
        if let Some(seconds) = increment_seconds {
            if seconds > MAX_INCREMENT_SECONDS {
                return Err(TurnError::InvalidTimeControl {
                    reason: format!(
                        "increment must be at most {} seconds, got {}",
                        MAX_INCREMENT_SECONDS, seconds
                    ),
                });
            }
            self.increment_ms = seconds * 1_000;
        }
        Ok(self)
    }

    pub fn start_time(&self) -> Duration {
        Duration::from_millis(self.start_time_ms)
    }

    pub fn increment(&self) -> Duration {
        Duration::from_millis(self.increment_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Time management for the bundled search.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// The remaining clock time is split as if this many moves were left.
    pub moves_to_go: u32,
    pub min_think_ms: u64,
    pub max_think_ms: u64,
    pub max_depth: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            moves_to_go: 30,
            min_think_ms: 50,
            max_think_ms: 3_000,
            max_depth: 64,
        }
    }
}

impl SearchConfig {
    /// Time to spend on one move given what is left on the clock.
    pub fn think_time(&self, remaining: Duration) -> Duration {
        let share = remaining / self.moves_to_go.max(1);
        let min = Duration::from_millis(self.min_think_ms);
        let max = Duration::from_millis(self.max_think_ms.max(self.min_think_ms));
        share.clamp(min, max).min(remaining)
    }
}

/// Parse a promotion piece name as sent by clients ("q", "queen", "n", ...).
pub fn parse_piece(name: &str) -> Option<Piece> {
    match name.to_lowercase().as_str() {
        "q" | "queen" => Some(Piece::Queen),
        "r" | "rook" => Some(Piece::Rook),
        "b" | "bishop" => Some(Piece::Bishop),
        "n" | "knight" => Some(Piece::Knight),
        _ => None,
    }
}

fn deserialize_piece<'de, D>(deserializer: D) -> Result<Piece, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    parse_piece(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("not a promotion piece: {}", name)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_put_the_computer_on_black() {
        let config = GameConfig::default();
        assert_eq!(config.player(Side::White), PlayerKind::Human);
        assert_eq!(config.player(Side::Black), PlayerKind::Computer);
        assert_eq!(config.start_time(), Duration::from_secs(300));
        assert_eq!(config.promotion, Piece::Queen);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"increment_ms": 2000, "white": "computer", "promotion": "n"}"#)
                .unwrap();
        assert_eq!(config.increment(), Duration::from_secs(2));
        assert_eq!(config.player(Side::White), PlayerKind::Computer);
        assert_eq!(config.promotion, Piece::Knight);
        assert_eq!(config.start_time_ms, DEFAULT_START_TIME_MS);
    }

    #[test]
    fn unknown_promotion_piece_is_rejected() {
        let result = serde_json::from_str::<GameConfig>(r#"{"promotion": "king"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn with_computer_sets_exactly_one_engine_side() {
        let config = GameConfig::default().with_computer(Some(Side::White));
        assert_eq!(config.player(Side::White), PlayerKind::Computer);
        assert_eq!(config.player(Side::Black), PlayerKind::Human);

        let config = config.with_computer(None);
        assert_eq!(config.player(Side::White), PlayerKind::Human);
        assert_eq!(config.player(Side::Black), PlayerKind::Human);
    }

    #[test]
    fn time_control_converts_client_units() {
        let config = GameConfig::default()
            .with_time_control(Some(3), Some(2))
            .unwrap();
        assert_eq!(config.start_time(), Duration::from_secs(180));
        assert_eq!(config.increment(), Duration::from_secs(2));

        let unchanged = GameConfig::default().with_time_control(None, None).unwrap();
        assert_eq!(unchanged, GameConfig::default());
    }

    #[test]
    fn huge_time_control_is_refused_instead_of_overflowing() {
        let result = GameConfig::default().with_time_control(Some(u64::MAX), None);
        assert!(matches!(result, Err(TurnError::InvalidTimeControl { .. })));

        let result = GameConfig::default().with_time_control(None, Some(u64::MAX));
        assert!(matches!(result, Err(TurnError::InvalidTimeControl { .. })));

        let result = GameConfig::default().with_time_control(Some(0), None);
        assert!(matches!(result, Err(TurnError::InvalidTimeControl { .. })));
    }

    #[test]
    fn think_time_is_a_clamped_share_of_the_clock() {
        let search = SearchConfig::default();
        assert_eq!(search.think_time(Duration::from_secs(30)), Duration::from_secs(1));
        assert_eq!(search.think_time(Duration::from_secs(600)), Duration::from_secs(3));
        assert_eq!(search.think_time(Duration::from_millis(900)), Duration::from_millis(50));
        assert_eq!(search.think_time(Duration::from_millis(20)), Duration::from_millis(20));
    }
}
