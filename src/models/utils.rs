use chess::{Piece, Square};
use std::str::FromStr;

use crate::error::{TurnError, TurnResult};
use crate::game::Side;

/// Convert a side to its wire name
pub fn side_to_string(side: Side) -> String {
    match side {
        Side::White => "white".to_string(),
        Side::Black => "black".to_string(),
    }
}

pub fn piece_to_string(piece: Piece) -> String {
    match piece {
        Piece::Pawn => "pawn".to_string(),
        Piece::Knight => "knight".to_string(),
        Piece::Bishop => "bishop".to_string(),
        Piece::Rook => "rook".to_string(),
        Piece::Queen => "queen".to_string(),
        Piece::King => "king".to_string(),
    }
}

/// Parse a side name sent by the client ("white" or "black")
pub fn parse_side(name: &str) -> Option<Side> {
    match name.to_lowercase().as_str() {
        "white" | "w" => Some(Side::White),
        "black" | "b" => Some(Side::Black),
        _ => None,
    }
}

/// Parse a square in algebraic notation, case-insensitively
pub fn parse_square(name: &str) -> TurnResult<Square> {
    Square::from_str(&name.trim().to_lowercase()).map_err(|_| TurnError::InvalidSquare {
        square: name.to_string(),
    })
}
