//! Adapter over the `chess` crate's rules engine.
//!
//! [`Position`] is the live board plus the history the board itself does not
//! keep: the moves played, the position hashes for repetition and the
//! half-move clock for the fifty-move rule.

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, EMPTY};
use std::str::FromStr;

use crate::error::{TurnError, TurnResult};
use crate::game::side::Side;
use crate::game::status::{DrawReason, GameOverReason};

/// A move as it was played, with what it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedMove {
    pub mv: ChessMove,
    pub piece: Piece,
    pub side: Side,
    pub captured: Option<Piece>,
}

#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    history: Vec<PlayedMove>,
    hashes: Vec<u64>,
    halfmove_clock: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_board(Board::default(), 0)
    }
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> TurnResult<Self> {
        let board = Board::from_str(fen).map_err(|_| TurnError::InvalidFen {
            fen: fen.to_string(),
        })?;
        let halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|field| field.parse().ok())
            .unwrap_or(0);
        Ok(Self::from_board(board, halfmove_clock))
    }

    fn from_board(board: Board, halfmove_clock: u32) -> Self {
        Self {
            board,
            history: Vec::new(),
            hashes: vec![board.get_hash()],
            halfmove_clock,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// An independent copy of the board for work off the coordinating thread.
    pub fn snapshot(&self) -> Board {
        self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.board.side_to_move().into()
    }

    pub fn piece_at(&self, square: Square) -> Option<(Piece, Side)> {
        let piece = self.board.piece_on(square)?;
        let color = self.board.color_on(square)?;
        Some((piece, color.into()))
    }

    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.history.last().map(|played| played.mv)
    }

    /// Legal moves of the piece standing on `square`.
    pub fn legal_moves_from(&self, square: Square) -> impl Iterator<Item = ChessMove> {
        MoveGen::new_legal(&self.board).filter(move |mv| mv.get_source() == square)
    }

    /// Destination squares of the legal moves of the piece on `square`.
    pub fn destinations_from(&self, square: Square) -> BitBoard {
        self.legal_moves_from(square)
            .fold(EMPTY, |acc, mv| acc | BitBoard::from_square(mv.get_dest()))
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board.legal(mv)
    }

    /// Plays `mv`, hands the turn to the other side and records the move.
    /// Returns the captured piece, if any.
    pub fn apply(&mut self, mv: ChessMove) -> TurnResult<Option<Piece>> {
        if !self.is_legal(mv) {
            return Err(TurnError::IllegalMove { mv: mv.to_string() });
        }
        let piece = self
            .board
            .piece_on(mv.get_source())
            .ok_or_else(|| TurnError::IllegalMove { mv: mv.to_string() })?;
        let side = self.side_to_move();
        let captured = self.captured_by(mv, piece);

        self.board = self.board.make_move_new(mv);

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.hashes.push(self.board.get_hash());
        self.history.push(PlayedMove {
            mv,
            piece,
            side,
            captured,
        });

        Ok(captured)
    }

    fn captured_by(&self, mv: ChessMove, piece: Piece) -> Option<Piece> {
        if let Some(taken) = self.board.piece_on(mv.get_dest()) {
            return Some(taken);
        }
        // A pawn moving diagonally onto an empty square takes en passant
        let diagonal = mv.get_source().get_file() != mv.get_dest().get_file();
        if piece == Piece::Pawn && diagonal {
            return Some(Piece::Pawn);
        }
        None
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.board.status() == BoardStatus::Stalemate {
            Some(DrawReason::Stalemate)
        } else if has_insufficient_material(&self.board) {
            Some(DrawReason::InsufficientMaterial)
        } else if self.halfmove_clock >= 100 {
            Some(DrawReason::FiftyMoveRule)
        } else if self.repetitions() >= 3 {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn repetitions(&self) -> usize {
        let current = self.board.get_hash();
        self.hashes.iter().filter(|&&hash| hash == current).count()
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// How the game ended for the side to move, if it did.
    pub fn outcome(&self) -> Option<GameOverReason> {
        if self.is_checkmate() {
            return Some(GameOverReason::Checkmate {
                winner: self.side_to_move().opposite(),
            });
        }
        self.draw_reason()
            .map(|reason| GameOverReason::Draw { reason })
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }

    let kings = *board.pieces(Piece::King);
    let white_minors = *board.color_combined(Color::White) & !kings;
    let black_minors = *board.color_combined(Color::Black) & !kings;

    match (white_minors.popcnt(), black_minors.popcnt()) {
        // King vs king, or a lone minor piece against a bare king
        (0, 0) | (1, 0) | (0, 1) => true,
        // Bishop vs bishop on the same square color
        (1, 1) => {
            let bishops = *board.pieces(Piece::Bishop);
            if white_minors & bishops == EMPTY || black_minors & bishops == EMPTY {
                return false;
            }
            square_shade(white_minors.to_square()) == square_shade(black_minors.to_square())
        }
        _ => false,
    }
}

fn square_shade(square: Square) -> usize {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: Square, to: Square) -> ChessMove {
        ChessMove::new(from, to, None)
    }

    #[test]
    fn pawn_on_e2_reaches_e3_and_e4() {
        let position = Position::new();
        let reachable = position.destinations_from(Square::E2);
        assert_eq!(
            reachable,
            BitBoard::from_square(Square::E3) | BitBoard::from_square(Square::E4)
        );
    }

    #[test]
    fn apply_switches_side_and_records_history() {
        let mut position = Position::new();
        let captured = position.apply(mv(Square::E2, Square::E4)).unwrap();
        assert_eq!(captured, None);
        assert_eq!(position.side_to_move(), Side::Black);
        assert_eq!(position.last_move(), Some(mv(Square::E2, Square::E4)));
        assert_eq!(position.history()[0].piece, Piece::Pawn);
        assert_eq!(position.history()[0].side, Side::White);
    }

    #[test]
    fn illegal_moves_are_refused_without_change() {
        let mut position = Position::new();
        let result = position.apply(mv(Square::E2, Square::E5));
        assert!(matches!(result, Err(TurnError::IllegalMove { .. })));
        assert_eq!(position.side_to_move(), Side::White);
        assert!(position.history().is_empty());
    }

    #[test]
    fn reports_captured_piece() {
        let mut position = Position::new();
        position.apply(mv(Square::E2, Square::E4)).unwrap();
        position.apply(mv(Square::D7, Square::D5)).unwrap();
        let captured = position.apply(mv(Square::E4, Square::D5)).unwrap();
        assert_eq!(captured, Some(Piece::Pawn));
    }

    #[test]
    fn en_passant_captures_a_pawn() {
        let mut position =
            Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let captured = position.apply(mv(Square::E5, Square::D6)).unwrap();
        assert_eq!(captured, Some(Piece::Pawn));
        assert_eq!(position.piece_at(Square::D5), None);
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let mut position = Position::new();
        position.apply(mv(Square::F2, Square::F3)).unwrap();
        position.apply(mv(Square::E7, Square::E5)).unwrap();
        position.apply(mv(Square::G2, Square::G4)).unwrap();
        assert!(!position.is_game_over());
        position.apply(mv(Square::D8, Square::H4)).unwrap();
        assert!(position.is_checkmate());
        assert!(position.is_game_over());
        assert_eq!(
            position.outcome(),
            Some(GameOverReason::Checkmate { winner: Side::Black })
        );
    }

    #[test]
    fn stalemate_is_a_draw() {
        let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!position.is_checkmate());
        assert_eq!(position.draw_reason(), Some(DrawReason::Stalemate));
    }

    #[test]
    fn bare_kings_are_insufficient_material() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(position.draw_reason(), Some(DrawReason::InsufficientMaterial));
    }

    #[test]
    fn insufficient_material_cases() {
        let board = |fen: &str| Board::from_str(fen).unwrap();
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")));
        assert!(has_insufficient_material(&board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/4KR2 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/3NKN2 w - - 0 1")));
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn fifty_quiet_moves_are_a_draw() {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
        assert_eq!(position.draw_reason(), None);
        position.apply(mv(Square::A1, Square::A2)).unwrap();
        assert_eq!(position.draw_reason(), Some(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let mut position = Position::new();
        let shuffle = [
            mv(Square::G1, Square::F3),
            mv(Square::G8, Square::F6),
            mv(Square::F3, Square::G1),
            mv(Square::F6, Square::G8),
        ];
        for m in shuffle.iter().chain(shuffle.iter()) {
            assert_eq!(position.draw_reason(), None);
            position.apply(*m).unwrap();
        }
        assert_eq!(position.draw_reason(), Some(DrawReason::ThreefoldRepetition));
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(matches!(
            Position::from_fen("not a fen"),
            Err(TurnError::InvalidFen { .. })
        ));
    }
}
