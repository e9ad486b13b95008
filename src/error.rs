//! Errors returned by the turn controller.
//!
//! Every variant describes a request that was refused. A refused request never
//! changes game state, so callers are free to log it and carry on.

/// A refused selection, move or setup request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// The selected square is empty
    #[error("No piece on {square}")]
    NoPiece { square: String },

    /// The selected piece belongs to the side not on move
    #[error("The piece on {square} is not yours to move")]
    NotYourPiece { square: String },

    /// The side to move is played by the computer
    #[error("Not your turn")]
    NotYourTurn,

    /// A search for the opponent's move is still running
    #[error("Opponent is thinking")]
    OpponentThinking,

    /// A destination was picked before any piece was selected
    #[error("No piece selected")]
    NothingSelected,

    /// The destination is not reachable by the selected piece
    #[error("Selected piece cannot move to {square}")]
    IllegalDestination { square: String },

    /// The move is not legal in the current position
    #[error("Illegal move: {mv}")]
    IllegalMove { mv: String },

    /// The game has already ended
    #[error("Game is already over")]
    GameOver,

    /// A new game asked for a clock setting out of range
    #[error("Invalid time control: {reason}")]
    InvalidTimeControl { reason: String },

    #[error("Invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("Invalid square: {square}")]
    InvalidSquare { square: String },
}

/// Result alias for controller operations.
pub type TurnResult<T> = Result<T, TurnError>;
