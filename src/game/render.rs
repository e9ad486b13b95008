//! Per-square visual categories for the board view.
//!
//! The categories are decided by an ordered list of rules; the first rule that
//! matches a square wins. A square can be both a reachable destination and
//! part of the last move, and the order settles which one is shown.

use chess::{ChessMove, File, Rank, Square};
use serde::{Deserialize, Serialize};

use crate::game::selection::Selection;

/// How a square should be painted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SquareCategory {
    SelectionHighlight,
    LastMoveOrigin,
    LastMoveDestination,
    Light,
    Dark,
}

/// Everything the projection looks at besides the square itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub selection: &'a Selection,
    pub last_move: Option<ChessMove>,
    /// While the computer is on move its reply is pending, and the previous
    /// last-move highlight would be stale.
    pub computer_to_move: bool,
}

/// A square in screen coordinates: row 0 is rank 8, column 0 is file a.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn square(self) -> Square {
        Square::make_square(Rank::from_index(7 - self.row), File::from_index(self.col))
    }

    pub fn from_square(square: Square) -> Self {
        Self {
            row: 7 - square.get_rank().to_index(),
            col: square.get_file().to_index(),
        }
    }
}

type Rule = fn(&RenderInput<'_>, Cell) -> Option<SquareCategory>;

/// Highest priority first.
const RULES: [Rule; 3] = [selection_highlight, last_move_origin, last_move_destination];

fn selection_highlight(input: &RenderInput<'_>, cell: Cell) -> Option<SquareCategory> {
    input
        .selection
        .can_reach(cell.square())
        .then_some(SquareCategory::SelectionHighlight)
}

fn visible_last_move(input: &RenderInput<'_>) -> Option<ChessMove> {
    if input.computer_to_move {
        None
    } else {
        input.last_move
    }
}

fn last_move_origin(input: &RenderInput<'_>, cell: Cell) -> Option<SquareCategory> {
    let mv = visible_last_move(input)?;
    (mv.get_source() == cell.square()).then_some(SquareCategory::LastMoveOrigin)
}

fn last_move_destination(input: &RenderInput<'_>, cell: Cell) -> Option<SquareCategory> {
    let mv = visible_last_move(input)?;
    (mv.get_dest() == cell.square()).then_some(SquareCategory::LastMoveDestination)
}

fn checkerboard(cell: Cell) -> SquareCategory {
    if (cell.row + cell.col) % 2 == 0 {
        SquareCategory::Light
    } else {
        SquareCategory::Dark
    }
}

pub fn project(input: &RenderInput<'_>, cell: Cell) -> SquareCategory {
    RULES
        .iter()
        .find_map(|rule| rule(input, cell))
        .unwrap_or_else(|| checkerboard(cell))
}

/// All 64 squares, row by row from the top of the screen.
pub fn render_board(input: &RenderInput<'_>) -> [[SquareCategory; 8]; 8] {
    let mut grid = [[SquareCategory::Light; 8]; 8];
    for (row, line) in grid.iter_mut().enumerate() {
        for (col, category) in line.iter_mut().enumerate() {
            *category = project(input, Cell { row, col });
        }
    }
    grid
}
