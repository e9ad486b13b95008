//! Opponent move search and the background task that runs it.
//!
//! The search itself is behind [`MoveSearch`]. [`spawn_search`] runs one on a
//! worker thread against a copy of the board and hands the answer back
//! through a oneshot channel that the owner polls from its own thread.

use chess::{Board, ChessMove, Color, MoveGen, Piece, Square, EMPTY};
use futures::channel::oneshot;
use log::{debug, info};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::game::side::Side;

/// Picks a move for the side to move.
pub trait MoveSearch: Send + Sync {
    /// Returns `None` when `side` has no legal move.
    fn best_move(&self, board: &Board, side: Side, remaining: Duration) -> Option<ChessMove>;
}

const INF: i32 = 30_000;
const MATE: i32 = 29_000;
const MATE_THRESHOLD: i32 = 28_000;
const QSEARCH_MAX_PLY: u8 = 32;
/// Nodes between deadline checks.
const CHECK_INTERVAL: u64 = 1024;

fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    }
}

/// 0 on the rim up to 6 in the four center squares.
fn centrality(square: Square) -> i32 {
    let file = square.get_file().to_index() as i32;
    let rank = square.get_rank().to_index() as i32;
    6 - ((2 * file - 7).abs() + (2 * rank - 7).abs()) / 2
}

/// Material plus a small centralization bonus, from the side to move's view.
fn evaluate(board: &Board) -> i32 {
    let mut score = 0;
    for square in *board.combined() {
        let (Some(piece), Some(color)) = (board.piece_on(square), board.color_on(square)) else {
            continue;
        };
        let bonus = match piece {
            Piece::Knight | Piece::Bishop => 3 * centrality(square),
            Piece::Pawn => 2 * centrality(square),
            _ => 0,
        };
        let value = piece_value(piece) + bonus;
        if color == Color::White {
            score += value;
        } else {
            score -= value;
        }
    }
    if board.side_to_move() == Color::White {
        score
    } else {
        -score
    }
}

/// Captures first, most valuable victim first; `first` goes to the front.
fn ordered_moves(board: &Board, first: Option<ChessMove>) -> Vec<ChessMove> {
    let mut moves: Vec<(i32, ChessMove)> = MoveGen::new_legal(board)
        .map(|mv| {
            let key = if Some(mv) == first {
                INF
            } else {
                board.piece_on(mv.get_dest()).map_or(0, |victim| {
                    10 * piece_value(victim)
                        - board.piece_on(mv.get_source()).map_or(0, piece_value) / 10
                })
            };
            (key, mv)
        })
        .collect();
    moves.sort_by(|a, b| b.0.cmp(&a.0));
    moves.into_iter().map(|(_, mv)| mv).collect()
}

/// Iterative-deepening negamax with alpha-beta pruning and a capture-only
/// quiescence search.
#[derive(Debug, Clone, Default)]
pub struct AlphaBetaSearch {
    config: SearchConfig,
}

impl AlphaBetaSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }
}

impl MoveSearch for AlphaBetaSearch {
    fn best_move(&self, board: &Board, side: Side, remaining: Duration) -> Option<ChessMove> {
        debug_assert_eq!(Side::from(board.side_to_move()), side);

        let think_time = self.config.think_time(remaining);
        let mut searcher = Searcher {
            deadline: Instant::now() + think_time,
            nodes: 0,
            stopped: false,
            enforce_deadline: false,
        };

        let mut best = *ordered_moves(board, None).first()?;
        let mut depth_reached = 0;
        for depth in 1..=self.config.max_depth.max(1) {
            // Depth 1 always runs to completion so there is a move to return.
            searcher.enforce_deadline = depth > 1;
            let Some((mv, score)) = searcher.root(board, depth, best) else {
                break;
            };
            best = mv;
            depth_reached = depth;
            if score.abs() >= MATE_THRESHOLD || Instant::now() >= searcher.deadline {
                break;
            }
        }

        debug!(
            "Search for {:?} chose {} at depth {} ({} nodes, budget {:?})",
            side, best, depth_reached, searcher.nodes, think_time
        );
        Some(best)
    }
}

struct Searcher {
    deadline: Instant,
    nodes: u64,
    stopped: bool,
    enforce_deadline: bool,
}

impl Searcher {
    fn out_of_time(&mut self) -> bool {
        if self.enforce_deadline && self.nodes % CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.stopped = true;
        }
        self.stopped
    }

    /// Returns `None` if the deadline cut this depth short.
    fn root(&mut self, board: &Board, depth: u8, previous_best: ChessMove) -> Option<(ChessMove, i32)> {
        let mut alpha = -INF;
        let mut best = None;
        for mv in ordered_moves(board, Some(previous_best)) {
            let child = board.make_move_new(mv);
            let score = -self.negamax(&child, depth - 1, 1, -INF, -alpha);
            if self.stopped {
                return None;
            }
            if best.is_none() || score > alpha {
                alpha = score;
                best = Some((mv, score));
            }
        }
        best
    }

    fn negamax(&mut self, board: &Board, depth: u8, ply: u8, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0;
        }

        let moves = ordered_moves(board, None);
        if moves.is_empty() {
            return if *board.checkers() != EMPTY {
                -(MATE - ply as i32)
            } else {
                0
            };
        }

        if depth == 0 {
            return self.quiesce(board, ply, alpha, beta);
        }

        let mut best = -INF;
        for mv in moves {
            let child = board.make_move_new(mv);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha);
            if self.stopped {
                return 0;
            }
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }

    fn quiesce(&mut self, board: &Board, ply: u8, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0;
        }

        let stand_pat = evaluate(board);
        if ply >= QSEARCH_MAX_PLY || stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        let mut captures = MoveGen::new_legal(board);
        captures.set_iterator_mask(*board.color_combined(!board.side_to_move()));
        for mv in captures {
            let child = board.make_move_new(mv);
            let score = -self.quiesce(&child, ply + 1, -beta, -alpha);
            if self.stopped {
                return 0;
            }
            if score >= beta {
                return score;
            }
            alpha = alpha.max(score);
        }
        alpha
    }
}

/// What polling a pending search found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPoll {
    Pending,
    Ready(Option<ChessMove>),
    /// The worker went away without answering.
    Lost,
}

/// An opponent search running on a worker thread.
#[derive(Debug)]
pub struct PendingSearch {
    side: Side,
    started: Instant,
    receiver: oneshot::Receiver<Option<ChessMove>>,
}

impl PendingSearch {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Takes the result if the worker has delivered it. Never blocks.
    pub fn poll(&mut self) -> SearchPoll {
        match self.receiver.try_recv() {
            Ok(Some(result)) => SearchPoll::Ready(result),
            Ok(None) => SearchPoll::Pending,
            Err(oneshot::Canceled) => SearchPoll::Lost,
        }
    }
}

/// Runs `search` on its own thread against `board`.
pub fn spawn_search(
    search: Arc<dyn MoveSearch>,
    board: Board,
    side: Side,
    remaining: Duration,
) -> PendingSearch {
    info!("Searching a move for {:?} with {:?} on the clock", side, remaining);
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        let result = search.best_move(&board, side, remaining);
        let _ = tx.send(result);
    });
    PendingSearch {
        side,
        started: Instant::now(),
        receiver: rx,
    }
}
