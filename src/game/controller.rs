//! The turn controller.
//!
//! Owns the position, one clock per side, the selection and the game status,
//! and is the only thing that advances the turn. Computer moves are searched
//! on a worker thread; the owner of the controller calls [`TurnController::tick`]
//! and [`TurnController::poll_opponent`] from a single coordinating thread, so
//! a finished search is only ever applied between ticks, never alongside one.

use chess::{ChessMove, Piece, Square};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::config::GameConfig;
use crate::error::{TurnError, TurnResult};
use crate::game::clock::{format_clock, Clock, ClockTick};
use crate::game::events::GameObserver;
use crate::game::render::{render_board, RenderInput, SquareCategory};
use crate::game::rules::Position;
use crate::game::search::{spawn_search, MoveSearch, PendingSearch, SearchPoll};
use crate::game::selection::Selection;
use crate::game::side::{PlayerKind, Side};
use crate::game::status::{DrawReason, GameOverReason, GameStatus};

/// Times a search that died without answering is started again for the same
/// move before the game is ended.
const MAX_SEARCH_RESTARTS: u8 = 1;

/// Where the controller is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingSelection,
    AwaitingDestination,
    ComputingOpponentMove,
    GameOver,
}

pub struct TurnController<O: GameObserver> {
    config: GameConfig,
    position: Position,
    clocks: [Clock; 2],
    selection: Selection,
    status: GameStatus,
    pending: Option<PendingSearch>,
    search: Arc<dyn MoveSearch>,
    observer: O,
    started: bool,
    search_restarts: u8,
}

impl<O: GameObserver> TurnController<O> {
    /// A controller for a game from the standard starting position.
    pub fn new(config: GameConfig, search: Arc<dyn MoveSearch>, observer: O) -> Self {
        Self::with_position(config, Position::new(), search, observer)
    }

    pub fn with_position(
        config: GameConfig,
        position: Position,
        search: Arc<dyn MoveSearch>,
        observer: O,
    ) -> Self {
        let start_time = config.start_time();
        let status = position.outcome().map_or(GameStatus::InProgress, GameStatus::Over);
        Self {
            config,
            position,
            clocks: [Clock::new(start_time), Clock::new(start_time)],
            selection: Selection::default(),
            status,
            pending: None,
            search,
            observer,
            started: false,
            search_restarts: 0,
        }
    }

    /// Starts the clock of the side to move and, if that side is played by
    /// the computer, its search. Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started || self.status.is_over() {
            return;
        }
        self.started = true;

        let side = self.active_side();
        info!("Game started, {:?} to move", side);
        self.clocks[side.index()].start();
        self.dispatch_if_computer();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The side whose clock runs and who moves next.
    pub fn active_side(&self) -> Side {
        self.position.side_to_move()
    }

    pub fn clock(&self, side: Side) -> &Clock {
        &self.clocks[side.index()]
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.position.last_move()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn is_computer_to_move(&self) -> bool {
        self.config.player(self.active_side()) == PlayerKind::Computer
    }

    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn phase(&self) -> TurnPhase {
        if self.status.is_over() {
            TurnPhase::GameOver
        } else if self.pending.is_some() || self.is_computer_to_move() {
            TurnPhase::ComputingOpponentMove
        } else if !self.selection.is_empty() {
            TurnPhase::AwaitingDestination
        } else {
            TurnPhase::AwaitingSelection
        }
    }

    /// Visual category of every square, row 0 being rank 8.
    pub fn render(&self) -> [[SquareCategory; 8]; 8] {
        render_board(&RenderInput {
            selection: &self.selection,
            last_move: self.position.last_move(),
            computer_to_move: self.is_computer_to_move() && !self.status.is_over(),
        })
    }

    fn ensure_human_turn(&self) -> TurnResult<()> {
        if self.status.is_over() {
            return Err(TurnError::GameOver);
        }
        if self.pending.is_some() {
            return Err(TurnError::OpponentThinking);
        }
        if self.is_computer_to_move() {
            return Err(TurnError::NotYourTurn);
        }
        Ok(())
    }

    /// Picks up the piece on `square`, or puts down the current one for `None`.
    pub fn select(&mut self, square: Option<Square>) -> TurnResult<()> {
        let Some(square) = square else {
            self.selection.clear();
            return Ok(());
        };
        self.ensure_human_turn()?;

        match self.position.piece_at(square) {
            None => Err(TurnError::NoPiece {
                square: square.to_string(),
            }),
            Some((_, side)) if side != self.active_side() => Err(TurnError::NotYourPiece {
                square: square.to_string(),
            }),
            Some((piece, side)) => {
                self.selection.select(Some(square), &self.position);
                debug!(
                    "{:?} selected {:?} on {} ({} destinations)",
                    side,
                    piece,
                    square,
                    self.selection.reachable().popcnt()
                );
                Ok(())
            }
        }
    }

    /// Moves the selected piece to `dest`, promoting to the configured piece.
    pub fn move_selected(&mut self, dest: Square) -> TurnResult<()> {
        self.move_selected_with(dest, None)
    }

    pub fn move_selected_with(&mut self, dest: Square, promotion: Option<Piece>) -> TurnResult<()> {
        self.ensure_human_turn()?;
        let from = self.selection.selected().ok_or(TurnError::NothingSelected)?;
        let illegal = || TurnError::IllegalDestination {
            square: dest.to_string(),
        };
        if !self.selection.can_reach(dest) {
            return Err(illegal());
        }

        let promotion = promotion.unwrap_or(self.config.promotion);
        let mv = self
            .position
            .legal_moves_from(from)
            .filter(|mv| mv.get_dest() == dest)
            .find(|mv| mv.get_promotion().map_or(true, |piece| piece == promotion))
            .ok_or_else(illegal)?;
        self.pass_turn(mv)
    }

    /// Picks up the piece on `from` and moves it to `dest` in one step. On
    /// failure the previous selection is put back.
    pub fn move_piece(
        &mut self,
        from: Square,
        dest: Square,
        promotion: Option<Piece>,
    ) -> TurnResult<()> {
        let previous = self.selection.clone();
        let result = self
            .select(Some(from))
            .and_then(|()| self.move_selected_with(dest, promotion));
        if result.is_err() {
            self.selection = previous;
        }
        result
    }

    /// Two-click interaction: a reachable square moves the selected piece,
    /// one of the mover's own pieces (re)selects it.
    pub fn click(&mut self, square: Square) -> TurnResult<()> {
        self.ensure_human_turn()?;
        if self.selection.can_reach(square) {
            return self.move_selected(square);
        }

        match self.position.piece_at(square) {
            Some((_, side)) if side == self.active_side() => self.select(Some(square)),
            _ if self.selection.is_empty() => self.select(Some(square)),
            _ => Err(TurnError::IllegalDestination {
                square: square.to_string(),
            }),
        }
    }

    /// Plays `mv` for the side to move, whoever controls it.
    ///
    /// Refused while a search is in flight, since its answer is for the
    /// current position.
    pub fn apply_move(&mut self, mv: ChessMove) -> TurnResult<()> {
        if self.status.is_over() {
            return Err(TurnError::GameOver);
        }
        if self.pending.is_some() {
            return Err(TurnError::OpponentThinking);
        }
        self.pass_turn(mv)
    }

    fn pass_turn(&mut self, mv: ChessMove) -> TurnResult<()> {
        if self.status.is_over() {
            return Err(TurnError::GameOver);
        }
        let mover = self.active_side();
        let captured = self.position.apply(mv)?;
        self.started = true;
        self.selection.clear();
        info!("{:?} played {}", mover, mv);

        if let Some(piece) = captured {
            self.observer.piece_captured(piece, mover.opposite());
        }

        if let Some(reason) = self.position.outcome() {
            self.finish(reason);
            return Ok(());
        }

        let increment = self.config.increment();
        let clock = &mut self.clocks[mover.index()];
        if !clock.is_paused() {
            clock.pause();
        }
        clock.add_increment(increment);
        self.clocks[mover.opposite().index()].start();

        self.dispatch_if_computer();
        Ok(())
    }

    fn dispatch_if_computer(&mut self) {
        if self.status.is_over() || self.pending.is_some() || !self.is_computer_to_move() {
            return;
        }
        let side = self.active_side();
        let remaining = self.clocks[side.index()].remaining();
        self.pending = Some(spawn_search(
            Arc::clone(&self.search),
            self.position.snapshot(),
            side,
            remaining,
        ));
    }

    /// Advances the running clock by `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.status.is_over() {
            return;
        }
        let side = self.active_side();
        match self.clocks[side.index()].tick(elapsed) {
            ClockTick::Idle => {}
            ClockTick::Running(remaining) => {
                self.observer
                    .clock_changed(side, remaining, &format_clock(remaining));
            }
            ClockTick::Expired => {
                self.observer
                    .clock_changed(side, Duration::ZERO, &format_clock(Duration::ZERO));
                warn!("{:?} ran out of time", side);
                self.finish(GameOverReason::Timeout { loser: side });
            }
        }
    }

    /// Takes the result of the pending search if it is ready. Returns whether
    /// a result was taken, applied or not.
    pub fn poll_opponent(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let side = pending.side();

        match pending.poll() {
            SearchPoll::Pending => false,
            SearchPoll::Ready(result) => {
                let elapsed = pending.elapsed();
                self.pending = None;
                self.search_restarts = 0;
                debug!("Search for {:?} answered after {:?}", side, elapsed);
                self.deliver(side, result);
                true
            }
            SearchPoll::Lost => {
                self.pending = None;
                if self.search_restarts < MAX_SEARCH_RESTARTS {
                    self.search_restarts += 1;
                    error!("Search for {:?} stopped without a result, searching again", side);
                    self.dispatch_if_computer();
                } else {
                    error!("Search for {:?} stopped without a result again, ending the game", side);
                    self.search_restarts = 0;
                    if !self.status.is_over() {
                        self.finish(self.no_move_outcome());
                    }
                }
                false
            }
        }
    }

    fn deliver(&mut self, side: Side, result: Option<ChessMove>) {
        if self.status.is_over() {
            debug!("Discarding {:?}'s move, the game is already over", side);
            return;
        }

        match result {
            None => {
                if self.position.is_game_over() {
                    info!("No move available for {:?}", side);
                } else {
                    warn!("Search for {:?} gave up with legal moves left", side);
                }
                self.finish(self.no_move_outcome());
            }
            Some(mv) => {
                if let Err(err) = self.pass_turn(mv) {
                    error!("Search for {:?} returned an unplayable move: {}", side, err);
                    self.finish(self.no_move_outcome());
                }
            }
        }
    }

    fn no_move_outcome(&self) -> GameOverReason {
        self.position.outcome().unwrap_or(GameOverReason::Draw {
            reason: DrawReason::Stalemate,
        })
    }

    fn finish(&mut self, reason: GameOverReason) {
        if self.status.is_over() {
            return;
        }
        self.status = GameStatus::Over(reason);
        for clock in &mut self.clocks {
            clock.cancel();
        }
        info!("Game over: {}", reason);
        self.observer.game_over(reason);
    }
}
