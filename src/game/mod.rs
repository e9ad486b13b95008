pub mod clock;
pub mod controller;
pub mod events;
pub mod render;
pub mod rules;
pub mod search;
pub mod selection;
pub mod side;
pub mod status;

pub use clock::{format_clock, Clock, ClockTick};
pub use controller::{TurnController, TurnPhase};
pub use events::{EventQueue, GameEvent, GameObserver, NoopObserver};
pub use render::{render_board, Cell, SquareCategory};
pub use rules::Position;
pub use search::{spawn_search, AlphaBetaSearch, MoveSearch, PendingSearch, SearchPoll};
pub use selection::Selection;
pub use side::{PlayerKind, Side};
pub use status::{DrawReason, GameOverReason, GameStatus};
