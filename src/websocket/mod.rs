mod game_handlers;
mod handler;

pub use handler::{ws_index, ChessWebSocket};
