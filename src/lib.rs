//! A chess turn controller with clocks and a computer opponent.
//!
//! [`game::TurnController`] sequences the moves of two sides, each played by a
//! human or by the computer, keeps one countdown clock per side and runs the
//! computer's search on a background thread. The `websocket` module serves a
//! controller per connection over actix.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;

pub use error::{TurnError, TurnResult};
