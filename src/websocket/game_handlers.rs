use actix_web_actors::ws;
use log::{info, warn};

use crate::config::{parse_piece, GameConfig};
use crate::error::TurnResult;
use crate::models::*;
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "new_game" => self.handle_new_game(msg, ctx),
            "click" => self.handle_click(msg, ctx),
            "select" => self.handle_select(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "state" => self.send_state(ctx),
            other => {
                warn!("Unknown message type: {}", other);
                self.send(&ServerMessage::error(format!("Unknown message type: {}", other)), ctx);
            }
        }
    }

    /// Sends the new state after a successful action, or the reason it was refused.
    fn reply(&mut self, result: TurnResult<()>, ctx: &mut ws::WebsocketContext<Self>) {
        match result {
            Ok(()) => {
                self.send_state(ctx);
                self.flush_events(ctx);
            }
            Err(e) => {
                warn!("Session {} refused: {}", self.id, e);
                self.send(&ServerMessage::error(e), ctx);
            }
        }
    }

    pub fn handle_new_game(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let mut config = match GameConfig::default()
            .with_time_control(msg.start_time_minutes, msg.increment_seconds)
        {
            Ok(config) => config,
            Err(e) => {
                warn!("Session {} refused new game: {}", self.id, e);
                self.send(&ServerMessage::error(e), ctx);
                return;
            }
        };

        if let Some(color) = msg.computer_color.as_deref() {
            let computer = match color.to_lowercase().as_str() {
                "none" | "" => None,
                name => match parse_side(name) {
                    Some(side) => Some(side),
                    None => {
                        warn!("Unknown computer color: {}", color);
                        self.send(&ServerMessage::error(format!("Unknown color: {}", color)), ctx);
                        return;
                    }
                },
            };
            config = config.with_computer(computer);
        }

        if let Some(name) = msg.promote_to.as_deref() {
            match parse_piece(name) {
                Some(piece) => config.promotion = piece,
                None => {
                    self.send(&ServerMessage::error(format!("Cannot promote to {}", name)), ctx);
                    return;
                }
            }
        }

        self.start_game(config, ctx);
    }

    pub fn handle_click(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(square) = msg.square.as_deref() else {
            self.send(&ServerMessage::error("Click requires a square"), ctx);
            return;
        };
        let result = parse_square(square).and_then(|square| self.game_mut().click(square));
        self.reply(result, ctx);
    }

    /// Selects the piece on `square`; no square clears the selection.
    pub fn handle_select(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let result = match msg.square.as_deref() {
            Some(square) => parse_square(square).and_then(|square| self.game_mut().select(Some(square))),
            None => self.game_mut().select(None),
        };
        self.reply(result, ctx);
    }

    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (Some(from), Some(to)) = (msg.move_from.as_deref(), msg.move_to.as_deref()) else {
            self.send(&ServerMessage::error("Move requires from and to positions"), ctx);
            return;
        };

        let promotion = match msg.promote_to.as_deref() {
            Some(name) => match parse_piece(name) {
                Some(piece) => Some(piece),
                None => {
                    self.send(&ServerMessage::error(format!("Cannot promote to {}", name)), ctx);
                    return;
                }
            },
            None => None,
        };

        info!("Session {} moving {} to {}", self.id, from, to);
        let result = parse_square(from).and_then(|from| {
            let to = parse_square(to)?;
            self.game_mut().move_piece(from, to, promotion)
        });
        self.reply(result, ctx);
    }
}
