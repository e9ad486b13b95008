use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::{AlphaBetaSearch, EventQueue, GameEvent, TurnController};
use crate::models::*;

/// WebSocket session playing one game at a time against the browser
pub struct ChessWebSocket {
    pub id: String,
    game: TurnController<EventQueue>,
    ticker: Option<SpawnHandle>,
    last_tick: Instant,
    /// Last clock text sent per side, so unchanged displays are not resent
    sent_clocks: [Option<String>; 2],
}

impl ChessWebSocket {
    pub fn new(id: String) -> Self {
        Self {
            id,
            game: new_controller(GameConfig::default()),
            ticker: None,
            last_tick: Instant::now(),
            sent_clocks: [None, None],
        }
    }

    pub fn game_mut(&mut self) -> &mut TurnController<EventQueue> {
        &mut self.game
    }

    /// Replaces the current game and starts its clocks.
    pub fn start_game(&mut self, config: GameConfig, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.ticker.take() {
            ctx.cancel_future(handle);
        }

        let interval = config.tick_interval();
        info!(
            "Session {} starting a game: white {:?}, black {:?}, {} ms + {} ms",
            self.id, config.white, config.black, config.start_time_ms, config.increment_ms
        );
        self.game = new_controller(config);
        self.sent_clocks = [None, None];
        self.last_tick = Instant::now();
        self.game.start();

        self.ticker = Some(ctx.run_interval(interval, |act, ctx| act.on_tick(ctx)));
        self.send_state(ctx);
    }

    /// Advances the clocks, then takes the computer's move if it is ready.
    /// Doing both in this order means an expiry always lands before a late move.
    fn on_tick(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;

        self.game.tick(elapsed);
        let delivered = self.game.poll_opponent();
        if delivered {
            debug!("Session {} received the computer's move", self.id);
            self.send_state(ctx);
        }
        self.flush_events(ctx);
    }

    /// Forwards the controller's buffered notifications to the client.
    pub fn flush_events(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        for event in self.game.observer_mut().drain() {
            match event {
                GameEvent::Clock {
                    side,
                    remaining,
                    display,
                } => {
                    if self.sent_clocks[side.index()].as_deref() == Some(display.as_str()) {
                        continue;
                    }
                    self.send(&ServerMessage::clock(side, remaining, &display), ctx);
                    self.sent_clocks[side.index()] = Some(display);
                }
                GameEvent::Captured { piece, side } => {
                    self.send(&ServerMessage::captured(piece, side), ctx);
                }
                GameEvent::GameOver(reason) => {
                    info!("Session {}: {}", self.id, reason);
                    let status = self.game.status().label(self.game.active_side());
                    self.send(&ServerMessage::game_over(reason, status), ctx);
                    self.send_state(ctx);
                }
            }
        }
    }

    pub fn send_state(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let state = ServerMessage::state(&self.game);
        self.sent_clocks = [state.white_clock.clone(), state.black_clock.clone()];
        self.send(&state, ctx);
    }

    pub fn send(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing {} message: {}", message.message_type, e),
        }
    }
}

fn new_controller(config: GameConfig) -> TurnController<EventQueue> {
    let search = Arc::new(AlphaBetaSearch::new(config.search.clone()));
    TurnController::new(config, search, EventQueue::default())
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.id);
        self.start_game(GameConfig::default(), ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self.game.is_searching() {
            debug!("Session {} closing with a search still running", self.id);
        }
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(&ServerMessage::error(format!("Invalid message format: {}", e)), ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(&ServerMessage::error("Binary messages are not supported"), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(req: HttpRequest, stream: web::Payload) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);
    ws::start(ChessWebSocket::new(id), &req, stream)
}
