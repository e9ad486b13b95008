use actix_web::{App, HttpServer};
use log::info;

use chess_turn_controller::config::ServerConfig;
use chess_turn_controller::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    info!("Starting chess turn server at http://{}", config.bind_addr);

    HttpServer::new(|| App::new().configure(configure_routes))
        .bind(&config.bind_addr)?
        .run()
        .await
}
