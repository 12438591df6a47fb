//! Main entry point for the race backend.
//!
//! Initializes the actor system, configures application state, and launches the HTTP server
//! with WebSocket endpoints for the pairing queue and match rooms.
//! `runner-race demo` races two simulated runners in-process instead.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use server::matchmaking::server::MatchmakingServer;
use server::match_room::server::MatchRegistry;

pub mod config;
mod client;
mod demo;
mod error;
mod race;
mod server;
mod utils;


#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (RUST_LOG).
    env_logger::init();

    if std::env::args().nth(1).as_deref() == Some("demo") {
        demo::standalone::run().await.map_err(std::io::Error::other)?;
        return Ok(());
    }

    // Start the MatchRegistry actor (owns every match room).
    let registry = MatchRegistry::new(config::matchmaking::MAX_LIVES).start();

    // Start the MatchmakingServer actor (owns the pairing queue).
    let matchmaking_addr = MatchmakingServer::new(registry.clone()).start();

    // Shared application state for HTTP/WebSocket handlers.
    let state = web::Data::new(server::state::AppState::new(matchmaking_addr, registry));

    let bind_addr = config::server::bind_addr();
    info!("[Server] Listening on {}", bind_addr);

    // Start the HTTP server with WebSocket endpoints.
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
