// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds references to the main actor addresses (matchmaking and match registry).

use actix::Addr;
use crate::server::matchmaking::server::MatchmakingServer;
use crate::server::match_room::server::MatchRegistry;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the matchmaking server actor (pairing queue).
    pub matchmaking_addr: Addr<MatchmakingServer>,
    /// Address of the registry owning every live match room.
    pub registry: Addr<MatchRegistry>,
}

impl AppState {
    pub fn new(matchmaking_addr: Addr<MatchmakingServer>, registry: Addr<MatchRegistry>) -> Self {
        AppState {
            matchmaking_addr,
            registry,
        }
    }
}
