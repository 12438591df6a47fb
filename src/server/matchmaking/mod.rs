/// Matchmaking module: the pairing queue and its WebSocket sessions.

pub mod server;
pub mod session;
pub mod messages;
