// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the backend server components, including:
//! - Application state management
//! - HTTP/WebSocket routing
//! - Matchmaking (pairing queue, matched notifications)
//! - Match rooms (slot writes, snapshot fan-out)

pub mod state;
pub mod router;
pub mod matchmaking;
pub mod match_room;
pub mod session_utils;
pub mod ws_error;
pub mod anti_spam;
pub mod ws_actor_utils;
