/// Match room module: one actor per match document, its registry, and the per-client sessions.

pub mod server;
pub mod session;
pub mod messages;
