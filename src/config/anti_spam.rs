//! Flood limits applied to every queue and match WebSocket session.

/// Replies and errors a session may receive per second (snapshot fan-out excluded).
pub const MAX_RESPONSES_PER_SECOND: u32 = 20;
/// Client frames a session may send per second. A player pushes about once per second.
pub const MAX_REQUESTS_PER_SECOND: u32 = 30;
pub const BAN_DURATION_SECONDS: u64 = 300;
