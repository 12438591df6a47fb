//! Server configuration constants.

/// Address the HTTP/WebSocket server binds to by default.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Environment variable overriding the bind address.
pub const BIND_ADDR_ENV: &str = "RUNNER_RACE_BIND";

/// Read the bind address from the environment, falling back to the default.
pub fn bind_addr() -> String {
    std::env::var(BIND_ADDR_ENV)
        .ok()
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}
