use std::time::{Instant, Duration};
use log::{warn, info};

use crate::config::anti_spam::{MAX_RESPONSES_PER_SECOND, MAX_REQUESTS_PER_SECOND, BAN_DURATION_SECONDS};

/// Tracks anti-spam state for a single WebSocket session (queue, player or spectator).
pub struct AntiSpamState {
    // Last error code sent (for suppression)
    last_error_code: Option<String>,
    // Start of the current one-second window
    window_start: Instant,
    responses_in_window: u32,
    requests_in_window: u32,
    banned_until: Option<Instant>,
}

impl Default for AntiSpamState {
    fn default() -> Self {
        Self::new()
    }
}

impl AntiSpamState {
    pub fn new() -> Self {
        Self {
            last_error_code: None,
            window_start: Instant::now(),
            responses_in_window: 0,
            requests_in_window: 0,
            banned_until: None,
        }
    }

    /// Call at the start of every incoming message.
    /// Returns true if the session is (now) banned.
    pub fn record_request(&mut self, client_id: &str) -> bool {
        self.roll_window(Instant::now());
        self.requests_in_window += 1;
        if self.requests_in_window > MAX_REQUESTS_PER_SECOND {
            self.ban(client_id, "Too many requests per second");
            return true;
        }
        self.is_banned()
    }

    /// Call before every outgoing reply or error.
    /// Snapshot fan-out is not counted: it is driven by the opponent, not by this client.
    pub fn record_response(&mut self, client_id: &str) -> bool {
        self.roll_window(Instant::now());
        self.responses_in_window += 1;
        if self.responses_in_window > MAX_RESPONSES_PER_SECOND {
            self.ban(client_id, "Too many responses per second");
            return true;
        }
        self.is_banned()
    }

    /// Returns true if the error should be sent (not a repeat of the last one).
    pub fn should_send_error(&mut self, error_code: &str, client_id: &str) -> bool {
        if self.last_error_code.as_deref() == Some(error_code) {
            warn!("[AntiSpam] Suppressed duplicate error '{}' for client={}", error_code, client_id);
            return false;
        }
        self.last_error_code = Some(error_code.to_string());
        true
    }

    /// Call when a valid, state-changing message was processed.
    pub fn reset_on_valid_action(&mut self) {
        self.last_error_code = None;
    }

    pub fn is_banned(&self) -> bool {
        self.banned_until.is_some_and(|until| Instant::now() < until)
    }

    /// Remaining ban duration in seconds, or 0 if not banned.
    pub fn ban_remaining_secs(&self) -> u64 {
        self.banned_until
            .map(|until| until.saturating_duration_since(Instant::now()).as_secs())
            .unwrap_or(0)
    }

    fn ban(&mut self, client_id: &str, reason: &str) {
        let until = Instant::now() + Duration::from_secs(BAN_DURATION_SECONDS);
        self.banned_until = Some(until);
        warn!("[AntiSpam] Banned client={} for {}s, reason: {}", client_id, BAN_DURATION_SECONDS, reason);
    }

    fn roll_window(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= Duration::from_secs(1) {
            if self.requests_in_window > MAX_REQUESTS_PER_SECOND / 2 {
                info!("[AntiSpam] Busy window: {} requests", self.requests_in_window);
            }
            self.window_start = now;
            self.responses_in_window = 0;
            self.requests_in_window = 0;
        }
    }
}
