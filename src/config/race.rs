//! Race configuration constants.
//!
//! This module defines the timing of the per-match client state machine
//! (countdown, sync tick, respawn, opponent silence) and the result bonus table.

use std::time::Duration;

use crate::config::matchmaking::MAX_LIVES;

/// Number of countdown steps before GO (3, 2, 1).
pub const COUNTDOWN_TICKS: u8 = 3;

/// Duration (in milliseconds) of one countdown step.
pub const COUNTDOWN_STEP_MS: u64 = 1000;

/// Interval (in milliseconds) between two pushes of the local slot.
pub const SYNC_INTERVAL_MS: u64 = 1000;

/// Delay (in milliseconds) between a collision and the respawn.
pub const RESPAWN_DELAY_MS: u64 = 600;

/// Interval (in milliseconds) at which the client advances its state machine.
pub const FRAME_INTERVAL_MS: u64 = 50;

/// Time (in seconds) without an opponent heartbeat before the match is declared abandoned.
pub const SILENCE_WINDOW_SECS: u64 = 15;

/// Bonus awarded to the winner.
pub const WIN_BONUS: u64 = 1000;

/// Bonus awarded to both players on a tie.
pub const TIE_BONUS: u64 = 500;

/// Bonus awarded to the loser.
pub const LOSS_BONUS: u64 = 0;

/// Runtime view of the race constants, overridable by tests and the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceConfig {
    pub max_lives: u32,
    pub countdown_ticks: u8,
    pub countdown_step: Duration,
    pub sync_interval: Duration,
    pub respawn_delay: Duration,
    pub frame_interval: Duration,
    pub silence_window: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            max_lives: MAX_LIVES,
            countdown_ticks: COUNTDOWN_TICKS,
            countdown_step: Duration::from_millis(COUNTDOWN_STEP_MS),
            sync_interval: Duration::from_millis(SYNC_INTERVAL_MS),
            respawn_delay: Duration::from_millis(RESPAWN_DELAY_MS),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            silence_window: Duration::from_secs(SILENCE_WINDOW_SECS),
        }
    }
}
