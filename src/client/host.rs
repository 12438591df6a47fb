//! What the sync client needs from the game embedding it.

use log::info;

use crate::config::race::RaceConfig;
use crate::race::reducer::OpponentView;
use crate::race::result::MatchResult;
use crate::race::rewards::{PlayerRecord, RewardLedger};
use crate::race::state_machine::RacePhase;

/// Callbacks into the game (HUD, result screen). All optional.
pub trait RaceHost {
    fn phase_changed(&mut self, _phase: RacePhase) {}

    fn opponent_updated(&mut self, _opponent: &OpponentView) {}

    /// Called once per match, after the ledger settled it.
    fn result_ready(&mut self, _result: &MatchResult, _record: &PlayerRecord) {}
}

/// Host that only logs. Used by the demo.
pub struct LoggingHost {
    pub label: String,
}

impl LoggingHost {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl RaceHost for LoggingHost {
    fn phase_changed(&mut self, phase: RacePhase) {
        info!("[{}] Phase {:?}", self.label, phase);
    }

    fn result_ready(&mut self, result: &MatchResult, record: &PlayerRecord) {
        info!(
            "[{}] {} (+{} bonus, high score {})",
            self.label, result, result.bonus, record.high_score
        );
    }
}

/// Everything a sync client depends on, passed in at construction.
pub struct RaceContext {
    pub host: Box<dyn RaceHost>,
    pub ledger: RewardLedger,
    pub config: RaceConfig,
}

impl RaceContext {
    pub fn new(host: Box<dyn RaceHost>, ledger: RewardLedger, config: RaceConfig) -> Self {
        Self { host, ledger, config }
    }
}
