//! Per-player reward bookkeeping. Each match settles at most once.

use std::collections::HashSet;
use serde::{Serialize, Deserialize};

use super::result::{MatchResult, Outcome};
use super::types::MatchId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub high_score: u64,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub forfeit_wins: u32,
    pub bonus_total: u64,
}

impl PlayerRecord {
    /// Merge another copy of the record, keeping the higher value of every field.
    pub fn merge(&mut self, other: &PlayerRecord) {
        self.high_score = self.high_score.max(other.high_score);
        self.wins = self.wins.max(other.wins);
        self.losses = self.losses.max(other.losses);
        self.ties = self.ties.max(other.ties);
        self.forfeit_wins = self.forfeit_wins.max(other.forfeit_wins);
        self.bonus_total = self.bonus_total.max(other.bonus_total);
    }
}

#[derive(Debug, Default)]
pub struct RewardLedger {
    record: PlayerRecord,
    settled: HashSet<MatchId>,
}

impl RewardLedger {
    pub fn new(record: PlayerRecord) -> Self {
        Self {
            record,
            settled: HashSet::new(),
        }
    }

    pub fn record(&self) -> &PlayerRecord {
        &self.record
    }

    pub fn is_settled(&self, match_id: &MatchId) -> bool {
        self.settled.contains(match_id)
    }

    /// Award the bonus and update totals for a result.
    /// Returns false (and changes nothing) if this match was already settled.
    pub fn settle(&mut self, result: &MatchResult) -> bool {
        if !self.settled.insert(result.match_id) {
            return false;
        }
        let final_score = result.local_score.saturating_add(result.bonus);
        self.record.high_score = self.record.high_score.max(final_score);
        self.record.bonus_total = self.record.bonus_total.saturating_add(result.bonus);
        match result.outcome {
            Outcome::Win => {
                self.record.wins += 1;
                if result.forfeit {
                    self.record.forfeit_wins += 1;
                }
            }
            Outcome::Loss => self.record.losses += 1,
            Outcome::Tie => self.record.ties += 1,
        }
        true
    }

    pub fn merge(&mut self, other: &PlayerRecord) {
        self.record.merge(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::types::Role;
    use uuid::Uuid;

    #[test]
    fn test_settle_is_idempotent() {
        let mut ledger = RewardLedger::default();
        let result = MatchResult::from_scores(Uuid::new_v4(), Role::Player1, 12000, 9500);
        assert!(!ledger.is_settled(&result.match_id));
        assert!(ledger.settle(&result));
        assert!(ledger.is_settled(&result.match_id));
        assert!(!ledger.settle(&result));
        assert_eq!(ledger.record().wins, 1);
        assert_eq!(ledger.record().bonus_total, 1000);
        assert_eq!(ledger.record().high_score, 13000);
    }

    #[test]
    fn test_high_score_keeps_best() {
        let mut ledger = RewardLedger::new(PlayerRecord { high_score: 50_000, ..Default::default() });
        ledger.settle(&MatchResult::from_scores(Uuid::new_v4(), Role::Player2, 300, 300));
        assert_eq!(ledger.record().high_score, 50_000);
        assert_eq!(ledger.record().ties, 1);
        assert_eq!(ledger.record().bonus_total, 500);
    }

    #[test]
    fn test_merge_takes_higher() {
        let mut ledger = RewardLedger::new(PlayerRecord { high_score: 10, wins: 4, ..Default::default() });
        ledger.merge(&PlayerRecord { high_score: 99, wins: 1, losses: 2, ..Default::default() });
        assert_eq!(ledger.record().high_score, 99);
        assert_eq!(ledger.record().wins, 4);
        assert_eq!(ledger.record().losses, 2);
    }
}
