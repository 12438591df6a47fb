//! Match result derived locally once both slots are finished.

use std::cmp::Ordering;
use std::fmt;
use serde::Serialize;

use super::types::{MatchId, Role};
use crate::config::race::{WIN_BONUS, TIE_BONUS, LOSS_BONUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    pub fn from_scores(local: u64, opponent: u64) -> Self {
        match local.cmp(&opponent) {
            Ordering::Greater => Outcome::Win,
            Ordering::Less => Outcome::Loss,
            Ordering::Equal => Outcome::Tie,
        }
    }

    pub fn bonus(self) -> u64 {
        match self {
            Outcome::Win => WIN_BONUS,
            Outcome::Tie => TIE_BONUS,
            Outcome::Loss => LOSS_BONUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub match_id: MatchId,
    pub local_role: Role,
    pub winner: Option<Role>,
    pub outcome: Outcome,
    pub local_score: u64,
    pub opponent_score: u64,
    pub bonus: u64,
    pub forfeit: bool,
}

impl MatchResult {
    pub fn from_scores(match_id: MatchId, local_role: Role, local_score: u64, opponent_score: u64) -> Self {
        let outcome = Outcome::from_scores(local_score, opponent_score);
        let winner = match outcome {
            Outcome::Win => Some(local_role),
            Outcome::Loss => Some(local_role.opponent()),
            Outcome::Tie => None,
        };
        Self {
            match_id,
            local_role,
            winner,
            outcome,
            local_score,
            opponent_score,
            bonus: outcome.bonus(),
            forfeit: false,
        }
    }

    /// The opponent went silent: the local player wins whatever the scores.
    pub fn forfeit(match_id: MatchId, local_role: Role, local_score: u64, opponent_score: u64) -> Self {
        Self {
            match_id,
            local_role,
            winner: Some(local_role),
            outcome: Outcome::Win,
            local_score,
            opponent_score,
            bonus: Outcome::Win.bonus(),
            forfeit: true,
        }
    }

    /// Loss adopted by the side that went silent.
    pub fn forfeited(match_id: MatchId, local_role: Role, local_score: u64, opponent_score: u64) -> Self {
        Self {
            match_id,
            local_role,
            winner: Some(local_role.opponent()),
            outcome: Outcome::Loss,
            local_score,
            opponent_score,
            bonus: Outcome::Loss.bonus(),
            forfeit: true,
        }
    }

    pub fn score_of(&self, role: Role) -> u64 {
        if role == self.local_role { self.local_score } else { self.opponent_score }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p1 = self.score_of(Role::Player1);
        let p2 = self.score_of(Role::Player2);
        match self.winner {
            Some(winner) => {
                let (won, lost) = if winner == Role::Player1 { (p1, p2) } else { (p2, p1) };
                write!(f, "{} wins, {} vs {}", winner, won, lost)?;
            }
            None => write!(f, "tie, {} vs {}", p1, p2)?,
        }
        if self.forfeit {
            write!(f, " (forfeit)")?;
        }
        Ok(())
    }
}
