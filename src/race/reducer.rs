//! Local display state of the opponent, and the pure merge of a remote slot into it.

use std::time::Instant;
use serde::Serialize;

use super::types::{PlayerProfile, PlayerSlot};

/// What the local client knows about its opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentView {
    pub profile: PlayerProfile,
    pub score: u64,
    pub lives: u32,
    pub finished: bool,
    pub heartbeat: u64,
    /// Local time of the last observed heartbeat change.
    #[serde(skip)]
    pub last_seen: Instant,
}

impl OpponentView {
    pub fn new(profile: PlayerProfile, max_lives: u32, now: Instant) -> Self {
        Self {
            profile,
            score: 0,
            lives: max_lives,
            finished: false,
            heartbeat: 0,
            last_seen: now,
        }
    }
}

/// Copy the opponent's replicated fields into the local view.
///
/// Last write wins for score and lives; `finished` stays true once observed.
/// `last_seen` only moves when the heartbeat changed, so a replayed snapshot
/// does not keep a silent opponent alive.
pub fn apply_remote_snapshot(view: &OpponentView, remote: &PlayerSlot, now: Instant) -> OpponentView {
    let last_seen = if remote.heartbeat != view.heartbeat { now } else { view.last_seen };
    OpponentView {
        profile: view.profile.clone(),
        score: remote.score,
        lives: remote.lives,
        finished: view.finished || remote.finished,
        heartbeat: remote.heartbeat,
        last_seen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::race::types::SlotUpdate;

    fn slot(score: u64, lives: u32, finished: bool, heartbeat: u64) -> PlayerSlot {
        let mut slot = PlayerSlot::new(PlayerProfile::new("b".to_string(), None, None, None), 3);
        slot.apply(&SlotUpdate { score, lives, finished, heartbeat }, 3);
        slot
    }

    fn view(now: Instant) -> OpponentView {
        OpponentView::new(PlayerProfile::new("b".to_string(), None, None, None), 3, now)
    }

    #[test]
    fn test_copies_remote_fields() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let next = apply_remote_snapshot(&view(t0), &slot(450, 2, false, 1), t1);
        assert_eq!(next.score, 450);
        assert_eq!(next.lives, 2);
        assert!(!next.finished);
        assert_eq!(next.last_seen, t1);
    }

    #[test]
    fn test_same_heartbeat_does_not_refresh_last_seen() {
        let t0 = Instant::now();
        let first = apply_remote_snapshot(&view(t0), &slot(10, 3, false, 4), t0 + Duration::from_secs(1));
        let replay = apply_remote_snapshot(&first, &slot(10, 3, false, 4), t0 + Duration::from_secs(9));
        assert_eq!(replay.last_seen, t0 + Duration::from_secs(1));
    }

    #[test]
    fn test_finished_stays_true() {
        let t0 = Instant::now();
        let done = apply_remote_snapshot(&view(t0), &slot(10, 0, true, 2), t0);
        let stale = PlayerSlot { finished: false, ..slot(10, 0, false, 2) };
        let after = apply_remote_snapshot(&done, &stale, t0);
        assert!(after.finished);
    }
}
