//! Per-client, per-match race state machine.
//!
//! `countdown -> racing -> (dying -> racing)* -> finished_waiting -> result`
//!
//! The machine is pure: callers feed it time, local game events and remote
//! snapshots, and execute the returned effects (store writes, unsubscribe).

use std::time::Instant;
use serde::Serialize;

use super::reducer::{apply_remote_snapshot, OpponentView};
use super::result::MatchResult;
use super::types::{MatchAssignment, MatchDoc, MatchStatus, Role, SlotUpdate};
use crate::config::race::RaceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RacePhase {
    Countdown { remaining: u8 },
    Racing,
    Dying,
    FinishedWaiting,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceEffect {
    Phase(RacePhase),
    Push(SlotUpdate),
    Opponent(OpponentView),
    /// Set the match status to finished. With `forfeit`, the opponent is recorded as silent.
    ConcludeMatch { forfeit: bool },
    Result(MatchResult),
    Unsubscribe,
}

/// The local player's authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LocalRun {
    pub score: u64,
    pub lives: u32,
    pub finished: bool,
    pub heartbeat: u64,
}

impl LocalRun {
    fn to_update(self) -> SlotUpdate {
        SlotUpdate {
            score: self.score,
            lives: self.lives,
            finished: self.finished,
            heartbeat: self.heartbeat,
        }
    }
}

pub struct RaceMachine {
    assignment: MatchAssignment,
    config: RaceConfig,
    phase: RacePhase,
    local: LocalRun,
    opponent: OpponentView,
    next_countdown_at: Instant,
    respawn_at: Option<Instant>,
    result: Option<MatchResult>,
}

impl RaceMachine {
    pub fn new(assignment: MatchAssignment, config: RaceConfig, now: Instant) -> Self {
        let opponent = OpponentView::new(assignment.opponent.clone(), config.max_lives, now);
        let phase = if config.countdown_ticks == 0 {
            RacePhase::Racing
        } else {
            RacePhase::Countdown { remaining: config.countdown_ticks }
        };
        Self {
            local: LocalRun {
                lives: config.max_lives,
                ..Default::default()
            },
            next_countdown_at: now + config.countdown_step,
            respawn_at: None,
            result: None,
            assignment,
            config,
            phase,
            opponent,
        }
    }

    pub fn assignment(&self) -> &MatchAssignment {
        &self.assignment
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn local(&self) -> &LocalRun {
        &self.local
    }

    pub fn opponent(&self) -> &OpponentView {
        &self.opponent
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Advance timers: countdown steps, respawn, opponent silence.
    pub fn advance(&mut self, now: Instant) -> Vec<RaceEffect> {
        let mut effects = Vec::new();
        match self.phase {
            RacePhase::Countdown { mut remaining } => {
                while now >= self.next_countdown_at && remaining > 0 {
                    remaining -= 1;
                    self.next_countdown_at += self.config.countdown_step;
                }
                let next = if remaining == 0 {
                    RacePhase::Racing
                } else {
                    RacePhase::Countdown { remaining }
                };
                if next != self.phase {
                    self.set_phase(next, &mut effects);
                }
            }
            RacePhase::Dying => {
                if self.respawn_at.is_some_and(|at| now >= at) {
                    self.respawn_at = None;
                    self.set_phase(RacePhase::Racing, &mut effects);
                }
            }
            RacePhase::Racing | RacePhase::FinishedWaiting | RacePhase::Result => {}
        }

        if self.phase != RacePhase::Result
            && !self.opponent.finished
            && now.saturating_duration_since(self.opponent.last_seen) >= self.config.silence_window
        {
            self.forfeit(&mut effects);
        }
        effects
    }

    /// Points earned by the local run. Ignored outside of `racing`.
    pub fn add_score(&mut self, points: u64) {
        if self.phase == RacePhase::Racing {
            self.local.score = self.local.score.saturating_add(points);
        }
    }

    /// A local collision. Ignored outside of `racing`.
    pub fn collide(&mut self, now: Instant) -> Vec<RaceEffect> {
        let mut effects = Vec::new();
        if self.phase != RacePhase::Racing {
            return effects;
        }
        self.local.lives = self.local.lives.saturating_sub(1);
        if self.local.lives > 0 {
            self.respawn_at = Some(now + self.config.respawn_delay);
            self.set_phase(RacePhase::Dying, &mut effects);
            effects.push(RaceEffect::Push(self.next_update()));
        } else {
            self.finish_local(&mut effects);
            self.try_conclude(&mut effects);
        }
        effects
    }

    /// Periodic push of the local slot. Keeps heartbeating until the result.
    pub fn sync_tick(&mut self) -> Option<SlotUpdate> {
        if self.phase == RacePhase::Result {
            return None;
        }
        Some(self.next_update())
    }

    /// Merge a remote snapshot of the match document.
    pub fn apply_snapshot(&mut self, doc: &MatchDoc, now: Instant) -> Vec<RaceEffect> {
        let mut effects = Vec::new();
        if self.phase == RacePhase::Result || doc.match_id != self.assignment.match_id {
            return effects;
        }
        let remote = doc.slot(self.assignment.role.opponent());
        let next = apply_remote_snapshot(&self.opponent, remote, now);
        if next != self.opponent {
            self.opponent = next;
            effects.push(RaceEffect::Opponent(self.opponent.clone()));
        }
        if doc.status == MatchStatus::Finished {
            if let Some(silent) = doc.forfeited_by {
                self.adopt_forfeit(silent, &mut effects);
                return effects;
            }
            if !self.local.finished {
                // Concluded on the other side: end the local run where it stands.
                self.finish_local(&mut effects);
                self.opponent.finished = true;
            }
        }
        self.try_conclude(&mut effects);
        effects
    }

    fn next_update(&mut self) -> SlotUpdate {
        self.local.heartbeat += 1;
        self.local.to_update()
    }

    fn set_phase(&mut self, phase: RacePhase, effects: &mut Vec<RaceEffect>) {
        self.phase = phase;
        effects.push(RaceEffect::Phase(phase));
    }

    fn finish_local(&mut self, effects: &mut Vec<RaceEffect>) {
        self.local.finished = true;
        self.respawn_at = None;
        effects.push(RaceEffect::Push(self.next_update()));
        self.set_phase(RacePhase::FinishedWaiting, effects);
    }

    fn try_conclude(&mut self, effects: &mut Vec<RaceEffect>) {
        if self.result.is_some() || !self.local.finished || !self.opponent.finished {
            return;
        }
        let result = MatchResult::from_scores(
            self.assignment.match_id,
            self.assignment.role,
            self.local.score,
            self.opponent.score,
        );
        self.conclude(result, false, effects);
    }

    /// The document records a forfeit: take its verdict instead of comparing scores.
    fn adopt_forfeit(&mut self, silent: Role, effects: &mut Vec<RaceEffect>) {
        if !self.local.finished {
            self.local.finished = true;
            effects.push(RaceEffect::Push(self.next_update()));
        }
        let (match_id, role) = (self.assignment.match_id, self.assignment.role);
        let result = if silent == role {
            MatchResult::forfeited(match_id, role, self.local.score, self.opponent.score)
        } else {
            MatchResult::forfeit(match_id, role, self.local.score, self.opponent.score)
        };
        self.conclude(result, false, effects);
    }

    fn forfeit(&mut self, effects: &mut Vec<RaceEffect>) {
        if self.result.is_some() {
            return;
        }
        if !self.local.finished {
            self.local.finished = true;
            effects.push(RaceEffect::Push(self.next_update()));
        }
        let result = MatchResult::forfeit(
            self.assignment.match_id,
            self.assignment.role,
            self.local.score,
            self.opponent.score,
        );
        self.conclude(result, true, effects);
    }

    fn conclude(&mut self, result: MatchResult, declare_forfeit: bool, effects: &mut Vec<RaceEffect>) {
        self.result = Some(result.clone());
        self.respawn_at = None;
        self.set_phase(RacePhase::Result, effects);
        effects.push(RaceEffect::ConcludeMatch { forfeit: declare_forfeit });
        effects.push(RaceEffect::Result(result));
        effects.push(RaceEffect::Unsubscribe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;
    use crate::race::result::Outcome;
    use crate::race::types::{PlayerProfile, Role};

    fn profile(id: &str) -> PlayerProfile {
        PlayerProfile::new(id.to_string(), None, None, None)
    }

    fn config() -> RaceConfig {
        RaceConfig {
            max_lives: 2,
            countdown_ticks: 3,
            countdown_step: Duration::from_secs(1),
            sync_interval: Duration::from_secs(1),
            respawn_delay: Duration::from_millis(600),
            frame_interval: Duration::from_millis(50),
            silence_window: Duration::from_secs(15),
        }
    }

    fn setup(role: Role) -> (RaceMachine, MatchDoc, Instant) {
        let now = Instant::now();
        let match_id = Uuid::new_v4();
        let doc = MatchDoc::new(match_id, profile("a"), profile("b"), 2, 0);
        let (me, them) = match role {
            Role::Player1 => ("a", "b"),
            Role::Player2 => ("b", "a"),
        };
        let assignment = MatchAssignment {
            match_id,
            role,
            client_id: me.to_string(),
            opponent: profile(them),
        };
        (RaceMachine::new(assignment, config(), now), doc, now)
    }

    fn start_racing(machine: &mut RaceMachine, now: Instant) -> Instant {
        let go = now + Duration::from_secs(3);
        machine.advance(go);
        assert_eq!(machine.phase(), RacePhase::Racing);
        go
    }

    fn pushes(effects: &[RaceEffect]) -> Vec<SlotUpdate> {
        effects
            .iter()
            .filter_map(|e| match e {
                RaceEffect::Push(update) => Some(*update),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_countdown_steps_then_go() {
        let (mut machine, _, now) = setup(Role::Player1);
        assert_eq!(machine.phase(), RacePhase::Countdown { remaining: 3 });
        assert!(machine.advance(now + Duration::from_millis(500)).is_empty());
        let effects = machine.advance(now + Duration::from_secs(1));
        assert_eq!(effects, vec![RaceEffect::Phase(RacePhase::Countdown { remaining: 2 })]);
        machine.add_score(100);
        assert_eq!(machine.local().score, 0);
        let effects = machine.advance(now + Duration::from_secs(3));
        assert_eq!(effects, vec![RaceEffect::Phase(RacePhase::Racing)]);
    }

    #[test]
    fn test_collision_respawns_while_lives_remain() {
        let (mut machine, _, now) = setup(Role::Player1);
        let go = start_racing(&mut machine, now);
        machine.add_score(250);
        let effects = machine.collide(go);
        assert_eq!(machine.phase(), RacePhase::Dying);
        assert_eq!(pushes(&effects)[0].lives, 1);
        machine.add_score(1000);
        assert_eq!(machine.local().score, 250);
        assert!(machine.collide(go).is_empty());
        machine.advance(go + Duration::from_millis(600));
        assert_eq!(machine.phase(), RacePhase::Racing);
        assert_eq!(machine.local().score, 250);
    }

    #[test]
    fn test_last_life_finishes_and_waits() {
        let (mut machine, _, now) = setup(Role::Player1);
        let go = start_racing(&mut machine, now);
        machine.collide(go);
        machine.advance(go + Duration::from_secs(1));
        let effects = machine.collide(go + Duration::from_secs(1));
        let pushed = pushes(&effects);
        assert_eq!(pushed.len(), 1);
        assert!(pushed[0].finished);
        assert_eq!(pushed[0].lives, 0);
        assert_eq!(machine.phase(), RacePhase::FinishedWaiting);
        assert!(machine.result().is_none());
        // Still heartbeating while waiting.
        let tick = machine.sync_tick().unwrap();
        assert!(tick.finished);
        assert!(tick.heartbeat > pushed[0].heartbeat);
    }

    #[test]
    fn test_sync_tick_only_writes_own_state() {
        let (mut machine, mut doc, now) = setup(Role::Player2);
        let go = start_racing(&mut machine, now);
        machine.add_score(40);
        doc.player1.score = 777;
        machine.apply_snapshot(&doc, go);
        let tick = machine.sync_tick().unwrap();
        assert_eq!(tick.score, 40);
        assert_eq!(machine.opponent().score, 777);
    }

    #[test]
    fn test_result_once_both_finished() {
        let (mut machine, mut doc, now) = setup(Role::Player2);
        let go = start_racing(&mut machine, now);
        machine.add_score(9500);
        machine.collide(go);
        machine.advance(go + Duration::from_secs(1));
        machine.collide(go + Duration::from_secs(1));
        doc.player1.score = 12000;
        doc.player1.lives = 0;
        doc.player1.finished = true;
        doc.player1.heartbeat = 3;
        let effects = machine.apply_snapshot(&doc, go + Duration::from_secs(2));
        let result = machine.result().cloned().unwrap();
        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.winner, Some(Role::Player1));
        assert_eq!(result.to_string(), "player1 wins, 12000 vs 9500");
        assert!(effects.contains(&RaceEffect::ConcludeMatch { forfeit: false }));
        assert!(effects.contains(&RaceEffect::Unsubscribe));
        assert_eq!(machine.phase(), RacePhase::Result);

        // Duplicate notification: nothing new happens.
        assert!(machine.apply_snapshot(&doc, go + Duration::from_secs(3)).is_empty());
        assert!(machine.sync_tick().is_none());
    }

    #[test]
    fn test_finished_flag_never_resets() {
        let (mut machine, _, now) = setup(Role::Player1);
        let go = start_racing(&mut machine, now);
        machine.collide(go);
        machine.advance(go + Duration::from_secs(1));
        machine.collide(go + Duration::from_secs(1));
        for _ in 0..5 {
            machine.add_score(10);
            machine.collide(go + Duration::from_secs(2));
            machine.advance(go + Duration::from_secs(3));
            assert!(machine.sync_tick().unwrap().finished);
        }
    }

    #[test]
    fn test_silent_opponent_forfeits() {
        let (mut machine, _, now) = setup(Role::Player1);
        start_racing(&mut machine, now);
        machine.add_score(123);
        assert!(machine.advance(now + Duration::from_secs(14)).is_empty());
        let effects = machine.advance(now + Duration::from_secs(15));
        let result = machine.result().cloned().unwrap();
        assert!(result.forfeit);
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.local_score, 123);
        assert!(pushes(&effects)[0].finished);
        assert!(effects.contains(&RaceEffect::ConcludeMatch { forfeit: true }));
    }

    /// Both sides of a forfeit agree on the winner, whatever the scores.
    #[test]
    fn test_forfeit_verdict_is_shared() {
        let now = Instant::now();
        let match_id = Uuid::new_v4();
        let mut doc = MatchDoc::new(match_id, profile("a"), profile("b"), 2, 0);
        let assignment = |role: Role, me: &str, them: &str| MatchAssignment {
            match_id,
            role,
            client_id: me.to_string(),
            opponent: profile(them),
        };
        let mut a = RaceMachine::new(assignment(Role::Player1, "a", "b"), config(), now);
        let mut b = RaceMachine::new(assignment(Role::Player2, "b", "a"), config(), now);
        let go = start_racing(&mut a, now);
        start_racing(&mut b, now);
        a.add_score(100);
        b.add_score(5000);
        doc.player2.apply(&b.sync_tick().unwrap(), 2);
        a.apply_snapshot(&doc, go);

        // b stops reaching the store; a declares the forfeit.
        let effects = a.advance(go + Duration::from_secs(15));
        assert!(effects.contains(&RaceEffect::ConcludeMatch { forfeit: true }));
        let a_result = a.result().cloned().unwrap();

        // What the room holds once a's writes land.
        doc.player1.apply(&pushes(&effects)[0], 2);
        doc.status = MatchStatus::Finished;
        doc.forfeited_by = Some(Role::Player2);
        let effects = b.apply_snapshot(&doc, go + Duration::from_secs(16));
        let b_result = b.result().cloned().unwrap();

        assert_eq!(a_result.winner, Some(Role::Player1));
        assert_eq!(b_result.winner, Some(Role::Player1));
        assert_eq!(b_result.outcome, Outcome::Loss);
        assert!(b_result.forfeit);
        assert_eq!(b_result.bonus, 0);
        assert_eq!(a_result.to_string(), b_result.to_string());
        assert_eq!(b_result.to_string(), "player1 wins, 100 vs 5000 (forfeit)");
        // The losing side never declares a forfeit of its own.
        assert!(effects.contains(&RaceEffect::ConcludeMatch { forfeit: false }));
        assert!(pushes(&effects)[0].finished);
        assert_eq!(b.phase(), RacePhase::Result);
    }

    #[test]
    fn test_forfeited_while_waiting_is_a_loss() {
        let (mut machine, mut doc, now) = setup(Role::Player2);
        let go = start_racing(&mut machine, now);
        machine.add_score(700);
        machine.collide(go);
        machine.advance(go + Duration::from_secs(1));
        machine.collide(go + Duration::from_secs(1));
        assert_eq!(machine.phase(), RacePhase::FinishedWaiting);

        doc.player1.score = 300;
        doc.player1.finished = true;
        doc.player1.heartbeat = 9;
        doc.status = MatchStatus::Finished;
        doc.forfeited_by = Some(Role::Player2);
        let effects = machine.apply_snapshot(&doc, go + Duration::from_secs(2));
        let result = machine.result().unwrap();
        assert_eq!(result.outcome, Outcome::Loss);
        assert!(result.forfeit);
        assert_eq!(result.winner, Some(Role::Player1));
        // Already finished: no extra push.
        assert!(pushes(&effects).is_empty());
    }

    #[test]
    fn test_late_heartbeat_after_forfeit_is_ignored() {
        let (mut machine, mut doc, now) = setup(Role::Player1);
        start_racing(&mut machine, now);
        machine.advance(now + Duration::from_secs(15));
        let result = machine.result().cloned().unwrap();

        doc.player2.heartbeat = 1;
        doc.player2.score = 99_999;
        assert!(machine.apply_snapshot(&doc, now + Duration::from_secs(16)).is_empty());
        assert_eq!(machine.result(), Some(&result));
        assert_eq!(machine.opponent().heartbeat, 0);
    }

    #[test]
    fn test_heartbeat_just_before_window_resets_silence() {
        let (mut machine, mut doc, now) = setup(Role::Player1);
        start_racing(&mut machine, now);
        doc.player2.heartbeat = 1;
        machine.apply_snapshot(&doc, now + Duration::from_millis(14_999));
        assert!(machine.advance(now + Duration::from_secs(15)).is_empty());
        assert!(machine.advance(now + Duration::from_secs(29)).is_empty());
        machine.advance(now + Duration::from_millis(29_999));
        assert!(machine.result().is_some());
    }

    #[test]
    fn test_heartbeat_keeps_opponent_alive() {
        let (mut machine, mut doc, now) = setup(Role::Player1);
        start_racing(&mut machine, now);
        for sec in 1..30u64 {
            doc.player2.heartbeat = sec;
            machine.apply_snapshot(&doc, now + Duration::from_secs(sec));
            machine.advance(now + Duration::from_secs(sec));
        }
        assert!(machine.result().is_none());
    }

    #[test]
    fn test_finished_opponent_is_not_forfeited() {
        let (mut machine, mut doc, now) = setup(Role::Player1);
        start_racing(&mut machine, now);
        doc.player2.finished = true;
        doc.player2.heartbeat = 1;
        machine.apply_snapshot(&doc, now + Duration::from_secs(4));
        machine.advance(now + Duration::from_secs(60));
        assert!(machine.result().is_none());
        assert_eq!(machine.phase(), RacePhase::Racing);
    }

    #[test]
    fn test_concluded_elsewhere_ends_local_run() {
        let (mut machine, mut doc, now) = setup(Role::Player1);
        let go = start_racing(&mut machine, now);
        machine.add_score(800);
        doc.player2.score = 200;
        doc.player2.heartbeat = 2;
        doc.status = MatchStatus::Finished;
        let effects = machine.apply_snapshot(&doc, go);
        assert!(pushes(&effects)[0].finished);
        let result = machine.result().unwrap();
        assert_eq!(result.outcome, Outcome::Win);
        assert!(!result.forfeit);
    }
}
