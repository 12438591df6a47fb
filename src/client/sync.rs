//! Match sync client: binds a `RaceMachine` to a match room.
//!
//! The actor pushes the local slot on every sync tick and on local events,
//! feeds every room snapshot to the machine, and executes the resulting effects.
//! Store failures are logged and otherwise ignored; the next tick overwrites them.

use std::time::Instant;

use actix::prelude::*;
use log::{debug, info, warn};

use super::host::RaceContext;
use crate::error::StoreError;
use crate::race::reducer::OpponentView;
use crate::race::result::MatchResult;
use crate::race::rewards::PlayerRecord;
use crate::race::state_machine::{LocalRun, RaceEffect, RaceMachine, RacePhase};
use crate::race::types::{MatchAssignment, SlotUpdate, SubscriptionId};
use crate::server::match_room::messages::{FinishMatch, MatchSnapshot, SubscribeMatch, UnsubscribeMatch, WriteSlot};
use crate::server::match_room::server::MatchRoom;

/// Points earned by the local run.
#[derive(Message)]
#[rtype(result = "()")]
pub struct AddScore {
    pub points: u64,
}

/// The local runner hit an obstacle.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Collision;

#[derive(Message)]
#[rtype(result = "RaceStatus")]
pub struct GetRaceStatus;

#[derive(Debug, Clone)]
pub struct RaceStatus {
    pub phase: RacePhase,
    pub local: LocalRun,
    pub opponent: OpponentView,
    pub result: Option<MatchResult>,
    pub record: PlayerRecord,
}

pub struct MatchSyncClient {
    machine: RaceMachine,
    context: RaceContext,
    room: Addr<MatchRoom>,
    subscription: Option<SubscriptionId>,
    timers: Vec<SpawnHandle>,
}

impl MatchSyncClient {
    pub fn new(assignment: MatchAssignment, room: Addr<MatchRoom>, context: RaceContext) -> Self {
        let machine = RaceMachine::new(assignment, context.config, Instant::now());
        Self {
            machine,
            context,
            room,
            subscription: None,
            timers: Vec::new(),
        }
    }

    fn execute(&mut self, effects: Vec<RaceEffect>, ctx: &mut Context<Self>) {
        for effect in effects {
            match effect {
                RaceEffect::Phase(phase) => {
                    debug!("[MatchSync] {} -> {:?}", self.machine.assignment().client_id, phase);
                    self.context.host.phase_changed(phase);
                }
                RaceEffect::Push(update) => self.push(update, ctx),
                RaceEffect::Opponent(view) => self.context.host.opponent_updated(&view),
                RaceEffect::ConcludeMatch { forfeit } => self.conclude(forfeit, ctx),
                RaceEffect::Result(result) => self.settle(&result),
                RaceEffect::Unsubscribe => self.unsubscribe(ctx),
            }
        }
    }

    fn push(&mut self, update: SlotUpdate, ctx: &mut Context<Self>) {
        let assignment = self.machine.assignment();
        self.room
            .send(WriteSlot {
                client_id: assignment.client_id.clone(),
                role: assignment.role,
                update,
            })
            .into_actor(self)
            .then(|res, act, _| {
                if let Err(e) = res.map_err(StoreError::from).and_then(|r| r) {
                    warn!("[MatchSync] {} slot write dropped: {}", act.machine.assignment().client_id, e);
                }
                fut::ready(())
            })
            .spawn(ctx);
    }

    fn conclude(&mut self, forfeit: bool, ctx: &mut Context<Self>) {
        self.room
            .send(FinishMatch {
                client_id: self.machine.assignment().client_id.clone(),
                forfeit,
            })
            .into_actor(self)
            .then(|res, act, _| {
                if let Err(e) = res.map_err(StoreError::from).and_then(|r| r) {
                    warn!("[MatchSync] {} could not mark the match finished: {}", act.machine.assignment().client_id, e);
                }
                fut::ready(())
            })
            .spawn(ctx);
    }

    fn settle(&mut self, result: &MatchResult) {
        let RaceContext { host, ledger, .. } = &mut self.context;
        if ledger.is_settled(&result.match_id) {
            debug!("[MatchSync] Match {} already settled", result.match_id);
            return;
        }
        ledger.settle(result);
        info!("[MatchSync] {} result for match {}: {}", self.machine.assignment().client_id, result.match_id, result);
        host.result_ready(result, ledger.record());
    }

    fn unsubscribe(&mut self, ctx: &mut Context<Self>) {
        for handle in self.timers.drain(..) {
            ctx.cancel_future(handle);
        }
        if let Some(id) = self.subscription.take() {
            self.room.do_send(UnsubscribeMatch { id });
        }
    }
}

impl Actor for MatchSyncClient {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let assignment = self.machine.assignment();
        info!(
            "[MatchSync] {} racing {} in match {} as {}",
            assignment.client_id, assignment.opponent.client_id, assignment.match_id, assignment.role
        );

        self.room
            .send(SubscribeMatch { subscriber: ctx.address().recipient() })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(subscription) => {
                        if act.machine.phase() == RacePhase::Result {
                            act.room.do_send(UnsubscribeMatch { id: subscription.id });
                        } else {
                            act.subscription = Some(subscription.id);
                            let effects = act.machine.apply_snapshot(&subscription.doc, Instant::now());
                            act.execute(effects, ctx);
                        }
                    }
                    Err(e) => warn!("[MatchSync] Subscribe failed: {}", e),
                }
                fut::ready(())
            })
            .wait(ctx);

        let config = self.context.config;
        let frame = ctx.run_interval(config.frame_interval, |act, ctx| {
            let effects = act.machine.advance(Instant::now());
            act.execute(effects, ctx);
        });
        let sync = ctx.run_interval(config.sync_interval, |act, ctx| {
            if let Some(update) = act.machine.sync_tick() {
                act.push(update, ctx);
            }
        });
        self.timers.push(frame);
        self.timers.push(sync);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.subscription.take() {
            self.room.do_send(UnsubscribeMatch { id });
        }
    }
}

impl Handler<MatchSnapshot> for MatchSyncClient {
    type Result = ();

    fn handle(&mut self, msg: MatchSnapshot, ctx: &mut Self::Context) {
        let effects = self.machine.apply_snapshot(&msg.doc, Instant::now());
        self.execute(effects, ctx);
    }
}

impl Handler<AddScore> for MatchSyncClient {
    type Result = ();

    fn handle(&mut self, msg: AddScore, _ctx: &mut Self::Context) {
        self.machine.add_score(msg.points);
    }
}

impl Handler<Collision> for MatchSyncClient {
    type Result = ();

    fn handle(&mut self, _msg: Collision, ctx: &mut Self::Context) {
        let effects = self.machine.collide(Instant::now());
        self.execute(effects, ctx);
    }
}

impl Handler<GetRaceStatus> for MatchSyncClient {
    type Result = MessageResult<GetRaceStatus>;

    fn handle(&mut self, _msg: GetRaceStatus, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(RaceStatus {
            phase: self.machine.phase(),
            local: *self.machine.local(),
            opponent: self.machine.opponent().clone(),
            result: self.machine.result().cloned(),
            record: *self.context.ledger.record(),
        })
    }
}
