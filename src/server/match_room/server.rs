use actix::prelude::*;
use std::collections::HashMap;
use actix::MessageResult;
use uuid::Uuid;
use log::{debug, info, warn};

use super::messages::{
    CreateMatch, FinishMatch, GetMatch, GetMatchRoom, MatchSnapshot, ResolveRole, RoomClosed,
    SubscribeMatch, Subscription, UnsubscribeMatch, WatchRooms, WriteSlot,
};
use crate::error::StoreError;
use crate::race::types::{MatchDoc, MatchId, MatchStatus, SubscriptionId};
use crate::utils::now_millis;

/// One match document and its live subscribers.
pub struct MatchRoom {
    pub doc: MatchDoc,
    max_lives: u32,
    subscribers: HashMap<SubscriptionId, Recipient<MatchSnapshot>>,
    registry: Addr<MatchRegistry>,
}

impl MatchRoom {
    pub fn new(doc: MatchDoc, max_lives: u32, registry: Addr<MatchRegistry>) -> Self {
        Self {
            doc,
            max_lives,
            subscribers: HashMap::new(),
            registry,
        }
    }

    fn broadcast(&mut self) {
        let snapshot = MatchSnapshot { doc: self.doc.clone() };
        self.subscribers.retain(|_, subscriber| subscriber.connected());
        for subscriber in self.subscribers.values() {
            subscriber.do_send(snapshot.clone());
        }
    }

    /// A concluded room nobody listens to anymore is dropped.
    fn close_if_done(&mut self, ctx: &mut Context<Self>) {
        if self.doc.status == MatchStatus::Finished && self.subscribers.is_empty() {
            info!("[MatchRoom] Closing finished match {}", self.doc.match_id);
            self.registry.do_send(RoomClosed { match_id: self.doc.match_id });
            ctx.stop();
        }
    }
}

impl Actor for MatchRoom {
    type Context = Context<Self>;
}

impl Handler<SubscribeMatch> for MatchRoom {
    type Result = MessageResult<SubscribeMatch>;

    fn handle(&mut self, msg: SubscribeMatch, _: &mut Context<Self>) -> Self::Result {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, msg.subscriber);
        debug!("[MatchRoom] match_id={} subscriber {} added ({} total)", self.doc.match_id, id, self.subscribers.len());
        MessageResult(Subscription { id, doc: self.doc.clone() })
    }
}

impl Handler<UnsubscribeMatch> for MatchRoom {
    type Result = ();

    fn handle(&mut self, msg: UnsubscribeMatch, ctx: &mut Context<Self>) -> Self::Result {
        if self.subscribers.remove(&msg.id).is_some() {
            debug!("[MatchRoom] match_id={} subscriber {} removed", self.doc.match_id, msg.id);
        }
        self.close_if_done(ctx);
    }
}

impl Handler<WriteSlot> for MatchRoom {
    type Result = Result<(), StoreError>;

    fn handle(&mut self, msg: WriteSlot, _: &mut Context<Self>) -> Self::Result {
        let match_id = self.doc.match_id;
        let slot = self.doc.slot_mut(msg.role);
        if slot.profile.client_id != msg.client_id {
            warn!("[MatchRoom] match_id={} rejected write of {} into {}", match_id, msg.client_id, msg.role);
            return Err(StoreError::NotSlotOwner {
                match_id,
                client_id: msg.client_id,
                role: msg.role,
            });
        }
        let was_finished = slot.finished;
        slot.apply(&msg.update, self.max_lives);
        if !was_finished && slot.finished {
            info!("[MatchRoom] match_id={} {} finished with score {}", match_id, msg.role, slot.score);
            if self.doc.both_finished() {
                info!("[MatchRoom] match_id={} both runners finished", match_id);
            }
        }
        self.broadcast();
        Ok(())
    }
}

impl Handler<FinishMatch> for MatchRoom {
    type Result = Result<(), StoreError>;

    fn handle(&mut self, msg: FinishMatch, ctx: &mut Context<Self>) -> Self::Result {
        let Some(role) = self.doc.role_of(&msg.client_id) else {
            return Err(StoreError::NotParticipant {
                match_id: self.doc.match_id,
                client_id: msg.client_id,
            });
        };
        // The first conclusion wins; a later forfeit claim does not rewrite it.
        if self.doc.status != MatchStatus::Finished {
            self.doc.status = MatchStatus::Finished;
            if msg.forfeit {
                self.doc.forfeited_by = Some(role.opponent());
                info!("[MatchRoom] match_id={} {} forfeited (declared by {})", self.doc.match_id, role.opponent(), msg.client_id);
            } else {
                info!("[MatchRoom] match_id={} marked finished by {}", self.doc.match_id, msg.client_id);
            }
            self.broadcast();
        }
        self.close_if_done(ctx);
        Ok(())
    }
}

impl Handler<GetMatch> for MatchRoom {
    type Result = MessageResult<GetMatch>;

    fn handle(&mut self, _: GetMatch, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.doc.clone())
    }
}

impl Handler<ResolveRole> for MatchRoom {
    type Result = MessageResult<ResolveRole>;

    fn handle(&mut self, msg: ResolveRole, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.doc.role_of(&msg.client_id))
    }
}

/// Owns every live match room, keyed by match id.
pub struct MatchRegistry {
    rooms: HashMap<MatchId, Addr<MatchRoom>>,
    watchers: Vec<Recipient<RoomClosed>>,
    max_lives: u32,
}

impl MatchRegistry {
    pub fn new(max_lives: u32) -> Self {
        Self {
            rooms: HashMap::new(),
            watchers: Vec::new(),
            max_lives,
        }
    }
}

impl Actor for MatchRegistry {
    type Context = Context<Self>;
}

impl Handler<CreateMatch> for MatchRegistry {
    type Result = ();

    fn handle(&mut self, msg: CreateMatch, ctx: &mut Context<Self>) -> Self::Result {
        if self.rooms.contains_key(&msg.match_id) {
            warn!("[MatchRegistry] Match {} already exists", msg.match_id);
            return;
        }
        let doc = MatchDoc::new(msg.match_id, msg.player1, msg.player2, self.max_lives, now_millis());
        let room = MatchRoom::new(doc, self.max_lives, ctx.address()).start();
        self.rooms.insert(msg.match_id, room);
        debug!("[MatchRegistry] Room started for match {} ({} live)", msg.match_id, self.rooms.len());
    }
}

impl Handler<GetMatchRoom> for MatchRegistry {
    type Result = Result<Addr<MatchRoom>, StoreError>;

    fn handle(&mut self, msg: GetMatchRoom, _: &mut Context<Self>) -> Self::Result {
        self.rooms
            .get(&msg.match_id)
            .cloned()
            .ok_or(StoreError::MatchNotFound(msg.match_id))
    }
}

impl Handler<RoomClosed> for MatchRegistry {
    type Result = ();

    fn handle(&mut self, msg: RoomClosed, _: &mut Context<Self>) -> Self::Result {
        self.rooms.remove(&msg.match_id);
        self.watchers.retain(|watcher| watcher.connected());
        for watcher in &self.watchers {
            watcher.do_send(msg.clone());
        }
    }
}

impl Handler<WatchRooms> for MatchRegistry {
    type Result = ();

    fn handle(&mut self, msg: WatchRooms, _: &mut Context<Self>) -> Self::Result {
        self.watchers.push(msg.watcher);
    }
}
