/// Matchmaking server actor.
///
/// Owns the FIFO ticket queue. Every `JoinQueue` is handled as one actor message,
/// which makes the read-pop-create sequence the pairing transaction: two clients
/// can never both observe an empty queue and both wait for each other.

use actix::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;
use log::{info, debug, warn};

use super::messages::{AckMatched, JoinOutcome, JoinQueue, LeaveQueue, QueueLength, QueueNotification};
use crate::error::StoreError;
use crate::race::queue::TicketQueue;
use crate::race::types::{ClientId, MatchAssignment, QueueEntry, Role, TicketId};
use crate::server::match_room::messages::{CreateMatch, RoomClosed, WatchRooms};
use crate::server::match_room::server::MatchRegistry;
use crate::utils::now_millis;

pub struct MatchmakingServer {
    /// Clients waiting for an opponent, oldest first.
    queue: TicketQueue,
    /// Where to push the matched notification of each waiting ticket.
    notifiers: HashMap<TicketId, Recipient<QueueNotification>>,
    /// Matched notifications not yet acknowledged by the waiting side.
    unacked: HashMap<ClientId, MatchAssignment>,
    /// Registry that owns the match documents.
    registry: Addr<MatchRegistry>,
}

impl MatchmakingServer {
    pub fn new(registry: Addr<MatchRegistry>) -> Self {
        Self {
            queue: TicketQueue::new(),
            notifiers: HashMap::new(),
            unacked: HashMap::new(),
            registry,
        }
    }

    fn waiting(&self, ticket: TicketId) -> JoinOutcome {
        JoinOutcome::Waiting {
            ticket,
            position: self.queue.position(&ticket).unwrap_or(0),
        }
    }

    /// Create a match from the two oldest tickets while at least two are queued.
    /// Returns the assignment of `caller` if its ticket was paired.
    fn pair_waiting(&mut self, caller: TicketId) -> Option<MatchAssignment> {
        let mut caller_assignment = None;
        while let Some((first, second)) = self.queue.pop_pair() {
            let match_id = Uuid::new_v4();
            self.registry.do_send(CreateMatch {
                match_id,
                player1: first.profile.clone(),
                player2: second.profile.clone(),
            });
            info!(
                "[Matchmaking] Match created match_id={} player1={} player2={}",
                match_id, first.profile.client_id, second.profile.client_id
            );

            for (entry, role, opponent) in [
                (&first, Role::Player1, &second),
                (&second, Role::Player2, &first),
            ] {
                let assignment = MatchAssignment {
                    match_id,
                    role,
                    client_id: entry.profile.client_id.clone(),
                    opponent: opponent.profile.clone(),
                };
                if entry.ticket == caller {
                    caller_assignment = Some(assignment);
                    self.notifiers.remove(&entry.ticket);
                } else {
                    self.notify_matched(entry, assignment);
                }
            }
        }
        caller_assignment
    }

    /// Push the matched notification and keep it until acknowledged.
    fn notify_matched(&mut self, entry: &QueueEntry, assignment: MatchAssignment) {
        match self.notifiers.remove(&entry.ticket) {
            Some(notify) if notify.connected() => notify.do_send(QueueNotification::Matched(assignment.clone())),
            _ => debug!("[Matchmaking] Waiting session of {} is gone, notice kept", entry.profile.client_id),
        }
        self.unacked.insert(entry.profile.client_id.clone(), assignment);
    }
}

impl Actor for MatchmakingServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.registry.do_send(WatchRooms { watcher: ctx.address().recipient() });
    }
}

impl Handler<JoinQueue> for MatchmakingServer {
    type Result = Result<JoinOutcome, StoreError>;

    fn handle(&mut self, msg: JoinQueue, _ctx: &mut Self::Context) -> Self::Result {
        let client_id = msg.profile.client_id.clone();

        // Paired while away: hand back the pending notice.
        if let Some(assignment) = self.unacked.remove(&client_id) {
            debug!("[Matchmaking] Client {} rejoined with a pending match {}", client_id, assignment.match_id);
            return Ok(JoinOutcome::Matched(assignment));
        }

        // Already queued: the new session takes over the ticket.
        if let Some(ticket) = self.queue.find_client(&client_id).map(|e| e.ticket) {
            if let Some(old) = self.notifiers.insert(ticket, msg.notify) {
                old.do_send(QueueNotification::Kicked {
                    reason: "Another session has joined the queue with your client id.".to_string(),
                });
            }
            debug!("[Matchmaking] Client {} reconnected to ticket {} (old session kicked)", client_id, ticket);
            return Ok(self.waiting(ticket));
        }

        let ticket = match self.queue.enqueue(msg.profile, now_millis()) {
            Some(ticket) => ticket,
            None => {
                warn!("[Matchmaking] Client {} could not be enqueued", client_id);
                return Err(StoreError::QueueClosed);
            }
        };
        self.notifiers.insert(ticket, msg.notify);
        debug!("[Matchmaking] Client {} queued with ticket {}", client_id, ticket);

        match self.pair_waiting(ticket) {
            Some(assignment) => Ok(JoinOutcome::Matched(assignment)),
            None => Ok(self.waiting(ticket)),
        }
    }
}

impl Handler<LeaveQueue> for MatchmakingServer {
    type Result = bool;

    fn handle(&mut self, msg: LeaveQueue, _ctx: &mut Self::Context) -> Self::Result {
        match self.queue.remove(&msg.ticket, &msg.client_id) {
            Some(entry) => {
                self.notifiers.remove(&entry.ticket);
                debug!("[Matchmaking] Client {} left the queue (ticket {})", msg.client_id, msg.ticket);
                true
            }
            None => false,
        }
    }
}

impl Handler<AckMatched> for MatchmakingServer {
    type Result = ();

    fn handle(&mut self, msg: AckMatched, _ctx: &mut Self::Context) -> Self::Result {
        let acked = self
            .unacked
            .get(&msg.client_id)
            .is_some_and(|assignment| assignment.match_id == msg.match_id);
        if acked {
            self.unacked.remove(&msg.client_id);
            debug!("[Matchmaking] Client {} acknowledged match {}", msg.client_id, msg.match_id);
        }
    }
}

impl Handler<QueueLength> for MatchmakingServer {
    type Result = usize;

    fn handle(&mut self, _msg: QueueLength, _ctx: &mut Self::Context) -> Self::Result {
        self.queue.len()
    }
}

impl Handler<RoomClosed> for MatchmakingServer {
    type Result = ();

    /// A closed match can no longer be joined: drop the notices pointing at it.
    fn handle(&mut self, msg: RoomClosed, _ctx: &mut Self::Context) -> Self::Result {
        let before = self.unacked.len();
        self.unacked.retain(|_, assignment| assignment.match_id != msg.match_id);
        if self.unacked.len() < before {
            debug!("[Matchmaking] Dropped stale notice for closed match {}", msg.match_id);
        }
    }
}
