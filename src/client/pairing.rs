//! Client side of the pairing queue.

use actix::prelude::*;
use log::debug;
use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::race::types::{ClientId, MatchAssignment, PlayerProfile, TicketId};
use crate::server::matchmaking::messages::{AckMatched, JoinOutcome, JoinQueue, LeaveQueue, QueueNotification};
use crate::server::matchmaking::server::MatchmakingServer;

pub enum QueueTicket {
    /// Paired by this very join.
    Matched(MatchAssignment),
    Waiting(WaitingTicket),
}

/// A queued ticket waiting for the matched notification.
pub struct WaitingTicket {
    client_id: ClientId,
    ticket: TicketId,
    position: usize,
    matchmaking: Addr<MatchmakingServer>,
    notice: oneshot::Receiver<QueueNotification>,
}

impl WaitingTicket {
    pub fn ticket(&self) -> TicketId {
        self.ticket
    }

    /// 1-based position in the queue at join time.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Wait for the pairing and acknowledge the notice.
    pub async fn matched(self) -> Result<MatchAssignment, StoreError> {
        match self.notice.await {
            Ok(QueueNotification::Matched(assignment)) => {
                self.matchmaking.do_send(AckMatched {
                    client_id: self.client_id,
                    match_id: assignment.match_id,
                });
                Ok(assignment)
            }
            Ok(QueueNotification::Kicked { reason }) => {
                debug!("[Pairing] Ticket {} taken over: {}", self.ticket, reason);
                Err(StoreError::QueueClosed)
            }
            Err(_) => Err(StoreError::QueueClosed),
        }
    }

    /// Cancel the ticket. False if it was already paired or removed.
    pub async fn leave(self) -> Result<bool, StoreError> {
        let removed = self
            .matchmaking
            .send(LeaveQueue {
                client_id: self.client_id,
                ticket: self.ticket,
            })
            .await?;
        Ok(removed)
    }
}

/// Forwards the one notification of a ticket to its `WaitingTicket`.
struct QueueWaiter {
    tx: Option<oneshot::Sender<QueueNotification>>,
}

impl Actor for QueueWaiter {
    type Context = Context<Self>;
}

impl Handler<QueueNotification> for QueueWaiter {
    type Result = ();

    fn handle(&mut self, msg: QueueNotification, ctx: &mut Self::Context) {
        if let Some(tx) = self.tx.take() {
            // The receiver may be gone if the caller stopped waiting.
            let _ = tx.send(msg);
        }
        ctx.stop();
    }
}

pub async fn join_queue(matchmaking: &Addr<MatchmakingServer>, profile: PlayerProfile) -> Result<QueueTicket, StoreError> {
    let (tx, rx) = oneshot::channel();
    let waiter = QueueWaiter { tx: Some(tx) }.start();
    let client_id = profile.client_id.clone();

    let outcome = matchmaking
        .send(JoinQueue {
            profile,
            notify: waiter.recipient(),
        })
        .await??;

    match outcome {
        JoinOutcome::Matched(assignment) => Ok(QueueTicket::Matched(assignment)),
        JoinOutcome::Waiting { ticket, position } => Ok(QueueTicket::Waiting(WaitingTicket {
            client_id,
            ticket,
            position,
            matchmaking: matchmaking.clone(),
            notice: rx,
        })),
    }
}

/// Join and wait until paired, whichever side of the pairing this client ends up on.
pub async fn join_and_wait(matchmaking: &Addr<MatchmakingServer>, profile: PlayerProfile) -> Result<MatchAssignment, StoreError> {
    match join_queue(matchmaking, profile).await? {
        QueueTicket::Matched(assignment) => Ok(assignment),
        QueueTicket::Waiting(waiting) => waiting.matched().await,
    }
}
