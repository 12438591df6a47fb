use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::error::StoreError;
use crate::race::types::{ClientId, MatchAssignment, MatchId, PlayerProfile, Role, TicketId};

/// Result of the pairing transaction for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    Waiting { ticket: TicketId, position: usize },
    Matched(MatchAssignment),
}

/// Notification pushed to a waiting client.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
#[rtype(result = "()")]
pub enum QueueNotification {
    Matched(MatchAssignment),
    /// Another session of the same client took over the ticket.
    Kicked { reason: String },
}

/// Message: client joins the queue (the pairing transaction).
#[derive(Message)]
#[rtype(result = "Result<JoinOutcome, StoreError>")]
pub struct JoinQueue {
    pub profile: PlayerProfile,
    pub notify: Recipient<QueueNotification>,
}

/// Message: client cancels its ticket. Returns true if a ticket was removed.
#[derive(Message)]
#[rtype(result = "bool")]
pub struct LeaveQueue {
    pub client_id: ClientId,
    pub ticket: TicketId,
}

/// Message: waiting client consumed its matched notification.
#[derive(Message)]
#[rtype(result = "()")]
pub struct AckMatched {
    pub client_id: ClientId,
    pub match_id: MatchId,
}

/// Message: number of waiting tickets.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct QueueLength;

// Client -> server (WebSocket)
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "action", content = "data")]
pub enum ClientQueueMessage {
    Leave,
    #[serde(rename_all = "camelCase")]
    Ack { match_id: MatchId },
    Ping,
}

// Server -> client (WebSocket)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", content = "data")]
pub enum ServerQueueMessage {
    Waiting {
        ticket: TicketId,
        position: usize,
    },
    #[serde(rename_all = "camelCase")]
    Matched {
        match_id: MatchId,
        role: Role,
        opponent: PlayerProfile,
    },
    Left,
}

impl ServerQueueMessage {
    pub fn from_outcome(outcome: &JoinOutcome) -> Self {
        match outcome {
            JoinOutcome::Waiting { ticket, position } => Self::Waiting {
                ticket: *ticket,
                position: *position,
            },
            JoinOutcome::Matched(assignment) => Self::matched(assignment),
        }
    }

    pub fn matched(assignment: &MatchAssignment) -> Self {
        Self::Matched {
            match_id: assignment.match_id,
            role: assignment.role,
            opponent: assignment.opponent.clone(),
        }
    }
}
