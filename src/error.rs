//! Errors returned by the store actors.

use actix::MailboxError;
use thiserror::Error;

use crate::race::types::{ClientId, MatchId, Role};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("match {0} not found")]
    MatchNotFound(MatchId),
    #[error("client {client_id} does not own the {role} slot of match {match_id}")]
    NotSlotOwner {
        match_id: MatchId,
        client_id: ClientId,
        role: Role,
    },
    #[error("client {client_id} is not a participant of match {match_id}")]
    NotParticipant { match_id: MatchId, client_id: ClientId },
    #[error("queue closed before a match was found")]
    QueueClosed,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Stable code sent to WebSocket clients.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::MatchNotFound(_) => "MATCH_NOT_FOUND",
            StoreError::NotSlotOwner { .. } => "NOT_SLOT_OWNER",
            StoreError::NotParticipant { .. } => "NOT_PARTICIPANT",
            StoreError::QueueClosed => "QUEUE_CLOSED",
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<MailboxError> for StoreError {
    fn from(err: MailboxError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
