use actix::prelude::*;
use serde::{Serialize, Deserialize};

use super::server::MatchRoom;
use crate::error::StoreError;
use crate::race::types::{ClientId, MatchDoc, MatchId, PlayerProfile, Role, SlotUpdate, SubscriptionId};

/// Message: register a new match document.
#[derive(Message)]
#[rtype(result = "()")]
pub struct CreateMatch {
    pub match_id: MatchId,
    pub player1: PlayerProfile,
    pub player2: PlayerProfile,
}

#[derive(Message)]
#[rtype(result = "Result<Addr<MatchRoom>, StoreError>")]
pub struct GetMatchRoom {
    pub match_id: MatchId,
}

/// Sent by a room to the registry when it shuts down, and forwarded to every watcher.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct RoomClosed {
    pub match_id: MatchId,
}

/// Message: ask the registry to forward every `RoomClosed`.
#[derive(Message)]
#[rtype(result = "()")]
pub struct WatchRooms {
    pub watcher: Recipient<RoomClosed>,
}

/// Full document pushed to subscribers on every change.
#[derive(Message, Clone, Serialize, Deserialize, Debug)]
#[rtype(result = "()")]
pub struct MatchSnapshot {
    pub doc: MatchDoc,
}

#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub doc: MatchDoc,
}

#[derive(Message)]
#[rtype(result = "Subscription")]
pub struct SubscribeMatch {
    pub subscriber: Recipient<MatchSnapshot>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct UnsubscribeMatch {
    pub id: SubscriptionId,
}

/// Message: a client writes its own slot.
#[derive(Message)]
#[rtype(result = "Result<(), StoreError>")]
pub struct WriteSlot {
    pub client_id: ClientId,
    pub role: Role,
    pub update: SlotUpdate,
}

/// Message: a participant observed the conclusion and marks the match finished.
/// With `forfeit`, the caller declares its opponent silent.
#[derive(Message)]
#[rtype(result = "Result<(), StoreError>")]
pub struct FinishMatch {
    pub client_id: ClientId,
    pub forfeit: bool,
}

#[derive(Message)]
#[rtype(result = "MatchDoc")]
pub struct GetMatch;

#[derive(Message)]
#[rtype(result = "Option<Role>")]
pub struct ResolveRole {
    pub client_id: ClientId,
}

// Client -> server (WebSocket)
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "action", content = "data")]
pub enum ClientMatchMessage {
    Push(SlotUpdate),
    Conclude,
    /// Conclude because the opponent went silent.
    Forfeit,
    Ping,
}

// Server -> client (WebSocket)
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "action", content = "data")]
pub enum ServerMatchMessage {
    #[serde(rename_all = "camelCase")]
    Joined {
        match_id: MatchId,
        role: Option<Role>,
    },
    Snapshot(MatchDoc),
}
