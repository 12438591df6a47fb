use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::config::matchmaking::{DEFAULT_OUTFIT, DEFAULT_USERNAME_PREFIX};

pub type ClientId = String;
pub type MatchId = Uuid;
pub type TicketId = Uuid;
pub type SubscriptionId = Uuid;

/// Public profile of a client, snapshotted into the match at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub client_id: ClientId,
    pub username: String,
    pub icon: Option<String>,
    pub outfit: String,
}

impl PlayerProfile {
    /// Build a profile, filling missing username/outfit with the defaults.
    pub fn new(client_id: ClientId, username: Option<String>, icon: Option<String>, outfit: Option<String>) -> Self {
        let username = username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                let short: String = client_id.chars().take(6).collect();
                format!("{}{}", DEFAULT_USERNAME_PREFIX, short)
            });
        let outfit = outfit
            .filter(|outfit| !outfit.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OUTFIT.to_string());
        Self {
            client_id,
            username,
            icon: icon.filter(|icon| !icon.is_empty()),
            outfit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub ticket: TicketId,
    pub profile: PlayerProfile,
    /// Server time (ms since the Unix epoch).
    pub enqueued_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player1,
    Player2,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player1 => write!(f, "player1"),
            Role::Player2 => write!(f, "player2"),
        }
    }
}

/// The fields a client writes into its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub score: u64,
    pub lives: u32,
    pub finished: bool,
    pub heartbeat: u64,
}

/// Per-player subtree of a match document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    #[serde(flatten)]
    pub profile: PlayerProfile,
    pub score: u64,
    pub lives: u32,
    pub finished: bool,
    pub heartbeat: u64,
}

impl PlayerSlot {
    pub fn new(profile: PlayerProfile, max_lives: u32) -> Self {
        Self {
            profile,
            score: 0,
            lives: max_lives,
            finished: false,
            heartbeat: 0,
        }
    }

    /// Apply a write from the owning client.
    ///
    /// Score and lives are last-write-wins until the slot is finished, after
    /// which they are frozen. `finished` never goes back to false.
    pub fn apply(&mut self, update: &SlotUpdate, max_lives: u32) {
        if !self.finished {
            self.score = update.score;
            self.lives = update.lives.min(max_lives);
        }
        self.finished |= update.finished;
        self.heartbeat = update.heartbeat;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDoc {
    pub match_id: MatchId,
    pub player1: PlayerSlot,
    pub player2: PlayerSlot,
    pub status: MatchStatus,
    /// Set when the match was concluded because this side went silent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeited_by: Option<Role>,
    /// Server time (ms since the Unix epoch).
    pub created_at: u64,
}

impl MatchDoc {
    pub fn new(match_id: MatchId, player1: PlayerProfile, player2: PlayerProfile, max_lives: u32, created_at: u64) -> Self {
        Self {
            match_id,
            player1: PlayerSlot::new(player1, max_lives),
            player2: PlayerSlot::new(player2, max_lives),
            status: MatchStatus::Active,
            forfeited_by: None,
            created_at,
        }
    }

    pub fn slot(&self, role: Role) -> &PlayerSlot {
        match role {
            Role::Player1 => &self.player1,
            Role::Player2 => &self.player2,
        }
    }

    pub fn slot_mut(&mut self, role: Role) -> &mut PlayerSlot {
        match role {
            Role::Player1 => &mut self.player1,
            Role::Player2 => &mut self.player2,
        }
    }

    pub fn role_of(&self, client_id: &str) -> Option<Role> {
        if self.player1.profile.client_id == client_id {
            Some(Role::Player1)
        } else if self.player2.profile.client_id == client_id {
            Some(Role::Player2)
        } else {
            None
        }
    }

    pub fn both_finished(&self) -> bool {
        self.player1.finished && self.player2.finished
    }
}

/// What pairing hands to each of the two clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAssignment {
    pub match_id: MatchId,
    pub role: Role,
    pub client_id: ClientId,
    pub opponent: PlayerProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> PlayerProfile {
        PlayerProfile::new(id.to_string(), None, None, None)
    }

    #[test]
    fn test_profile_defaults() {
        let p = profile("abcdef123");
        assert_eq!(p.username, "Runner_abcdef");
        assert_eq!(p.outfit, "explorer");
        assert_eq!(p.icon, None);
    }

    #[test]
    fn test_finished_is_monotonic_and_freezes_score() {
        let mut slot = PlayerSlot::new(profile("a"), 3);
        slot.apply(&SlotUpdate { score: 120, lives: 0, finished: true, heartbeat: 4 }, 3);
        slot.apply(&SlotUpdate { score: 999, lives: 3, finished: false, heartbeat: 5 }, 3);
        assert!(slot.finished);
        assert_eq!(slot.score, 120);
        assert_eq!(slot.lives, 0);
        assert_eq!(slot.heartbeat, 5);
    }

    #[test]
    fn test_lives_clamped_to_max() {
        let mut slot = PlayerSlot::new(profile("a"), 3);
        slot.apply(&SlotUpdate { score: 1, lives: 9, finished: false, heartbeat: 1 }, 3);
        assert_eq!(slot.lives, 3);
    }

    #[test]
    fn test_role_lookup() {
        let doc = MatchDoc::new(Uuid::new_v4(), profile("a"), profile("b"), 3, 0);
        assert_eq!(doc.role_of("a"), Some(Role::Player1));
        assert_eq!(doc.role_of("b"), Some(Role::Player2));
        assert_eq!(doc.role_of("c"), None);
        assert_eq!(Role::Player1.opponent(), Role::Player2);
    }

    #[test]
    fn test_slot_serializes_flat() {
        let slot = PlayerSlot::new(profile("a"), 3);
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["clientId"], "a");
        assert_eq!(json["lives"], 3);
        assert_eq!(json["finished"], false);
    }
}
