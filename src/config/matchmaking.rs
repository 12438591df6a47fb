/// Matchmaking configuration constants.
/// 
/// This module defines parameters for the pairing queue and the documents it creates.
pub const MAX_LIVES: u32 = 3; // Lives every player slot starts a match with.

/// Number of players in one match (1v1 race).
pub const PLAYERS_PER_MATCH: usize = 2;

/// Outfit assigned when a client does not send one.
pub const DEFAULT_OUTFIT: &str = "explorer";

/// Prefix of the generated username when a client does not send one.
pub const DEFAULT_USERNAME_PREFIX: &str = "Runner_";
