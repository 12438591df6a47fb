/// Main configuration module.
/// 
/// Re-exports submodules for matchmaking, race, anti-spam and server configuration.
pub mod matchmaking;
pub mod race;
pub mod anti_spam;
pub mod server;
