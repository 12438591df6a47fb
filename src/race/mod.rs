//! Race domain: shared documents, the pairing queue, and the per-client sync state machine.

pub mod types;
pub mod queue;
pub mod reducer;
pub mod result;
pub mod rewards;
pub mod state_machine;
