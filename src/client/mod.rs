//! In-process client of the race store: pairing and per-match sync.

pub mod host;
pub mod pairing;
pub mod sync;
