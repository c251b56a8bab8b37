//! sui-wrapped - Sui year-in-review ("Wrapped") backend
//!
//! Detects which ecosystem protocols an address used, scores it, and keeps a
//! public leaderboard of the summaries requested by logged-in users.

pub mod types;
pub mod wrapped;
pub mod server;
pub mod config;

// Re-export main types for convenience
pub use types::{NormalizedAddress, Protocol, ProtocolSet, ScoreResult, SocialIdentity, YearlySummary};
