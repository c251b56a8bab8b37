//! Storage abstraction for the public leaderboard.
//!
//! The Wrapped pipeline only ever writes through this contract: one record per
//! address, last write wins. Ranked reads serve the leaderboard pages and the
//! community feed.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{SocialIdentity, YearlySummary};

/// Persisted leaderboard entry for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRecord {
    /// Canonical address; the natural key
    pub address: String,
    pub score: u32,
    pub rank_title: String,
    pub protocol_count: u32,
    /// Social handle, when the request was authenticated
    pub handle: Option<String>,
    /// Avatar URL, when the request was authenticated
    pub avatar_url: Option<String>,
    /// Write time in Unix millis
    pub timestamp: i64,
}

impl LeaderboardRecord {
    /// Build a record from a summary and the caller's identity.
    pub fn from_summary(summary: &YearlySummary, identity: &SocialIdentity, timestamp: i64) -> Self {
        Self {
            address: summary.address.as_str().to_string(),
            score: summary.score,
            rank_title: summary.rank_title.clone(),
            protocol_count: u32::try_from(summary.protocol_count).unwrap_or(u32::MAX),
            handle: identity.handle.clone(),
            avatar_url: identity.avatar_url(),
            timestamp,
        }
    }
}

/// Formal contract for leaderboard persistence.
#[async_trait]
pub trait LeaderboardStorage: Send + Sync {
    /// Insert or replace the record keyed by its address. Atomic: readers see
    /// either the old or the new row, never a mix.
    async fn upsert_record(&self, record: &LeaderboardRecord) -> Result<()>;

    /// Fetch the record of one address.
    async fn get_record(&self, address: &str) -> Result<Option<LeaderboardRecord>>;

    /// Best `limit` records, score descending, most recent first on ties.
    async fn top_records(&self, limit: u32) -> Result<Vec<LeaderboardRecord>>;

    /// One page of the full ranking, same order as `top_records`.
    async fn page_records(&self, offset: u32, limit: u32) -> Result<Vec<LeaderboardRecord>>;

    /// Number of stored records.
    async fn record_count(&self) -> Result<i64>;

    /// Every record, ranked. Used by exports.
    async fn all_records(&self) -> Result<Vec<LeaderboardRecord>>;

    /// Delete every record. Returns how many were removed.
    async fn clear(&self) -> Result<u64>;

    /// Health check for the storage backend.
    async fn health_check(&self) -> Result<bool>;
}
