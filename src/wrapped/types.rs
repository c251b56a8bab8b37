//! Configuration and channel types for the Wrapped service.

use nonempty::NonEmpty;
use std::time::Duration;

use crate::wrapped::storage::LeaderboardRecord;

/// Default Sui GraphQL endpoint.
pub const DEFAULT_INDEXER_ENDPOINT: &str = "https://sui-mainnet.mystenlabs.com/graphql";

/// Configuration for the Wrapped service.
#[derive(Debug, Clone)]
pub struct WrappedConfig {
    /// HTTP listen address
    pub listen_addr: String,
    /// Indexer GraphQL endpoints, tried in order on retry
    pub indexer_endpoints: NonEmpty<String>,
    /// Upper bound of one detection, waits and retries included
    pub indexer_timeout_seconds: u64,
    /// Indexer retry attempts after the first failure
    pub indexer_retry_attempts: usize,
    /// Outbound indexer requests per second
    pub indexer_requests_per_second: u32,
    /// Maximum cached detection results
    pub cache_capacity: usize,
    /// Detection cache TTL in seconds
    pub cache_ttl_seconds: u64,
    /// Year used when a request does not name one
    pub default_year: i32,
    /// Size of the community feed
    pub leaderboard_top_n: u32,
    /// Upper bound of one leaderboard upsert
    pub leaderboard_write_timeout_seconds: u64,
    /// Capacity of the leaderboard writer queue
    pub leaderboard_channel_capacity: usize,
    /// Community feed response cache TTL in seconds
    pub community_feed_ttl_seconds: u64,
    /// SQLite connection string
    pub database_url: String,
    /// Shared secret of the admin routes; admin routes are closed when unset
    pub admin_secret: Option<String>,
}

impl WrappedConfig {
    pub fn indexer_timeout(&self) -> Duration {
        Duration::from_secs(self.indexer_timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn leaderboard_write_timeout(&self) -> Duration {
        Duration::from_secs(self.leaderboard_write_timeout_seconds)
    }

    pub fn community_feed_ttl(&self) -> Duration {
        Duration::from_secs(self.community_feed_ttl_seconds)
    }
}

impl Default for WrappedConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            indexer_endpoints: NonEmpty::new(DEFAULT_INDEXER_ENDPOINT.to_string()),
            indexer_timeout_seconds: 15,
            indexer_retry_attempts: 1,
            indexer_requests_per_second: 20,
            cache_capacity: 500,
            cache_ttl_seconds: 1800,
            default_year: 2025,
            leaderboard_top_n: 50,
            leaderboard_write_timeout_seconds: 5,
            leaderboard_channel_capacity: 256,
            community_feed_ttl_seconds: 30,
            database_url: "sqlite:./leaderboard.db?mode=rwc".to_string(),
            admin_secret: None,
        }
    }
}

// --- Communication Channels for LeaderboardWriter ---

/// Channel for sending records to the LeaderboardWriter
pub type LeaderboardRecordSender = tokio::sync::mpsc::Sender<LeaderboardRecord>;
pub type LeaderboardRecordReceiver = tokio::sync::mpsc::Receiver<LeaderboardRecord>;
