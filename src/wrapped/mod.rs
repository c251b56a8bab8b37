//! Wrapped module - year-in-review pipeline for Sui addresses.
//!
//! normalize -> detect -> score -> assemble, plus the leaderboard sink that
//! records summaries of logged-in callers.

pub mod types;
pub mod address;
pub mod cache;
pub mod catalog;
pub mod indexer;
pub mod rate_limit;
pub mod detector;
pub mod scoring;
pub mod summary;
pub mod metrics;
pub mod storage;
pub mod sqlite_leaderboard;
pub mod leaderboard_writer;

use std::sync::Arc;

// Re-export main types
pub use types::{LeaderboardRecordReceiver, LeaderboardRecordSender, WrappedConfig};

// Re-export key components
pub use cache::BoundedCache;
pub use catalog::ProtocolCatalog;
pub use detector::{DetectionCache, ProtocolDetector};
pub use indexer::{GraphQlTransport, IndexerTransport};
pub use leaderboard_writer::LeaderboardWriter;
pub use metrics::MetricsCollector;
pub use sqlite_leaderboard::SqliteLeaderboard;
pub use storage::{LeaderboardRecord, LeaderboardStorage};
pub use summary::{SummaryBuilder, SummaryError};

/// Builder for [`WrappedConfig`] and the summary pipeline.
pub struct WrappedBuilder {
    config: WrappedConfig,
}

impl WrappedBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: WrappedConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: WrappedConfig) -> Self {
        Self { config }
    }

    /// Set the HTTP listen address.
    pub fn with_listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.config.listen_addr = listen_addr.into();
        self
    }

    /// Set the indexer endpoints.
    pub fn with_indexer_endpoints(mut self, endpoints: nonempty::NonEmpty<String>) -> Self {
        self.config.indexer_endpoints = endpoints;
        self
    }

    /// Set the indexer timeout and retry attempts.
    pub fn with_indexer_timeout(mut self, timeout_seconds: u64, retry_attempts: usize) -> Self {
        self.config.indexer_timeout_seconds = timeout_seconds;
        self.config.indexer_retry_attempts = retry_attempts;
        self
    }

    /// Set outbound rate limiting.
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.indexer_requests_per_second = requests_per_second;
        self
    }

    /// Set detection cache size and TTL. Either at zero disables the cache.
    pub fn with_cache(mut self, capacity: usize, ttl_seconds: u64) -> Self {
        self.config.cache_capacity = capacity;
        self.config.cache_ttl_seconds = ttl_seconds;
        self
    }

    /// Set the year used when a request names none.
    pub fn with_default_year(mut self, year: i32) -> Self {
        self.config.default_year = year;
        self
    }

    /// Set community feed size.
    pub fn with_leaderboard_top_n(mut self, top_n: u32) -> Self {
        self.config.leaderboard_top_n = top_n;
        self
    }

    /// Set the database URL.
    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.config.database_url = database_url.into();
        self
    }

    /// Set the admin secret.
    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.admin_secret = Some(secret.into());
        self
    }

    /// Build the configuration.
    pub fn build_config(self) -> WrappedConfig {
        self.config
    }

    /// Build the summary pipeline over `transport` with a fresh detection cache.
    pub fn build(
        self,
        transport: Arc<dyn IndexerTransport>,
        metrics: MetricsCollector,
    ) -> SummaryBuilder {
        let cache = Arc::new(BoundedCache::new(
            self.config.cache_capacity,
            self.config.cache_ttl(),
        ));
        let detector = ProtocolDetector::new(
            transport,
            cache,
            ProtocolCatalog::default(),
            self.config.indexer_timeout(),
            metrics.clone(),
        );
        SummaryBuilder::new(Arc::new(detector), metrics)
    }
}

impl Default for WrappedBuilder {
    fn default() -> Self {
        Self::new()
    }
}
