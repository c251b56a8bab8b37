//! Environment configuration.
//!
//! Every `WRAPPED_*` variable is optional; unset variables keep the
//! [`WrappedConfig`] default and say so in the log.

use anyhow::{anyhow, Context, Result};
use nonempty::NonEmpty;
use std::{env, fmt::Display, str::FromStr};
use tracing::{info, warn};

use crate::wrapped::WrappedConfig;

/// Load the configuration from the process environment.
pub fn load_from_env() -> Result<WrappedConfig> {
    load_from(|key| env::var(key).ok())
}

/// Load the configuration from an arbitrary key lookup.
pub fn load_from<F>(lookup: F) -> Result<WrappedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = WrappedConfig::default();

    let indexer_endpoints = match lookup("WRAPPED_INDEXER_ENDPOINTS") {
        Some(raw) => parse_endpoints(&raw)?,
        None => {
            info!(
                "WRAPPED_INDEXER_ENDPOINTS not set, using default: {}",
                defaults.indexer_endpoints.first()
            );
            defaults.indexer_endpoints
        }
    };

    let admin_secret = lookup("WRAPPED_ADMIN_SECRET").filter(|s| !s.trim().is_empty());
    if admin_secret.is_none() {
        warn!("WRAPPED_ADMIN_SECRET not set, admin routes are disabled");
    }

    Ok(WrappedConfig {
        listen_addr: try_load(&lookup, "WRAPPED_LISTEN_ADDR", defaults.listen_addr)?,
        indexer_endpoints,
        indexer_timeout_seconds: try_load(
            &lookup,
            "WRAPPED_INDEXER_TIMEOUT_SECONDS",
            defaults.indexer_timeout_seconds,
        )?,
        indexer_retry_attempts: try_load(
            &lookup,
            "WRAPPED_INDEXER_RETRY_ATTEMPTS",
            defaults.indexer_retry_attempts,
        )?,
        indexer_requests_per_second: try_load(
            &lookup,
            "WRAPPED_INDEXER_REQUESTS_PER_SECOND",
            defaults.indexer_requests_per_second,
        )?,
        cache_capacity: try_load(&lookup, "WRAPPED_CACHE_CAPACITY", defaults.cache_capacity)?,
        cache_ttl_seconds: try_load(&lookup, "WRAPPED_CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
        default_year: try_load(&lookup, "WRAPPED_DEFAULT_YEAR", defaults.default_year)?,
        leaderboard_top_n: try_load(&lookup, "WRAPPED_LEADERBOARD_TOP_N", defaults.leaderboard_top_n)?,
        leaderboard_write_timeout_seconds: try_load(
            &lookup,
            "WRAPPED_LEADERBOARD_WRITE_TIMEOUT_SECONDS",
            defaults.leaderboard_write_timeout_seconds,
        )?,
        leaderboard_channel_capacity: try_load(
            &lookup,
            "WRAPPED_LEADERBOARD_CHANNEL_CAPACITY",
            defaults.leaderboard_channel_capacity,
        )?,
        community_feed_ttl_seconds: try_load(
            &lookup,
            "WRAPPED_COMMUNITY_FEED_TTL_SECONDS",
            defaults.community_feed_ttl_seconds,
        )?,
        database_url: try_load(&lookup, "WRAPPED_DATABASE_URL", defaults.database_url)?,
        admin_secret,
    })
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_endpoints(raw: &str) -> Result<NonEmpty<String>> {
    let endpoints: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    NonEmpty::from_vec(endpoints).context("WRAPPED_INDEXER_ENDPOINTS lists no endpoint")
}
