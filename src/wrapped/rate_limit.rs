//! Outbound rate limiting for indexer queries, built on governor.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fallback quota when a zero rate is configured.
const FALLBACK_REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// Caps the rate of composite queries sent to the indexer.
pub struct UpstreamRateLimiter {
    limiter: DefaultDirectRateLimiter,
    requests_per_second: u32,
}

impl UpstreamRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(FALLBACK_REQUESTS_PER_SECOND);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            requests_per_second: per_second.get(),
        }
    }

    /// Wait for a permit for at most `max_wait`. Returns `false` if none was
    /// granted in time.
    #[instrument(skip(self))]
    pub async fn acquire(&self, max_wait: Duration) -> bool {
        if self.limiter.check().is_ok() {
            return true;
        }

        debug!("Indexer quota of {}/s exhausted, waiting for a permit", self.requests_per_second);
        tokio::time::timeout(max_wait, self.limiter.until_ready())
            .await
            .is_ok()
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }
}
