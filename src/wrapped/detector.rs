//! Protocol interaction detector.
//!
//! Answers "which tracked protocols has this address used" with one composite
//! indexer query. Upstream trouble never reaches the caller: a failed query
//! degrades to the host protocol only, and a partially failed one keeps every
//! sub-result that did resolve.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::types::{NormalizedAddress, ProtocolSet};
use crate::wrapped::cache::BoundedCache;
use crate::wrapped::catalog::ProtocolCatalog;
use crate::wrapped::indexer::{GraphQlResponse, IndexerTransport, SubResult};
use crate::wrapped::metrics::{self, MetricsCollector};

/// Detection cache, shared by every in-flight request.
pub type DetectionCache = BoundedCache<NormalizedAddress, ProtocolSet>;

pub struct ProtocolDetector {
    transport: Arc<dyn IndexerTransport>,
    cache: Arc<DetectionCache>,
    catalog: ProtocolCatalog,
    timeout: Duration,
    metrics: MetricsCollector,
}

impl ProtocolDetector {
    /// `timeout` bounds the whole upstream call, retries included.
    pub fn new(
        transport: Arc<dyn IndexerTransport>,
        cache: Arc<DetectionCache>,
        catalog: ProtocolCatalog,
        timeout: Duration,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            transport,
            cache,
            catalog,
            timeout,
            metrics,
        }
    }

    pub fn catalog(&self) -> &ProtocolCatalog {
        &self.catalog
    }

    /// Protocols `address` interacted with. Always contains the host protocol.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn detect(&self, address: &NormalizedAddress) -> ProtocolSet {
        if let Some(cached) = self.cache.get(address) {
            debug!("Detection cache hit");
            self.metrics.increment_counter(metrics::CACHE_HITS).await;
            return cached;
        }
        self.metrics.increment_counter(metrics::CACHE_MISSES).await;

        let request = self.catalog.build_query(address);
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.transport.execute(&request)).await;
        self.metrics.record_upstream_latency(started.elapsed()).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Indexer query failed, crediting host protocol only: {:#}", e);
                self.metrics.increment_counter(metrics::UPSTREAM_FAILURES).await;
                return ProtocolSet::host_only();
            }
            Err(_) => {
                warn!(
                    "Indexer query timed out after {:?}, crediting host protocol only",
                    self.timeout
                );
                self.metrics.increment_counter(metrics::UPSTREAM_FAILURES).await;
                return ProtocolSet::host_only();
            }
        };

        if !response.has_data() {
            warn!(
                "Indexer returned no data ({} error(s)), crediting host protocol only",
                response.errors.len()
            );
            self.metrics.increment_counter(metrics::UPSTREAM_FAILURES).await;
            return ProtocolSet::host_only();
        }

        let detected = self.collect(&response);

        if response.has_partial_errors() {
            warn!(
                "Indexer reported {} sub-query error(s); keeping {} detected protocol(s) uncached",
                response.errors.len(),
                detected.len()
            );
            self.metrics
                .increment_counter(metrics::UPSTREAM_PARTIAL_FAILURES)
                .await;
        } else {
            self.cache.set(address.clone(), detected.clone());
        }

        detected
    }

    /// Credit every protocol with at least one matching check.
    fn collect(&self, response: &GraphQlResponse) -> ProtocolSet {
        let mut detected = ProtocolSet::host_only();
        for check in self.catalog.checks() {
            match response.sub_result(check.alias) {
                SubResult::Matched => {
                    detected.insert(check.protocol);
                }
                SubResult::Errored => {
                    debug!("Check {} errored; treating {} as not detected", check.alias, check.protocol);
                }
                SubResult::Empty | SubResult::Missing => {}
            }
        }
        detected
    }
}
