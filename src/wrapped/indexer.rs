//! Indexer transport and typed response model.
//!
//! A composite response may be partially failed: some aliases resolve, some
//! come back `null` with an entry in `errors`. [`SubResult`] makes those
//! outcomes explicit per alias instead of probing for property presence.

use crate::wrapped::catalog::GraphQlRequest;
use crate::wrapped::rate_limit::UpstreamRateLimiter;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use nonempty::NonEmpty;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, instrument, warn};

/// A connection page; only its emptiness matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
}

/// One entry of the GraphQL `errors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}

/// Raw composite response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<HashMap<String, Option<Connection>>>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// Outcome of a single aliased sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubResult {
    /// At least one record matched.
    Matched,
    /// The sub-query succeeded with no records.
    Empty,
    /// The sub-query failed; its path appears in `errors`.
    Errored,
    /// The alias is absent from the response without an error.
    Missing,
}

impl SubResult {
    pub fn is_match(&self) -> bool {
        matches!(self, SubResult::Matched)
    }
}

impl GraphQlResponse {
    /// Whether the response carries any usable data at all.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Classify the sub-result for `alias`.
    pub fn sub_result(&self, alias: &str) -> SubResult {
        if self.errored(alias) {
            return SubResult::Errored;
        }
        match self.data.as_ref().and_then(|data| data.get(alias)) {
            None => SubResult::Missing,
            Some(None) => SubResult::Empty,
            Some(Some(connection)) if connection.nodes.is_empty() => SubResult::Empty,
            Some(Some(_)) => SubResult::Matched,
        }
    }

    /// Whether the response carries any error entry at all, with or without a path.
    pub fn has_partial_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn errored(&self, alias: &str) -> bool {
        self.errors.iter().any(|error| {
            error
                .path
                .as_ref()
                .and_then(|path| path.first())
                .and_then(|head| head.as_str())
                .map(|head| head == alias)
                .unwrap_or(false)
        })
    }
}

/// Seam between the detector and the network.
#[async_trait]
pub trait IndexerTransport: Send + Sync {
    /// Send one composite query and return the parsed response. Transport
    /// failures, non-success statuses and unparseable bodies are errors.
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse>;
}

/// reqwest-backed transport for a Sui GraphQL endpoint list.
pub struct GraphQlTransport {
    http_client: Client,
    endpoints: NonEmpty<String>,
    rate_limiter: UpstreamRateLimiter,
    retry_attempts: usize,
    timeout: Duration,
}

impl GraphQlTransport {
    /// Create a transport. `timeout` bounds each HTTP attempt as well as the
    /// wait for a rate-limit permit.
    pub fn new(
        endpoints: NonEmpty<String>,
        timeout: Duration,
        retry_attempts: usize,
        requests_per_second: u32,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build indexer HTTP client")?;

        Ok(Self {
            http_client,
            endpoints,
            rate_limiter: UpstreamRateLimiter::new(requests_per_second),
            retry_attempts,
            timeout,
        })
    }

    pub fn endpoints(&self) -> &NonEmpty<String> {
        &self.endpoints
    }

    /// Endpoint for the `attempt`-th try of one request. Every request starts
    /// on the primary and walks the list in order on retry.
    fn endpoint_for(&self, attempt: usize) -> &str {
        let index = attempt % self.endpoints.len();
        self.endpoints
            .get(index)
            .map(String::as_str)
            .unwrap_or(self.endpoints.first().as_str())
    }

    #[instrument(skip(self, request), fields(endpoint = %endpoint))]
    async fn post(&self, endpoint: &str, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        if !self.rate_limiter.acquire(self.timeout).await {
            return Err(anyhow!("Timed out waiting for indexer rate-limit permit"));
        }

        let response = self
            .http_client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .context("Failed to send indexer query")?;

        if !response.status().is_success() {
            return Err(anyhow!("Indexer returned status {}", response.status()));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .context("Failed to parse indexer response")?;

        debug!("Indexer answered with {} error(s)", parsed.errors.len());
        Ok(parsed)
    }
}

#[async_trait]
impl IndexerTransport for GraphQlTransport {
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(2))
            .take(self.retry_attempts);

        let attempt = AtomicUsize::new(0);
        Retry::start(retry_strategy, || {
            let endpoint = self.endpoint_for(attempt.fetch_add(1, Ordering::Relaxed));
            async move {
                self.post(endpoint, request).await.map_err(|e| {
                    warn!("Indexer attempt against {} failed: {:#}", endpoint, e);
                    e
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GraphQlResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_classifies_sub_results() {
        let response = parse(
            r#"{
                "data": {
                    "navi_deposit": { "nodes": [ { "timestamp": "2025-03-01T00:00:00Z" } ] },
                    "cetus_swap": { "nodes": [] },
                    "suilend_deposit": null
                },
                "errors": [
                    { "message": "timeout", "path": ["suilend_deposit"] }
                ]
            }"#,
        );

        assert_eq!(response.sub_result("navi_deposit"), SubResult::Matched);
        assert_eq!(response.sub_result("cetus_swap"), SubResult::Empty);
        assert_eq!(response.sub_result("suilend_deposit"), SubResult::Errored);
        assert_eq!(response.sub_result("walrus_blob"), SubResult::Missing);
        assert!(response.has_partial_errors());
    }

    #[test]
    fn test_error_without_path_does_not_poison_aliases() {
        let response = parse(
            r#"{
                "data": { "cetus_swap": { "nodes": [ {} ] } },
                "errors": [ { "message": "query complexity warning" } ]
            }"#,
        );

        assert_eq!(response.sub_result("cetus_swap"), SubResult::Matched);
        // still a partial failure, so the result must not be cached
        assert!(response.has_partial_errors());
    }

    #[test]
    fn test_clean_response_has_no_partial_errors() {
        let response = parse(r#"{ "data": { "cetus_swap": { "nodes": [] } } }"#);

        assert!(!response.has_partial_errors());
    }

    #[test]
    fn test_null_data() {
        let response = parse(r#"{ "data": null, "errors": [ { "message": "bad" } ] }"#);

        assert!(!response.has_data());
        assert_eq!(response.sub_result("cetus_swap"), SubResult::Missing);
    }

    fn two_endpoint_transport() -> GraphQlTransport {
        let endpoints = NonEmpty::from_vec(vec![
            "http://primary".to_string(),
            "http://fallback".to_string(),
        ])
        .unwrap();
        GraphQlTransport::new(endpoints, Duration::from_secs(1), 1, 10).unwrap()
    }

    #[test]
    fn test_retries_walk_endpoints_in_order() {
        let transport = two_endpoint_transport();

        assert_eq!(transport.endpoint_for(0), "http://primary");
        assert_eq!(transport.endpoint_for(1), "http://fallback");
        assert_eq!(transport.endpoint_for(2), "http://primary");
    }

    #[test]
    fn test_each_request_starts_on_primary() {
        let transport = two_endpoint_transport();

        // two independent requests, each with one retry
        let first: Vec<&str> = (0..2).map(|attempt| transport.endpoint_for(attempt)).collect();
        let second: Vec<&str> = (0..2).map(|attempt| transport.endpoint_for(attempt)).collect();

        assert_eq!(first, vec!["http://primary", "http://fallback"]);
        assert_eq!(second, first);
    }
}
