//! In-process metrics for the Wrapped pipeline.
//!
//! Counters and bounded latency samples behind an async RwLock, exposed as a
//! serializable snapshot for the `/metrics` endpoint.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

pub const CACHE_HITS: &str = "wrapped_cache_hits_total";
pub const CACHE_MISSES: &str = "wrapped_cache_misses_total";
pub const UPSTREAM_FAILURES: &str = "wrapped_upstream_failures_total";
pub const UPSTREAM_PARTIAL_FAILURES: &str = "wrapped_upstream_partial_failures_total";
pub const SUMMARIES_BUILT: &str = "wrapped_summaries_built_total";
pub const INVALID_ADDRESSES: &str = "wrapped_invalid_addresses_total";
pub const LEADERBOARD_WRITES: &str = "wrapped_leaderboard_writes_total";
pub const LEADERBOARD_WRITE_FAILURES: &str = "wrapped_leaderboard_write_failures_total";
pub const LEADERBOARD_DROPPED: &str = "wrapped_leaderboard_dropped_total";
pub const UPSTREAM_LATENCY: &str = "wrapped_upstream_latency_seconds";

/// Samples kept per histogram.
const MAX_SAMPLES: usize = 1024;

#[derive(Debug, Default)]
struct InternalMetrics {
    counters: HashMap<String, u64>,
    histograms: HashMap<String, VecDeque<f64>>,
}

/// Metrics collector shared by the detector, builder and HTTP layer.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<InternalMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter metric.
    #[instrument(skip(self), fields(metric = %name))]
    pub async fn increment_counter(&self, name: &str) {
        let mut metrics = self.metrics.write().await;
        *metrics.counters.entry(name.to_string()).or_insert(0) += 1;
        debug!("Incremented counter: {}", name);
    }

    /// Record a histogram value, keeping the most recent samples.
    pub async fn record_histogram(&self, name: &str, value: f64) {
        let mut metrics = self.metrics.write().await;
        let samples = metrics.histograms.entry(name.to_string()).or_default();
        samples.push_back(value);
        while samples.len() > MAX_SAMPLES {
            samples.pop_front();
        }
    }

    pub async fn record_upstream_latency(&self, duration: Duration) {
        self.record_histogram(UPSTREAM_LATENCY, duration.as_secs_f64()).await;
    }

    pub async fn counter(&self, name: &str) -> u64 {
        self.metrics.read().await.counters.get(name).copied().unwrap_or(0)
    }

    /// Get current metric values.
    pub async fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        let metrics = self.metrics.read().await;
        let histograms = metrics
            .histograms
            .iter()
            .map(|(name, samples)| (name.clone(), HistogramSummary::from_samples(samples)))
            .collect();

        MetricsSnapshot {
            counters: metrics.counters.clone(),
            histograms,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Summary of one histogram's retained samples.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
}

impl HistogramSummary {
    fn from_samples(samples: &VecDeque<f64>) -> Self {
        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        let max = samples.iter().copied().fold(0.0, f64::max);
        Self {
            count,
            mean: if count > 0 { sum / count as f64 } else { 0.0 },
            max,
        }
    }
}

/// Snapshot of current metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub histograms: HashMap<String, HistogramSummary>,
    /// Unix millis when the snapshot was taken
    pub timestamp: i64,
}
