//! End-to-end tests of the summary pipeline against a scripted indexer

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sui_wrapped::wrapped::catalog::GraphQlRequest;
use sui_wrapped::wrapped::indexer::{GraphQlResponse, IndexerTransport};
use sui_wrapped::wrapped::metrics::{self, MetricsCollector};
use sui_wrapped::wrapped::{SummaryBuilder, SummaryError, WrappedBuilder};
use sui_wrapped::Protocol;

enum Script {
    Respond(&'static str),
    Fail(&'static str),
    Sleep(Duration),
}

struct ScriptedIndexer {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedIndexer {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexerTransport for ScriptedIndexer {
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.variables["addr"].as_str().is_some());
        match self.script {
            Script::Respond(body) => Ok(serde_json::from_str(body)?),
            Script::Fail(message) => Err(anyhow!(message)),
            Script::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(GraphQlResponse::default())
            }
        }
    }
}

const NAVI_AND_CETUS: &str = r#"{
    "data": {
        "navi_deposit": { "nodes": [ { "timestamp": "2025-01-15T10:00:00Z" } ] },
        "suilend_deposit": { "nodes": [] },
        "bluefin_trade": { "nodes": [] },
        "lake_stake": { "nodes": [] },
        "bucket_borrow": { "nodes": [] },
        "cetus_swap": { "nodes": [ { "timestamp": "2025-06-01T08:30:00Z" } ] },
        "scallop_deposit": { "nodes": [] },
        "scallop_collateral": { "nodes": [] },
        "walrus_blob": { "nodes": [] },
        "deepbook_order": { "nodes": [] }
    }
}"#;

fn pipeline(indexer: Arc<ScriptedIndexer>, metrics: MetricsCollector) -> SummaryBuilder {
    WrappedBuilder::new().build(indexer, metrics)
}

#[tokio::test]
async fn test_scenario_navi_and_cetus() {
    let indexer = ScriptedIndexer::new(Script::Respond(NAVI_AND_CETUS));
    let summaries = pipeline(indexer.clone(), MetricsCollector::new());

    let summary = summaries.build("0xABCDEF", 2025).await.unwrap();

    assert_eq!(
        summary.address.as_str(),
        format!("0x{}abcdef", "0".repeat(58))
    );
    assert_eq!(summary.year, 2025);
    assert_eq!(summary.protocols.names(), vec!["NAVI", "Bucket", "Cetus"]);
    assert_eq!(summary.protocol_count, 3);
    assert_eq!(summary.rank_title, "Active Voyager");
    assert_eq!(summary.multiplier, 1.2);
    // floor((3000 + 371) * 1.2)
    assert_eq!(summary.score, 4045);
    assert_eq!(summary.personality_tags, vec!["Active User".to_string()]);
    assert_eq!(indexer.calls(), 1);
}

#[tokio::test]
async fn test_scenario_empty_address_never_calls_indexer() {
    let indexer = ScriptedIndexer::new(Script::Respond(NAVI_AND_CETUS));
    let metrics = MetricsCollector::new();
    let summaries = pipeline(indexer.clone(), metrics.clone());

    let err = summaries.build("", 2025).await.unwrap_err();

    assert_eq!(
        err,
        SummaryError::InvalidAddress {
            input: String::new()
        }
    );
    assert_eq!(indexer.calls(), 0);
    assert_eq!(metrics.counter(metrics::INVALID_ADDRESSES).await, 1);
}

#[tokio::test]
async fn test_invalid_addresses_are_rejected() {
    let indexer = ScriptedIndexer::new(Script::Respond(NAVI_AND_CETUS));
    let summaries = pipeline(indexer.clone(), MetricsCollector::new());

    let too_long = format!("0x{}", "1".repeat(65));
    for input in ["   ", "0x", "0xnothex", too_long.as_str()] {
        assert!(summaries.build(input, 2025).await.is_err(), "accepted {input:?}");
    }
    assert_eq!(indexer.calls(), 0);
}

#[tokio::test]
async fn test_scenario_upstream_timeout_error() {
    let indexer = ScriptedIndexer::new(Script::Fail("operation timed out"));
    let metrics = MetricsCollector::new();
    let summaries = pipeline(indexer, metrics.clone());

    let summary = summaries.build("0xABCDEF", 2025).await.unwrap();

    assert_eq!(summary.protocol_count, 1);
    assert!(summary.protocols.contains(Protocol::HOST));
    assert_eq!(summary.rank_title, "Sui Explorer");
    // floor((1000 + 371) * 1.0)
    assert_eq!(summary.score, 1371);
    assert_eq!(summary.og_sentence, "You quietly explored Bucket this year.");
    assert_eq!(metrics.counter(metrics::UPSTREAM_FAILURES).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_hung_upstream_is_cut_off() {
    let indexer = ScriptedIndexer::new(Script::Sleep(Duration::from_secs(3600)));
    let summaries = pipeline(indexer.clone(), MetricsCollector::new());

    let started = tokio::time::Instant::now();
    let summary = summaries.build("0xabcdef", 2025).await.unwrap();

    assert_eq!(summary.protocol_count, 1);
    assert!(started.elapsed() <= Duration::from_secs(16));
    assert_eq!(indexer.calls(), 1);
}

#[tokio::test]
async fn test_partial_failure_keeps_resolved_protocols() {
    let indexer = ScriptedIndexer::new(Script::Respond(
        r#"{
            "data": {
                "navi_deposit": null,
                "cetus_swap": { "nodes": [ {} ] },
                "walrus_blob": { "nodes": [ { "address": "0x5" } ] }
            },
            "errors": [
                { "message": "Request timed out", "path": ["navi_deposit"] }
            ]
        }"#,
    ));
    let metrics = MetricsCollector::new();
    let summaries = pipeline(indexer.clone(), metrics.clone());

    let summary = summaries.build("0x77", 2025).await.unwrap();

    assert_eq!(summary.protocols.names(), vec!["Bucket", "Cetus", "Walrus"]);
    assert!(!summary.protocols.contains(Protocol::Navi));
    assert_eq!(metrics.counter(metrics::UPSTREAM_PARTIAL_FAILURES).await, 1);

    // partial results are not cached, so the next request asks again
    summaries.build("0x77", 2025).await.unwrap();
    assert_eq!(indexer.calls(), 2);
}

#[tokio::test]
async fn test_repeat_requests_hit_cache() {
    let indexer = ScriptedIndexer::new(Script::Respond(NAVI_AND_CETUS));
    let metrics = MetricsCollector::new();
    let summaries = pipeline(indexer.clone(), metrics.clone());

    let first = summaries.build("0xABCDEF", 2025).await.unwrap();
    // differently spelled, same canonical address
    let second = summaries.build("  abcdef ", 2025).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(indexer.calls(), 1);
    assert_eq!(metrics.counter(metrics::CACHE_HITS).await, 1);
    assert_eq!(metrics.counter(metrics::SUMMARIES_BUILT).await, 2);
}

#[tokio::test]
async fn test_year_is_echoed() {
    let indexer = ScriptedIndexer::new(Script::Respond(NAVI_AND_CETUS));
    let summaries = pipeline(indexer, MetricsCollector::new());

    let summary = summaries.build("0x1", 2024).await.unwrap();

    assert_eq!(summary.year, 2024);
}
