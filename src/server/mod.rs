//! HTTP boundary of the Wrapped service.

pub mod error;
pub mod identity;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::wrapped::{
    LeaderboardRecord, LeaderboardRecordSender, LeaderboardStorage, MetricsCollector,
    SummaryBuilder, WrappedConfig,
};

pub use error::AppError;

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Slack on top of the indexer timeout before a request is cut off.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Shared state of every handler.
pub struct AppState {
    pub summaries: Arc<SummaryBuilder>,
    pub storage: Arc<dyn LeaderboardStorage>,
    pub records: LeaderboardRecordSender,
    pub metrics: MetricsCollector,
    /// Cached community feed; a single entry under the unit key
    pub community_feed: Cache<(), Arc<Vec<LeaderboardRecord>>>,
    pub default_year: i32,
    pub leaderboard_top_n: u32,
    pub admin_secret: Option<String>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        config: &WrappedConfig,
        summaries: Arc<SummaryBuilder>,
        storage: Arc<dyn LeaderboardStorage>,
        records: LeaderboardRecordSender,
        metrics: MetricsCollector,
    ) -> Self {
        let community_feed = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.community_feed_ttl())
            .build();

        Self {
            summaries,
            storage,
            records,
            metrics,
            community_feed,
            default_year: config.default_year,
            leaderboard_top_n: config.leaderboard_top_n,
            admin_secret: config.admin_secret.clone(),
            request_timeout: config.indexer_timeout() + REQUEST_TIMEOUT_SLACK,
        }
    }
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "error": "request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        .route("/api/wrapped", get(routes::wrapped))
        .route("/api/leaderboard", get(routes::leaderboard))
        .route("/api/community", get(routes::community))
        .route("/api/admin/export", get(routes::admin_export))
        .route("/api/admin/clear", post(routes::admin_clear))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

/// Serve `state` on `listen_addr` until `shutdown` resolves.
pub async fn run_server<F>(listen_addr: &str, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {listen_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Wrapped API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
