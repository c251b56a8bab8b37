//! Route handlers.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::server::{AppError, AppState};
use crate::types::{SocialIdentity, YearlySummary};
use crate::wrapped::leaderboard_writer::submit_record;
use crate::wrapped::metrics::MetricsSnapshot;
use crate::wrapped::LeaderboardRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 9;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const CSV_HEADER: &str = "Address,Score,Tier,ProtocolCount,Handle,Avatar,Timestamp";
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Deserialize)]
pub struct WrappedQuery {
    pub address: Option<String>,
    pub year: Option<String>,
}

/// `GET /api/wrapped`
pub async fn wrapped(
    State(state): State<Arc<AppState>>,
    identity: SocialIdentity,
    Query(query): Query<WrappedQuery>,
) -> Result<Json<YearlySummary>, AppError> {
    let address = query.address.ok_or(AppError::MissingAddress)?;
    let year = parse_year(query.year.as_deref(), state.default_year);

    let summary = state.summaries.build(&address, year).await?;

    if identity.is_authenticated() {
        let record = LeaderboardRecord::from_summary(
            &summary,
            &identity,
            Utc::now().timestamp_millis(),
        );
        submit_record(&state.records, record, &state.metrics).await;
    }

    Ok(Json(summary))
}

/// Missing, unparseable or zero years fall back to `default_year`.
pub fn parse_year(raw: Option<&str>, default_year: i32) -> i32 {
    raw.and_then(|year| year.trim().parse::<i32>().ok())
        .filter(|year| *year != 0)
        .unwrap_or(default_year)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub total: i64,
    pub users: Vec<LeaderboardRecord>,
    pub has_more: bool,
}

/// Page number (1-based) and page size from raw query values.
pub fn parse_page(page: Option<&str>, limit: Option<&str>) -> (u32, u32) {
    let page = page
        .and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);
    let limit = limit
        .and_then(|l| l.trim().parse::<u32>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

/// `GET /api/leaderboard`
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    let (page, limit) = parse_page(query.page.as_deref(), query.limit.as_deref());
    let offset = (page - 1).saturating_mul(limit);

    let total = state.storage.record_count().await?;
    let users = state.storage.page_records(offset, limit).await?;
    let has_more = i64::from(offset) + (users.len() as i64) < total;

    Ok(Json(LeaderboardPage {
        total,
        users,
        has_more,
    }))
}

/// `GET /api/community`
pub async fn community(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardRecord>>, AppError> {
    let storage = state.storage.clone();
    let top_n = state.leaderboard_top_n;

    let feed = state
        .community_feed
        .try_get_with((), async move {
            debug!("Refreshing community feed");
            storage.top_records(top_n).await.map(Arc::new)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("{:#}", e)))?;

    Ok(Json(feed.as_ref().clone()))
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub secret: Option<String>,
    pub format: Option<String>,
}

fn authorize(state: &AppState, secret: Option<&str>) -> Result<(), AppError> {
    match (state.admin_secret.as_deref(), secret) {
        (Some(expected), Some(given)) if expected == given => Ok(()),
        _ => {
            warn!("Rejected admin request");
            Err(AppError::Unauthorized)
        }
    }
}

/// `GET /api/admin/export`
pub async fn admin_export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, AppError> {
    authorize(&state, query.secret.as_deref())?;

    let records = state.storage.all_records().await?;
    info!("Exporting {} leaderboard records", records.len());

    match query.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(serde_json::json!({
            "count": records.len(),
            "users": records,
        }))
        .into_response()),
        "csv" => {
            let filename = format!(
                "attachment; filename=\"wrapped-leaderboard-{}.csv\"",
                Utc::now().format("%Y-%m-%d")
            );
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, filename),
                ],
                records_to_csv(&records),
            )
                .into_response())
        }
        other => Err(AppError::BadRequest(format!("Unsupported export format: {other}"))),
    }
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn iso_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// CSV export with a UTF-8 BOM so spreadsheet tools pick the right encoding.
pub fn records_to_csv(records: &[LeaderboardRecord]) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str(CSV_HEADER);
    for record in records {
        let row = [
            csv_field(&record.address),
            csv_field(&record.score.to_string()),
            csv_field(&record.rank_title),
            csv_field(&record.protocol_count.to_string()),
            csv_field(record.handle.as_deref().unwrap_or("")),
            csv_field(record.avatar_url.as_deref().unwrap_or("")),
            csv_field(&iso_timestamp(record.timestamp)),
        ];
        out.push('\n');
        out.push_str(&row.join(","));
    }
    out
}

/// `POST /api/admin/clear`
pub async fn admin_clear(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    authorize(&state, query.secret.as_deref())?;

    let removed = state.storage.clear().await?;
    state.community_feed.invalidate_all();
    info!("Admin cleared {} leaderboard records", removed);

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Cleared {removed} records. Leaderboard is now empty."),
    })))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(true) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))),
        Ok(false) | Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "degraded" })),
        ),
    }
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.get_metrics_snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(None, 2025), 2025);
        assert_eq!(parse_year(Some("2024"), 2025), 2024);
        assert_eq!(parse_year(Some("0"), 2025), 2025);
        assert_eq!(parse_year(Some("last year"), 2025), 2025);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None, None), (1, 9));
        assert_eq!(parse_page(Some("3"), Some("20")), (3, 20));
        assert_eq!(parse_page(Some("0"), Some("0")), (1, 9));
        assert_eq!(parse_page(Some("-2"), Some("5000")), (1, 100));
    }

    #[test]
    fn test_csv_quotes_and_bom() {
        let records = vec![LeaderboardRecord {
            address: "0xabc".to_string(),
            score: 4045,
            rank_title: "Active Voyager".to_string(),
            protocol_count: 3,
            handle: Some("say \"hi\", ok".to_string()),
            avatar_url: None,
            timestamp: 0,
        }];

        let csv = records_to_csv(&records);
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("\u{feff}Address,Score,Tier,ProtocolCount,Handle,Avatar,Timestamp"));
        assert_eq!(
            lines.next(),
            Some(r#""0xabc","4045","Active Voyager","3","say ""hi"", ok","","1970-01-01T00:00:00.000Z""#)
        );
        assert_eq!(lines.next(), None);
    }
}
