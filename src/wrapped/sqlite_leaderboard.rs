//! SqliteLeaderboard - SQLite implementation of the leaderboard storage
//!
//! One row per address. Writes are a single `INSERT ... ON CONFLICT` statement,
//! so an interrupted upsert never leaves a half-written row behind.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

use crate::wrapped::storage::{LeaderboardRecord, LeaderboardStorage};

/// Helper type for deserializing rows
#[derive(FromRow)]
struct LeaderboardRow {
    address: String,
    score: i64,
    rank_title: String,
    protocol_count: i64,
    handle: Option<String>,
    avatar_url: Option<String>,
    updated_at: i64,
}

impl From<LeaderboardRow> for LeaderboardRecord {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            address: row.address,
            score: u32::try_from(row.score).unwrap_or(0),
            rank_title: row.rank_title,
            protocol_count: u32::try_from(row.protocol_count).unwrap_or(0),
            handle: row.handle,
            avatar_url: row.avatar_url,
            timestamp: row.updated_at,
        }
    }
}

/// SQLite-backed leaderboard.
pub struct SqliteLeaderboard {
    pool: Pool<Sqlite>,
}

impl SqliteLeaderboard {
    /// Connect to `database_url` (e.g. `sqlite:./leaderboard.db?mode=rwc`) and
    /// create the schema if needed.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Arc<Self>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        Self::create_schema(&pool).await?;

        info!("SqliteLeaderboard initialized and connected to {}", database_url);

        Ok(Arc::new(Self { pool }))
    }

    /// Private in-memory database. A single connection that is never recycled,
    /// since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Arc<Self>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::create_schema(&pool).await?;

        Ok(Arc::new(Self { pool }))
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard_entries (
                address TEXT PRIMARY KEY NOT NULL,
                score INTEGER NOT NULL,
                rank_title TEXT NOT NULL,
                protocol_count INTEGER NOT NULL,
                handle TEXT,
                avatar_url TEXT,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create leaderboard_entries table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_leaderboard_rank
            ON leaderboard_entries (score DESC, updated_at DESC);
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create leaderboard rank index")?;

        Ok(())
    }

    /// Get a reference to the database pool
    pub fn get_db_pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl LeaderboardStorage for SqliteLeaderboard {
    async fn upsert_record(&self, record: &LeaderboardRecord) -> Result<()> {
        debug!("Upserting leaderboard record for {}", record.address);

        sqlx::query(
            r#"
            INSERT INTO leaderboard_entries (
                address, score, rank_title, protocol_count, handle, avatar_url, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                score = excluded.score,
                rank_title = excluded.rank_title,
                protocol_count = excluded.protocol_count,
                handle = excluded.handle,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at;
            "#,
        )
        .bind(&record.address)
        .bind(i64::from(record.score))
        .bind(&record.rank_title)
        .bind(i64::from(record.protocol_count))
        .bind(&record.handle)
        .bind(&record.avatar_url)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert leaderboard record for {}", record.address))?;

        Ok(())
    }

    async fn get_record(&self, address: &str) -> Result<Option<LeaderboardRecord>> {
        let row: Option<LeaderboardRow> =
            sqlx::query_as("SELECT * FROM leaderboard_entries WHERE address = ?")
                .bind(address)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch leaderboard record")?;

        Ok(row.map(LeaderboardRecord::from))
    }

    async fn top_records(&self, limit: u32) -> Result<Vec<LeaderboardRecord>> {
        self.page_records(0, limit).await
    }

    async fn page_records(&self, offset: u32, limit: u32) -> Result<Vec<LeaderboardRecord>> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            r#"
            SELECT * FROM leaderboard_entries
            ORDER BY score DESC, updated_at DESC
            LIMIT ? OFFSET ?;
            "#,
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch leaderboard page")?;

        Ok(rows.into_iter().map(LeaderboardRecord::from).collect())
    }

    async fn record_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leaderboard_entries")
            .fetch_one(&self.pool)
            .await
            .context("Failed to get leaderboard record count")?;

        Ok(count.0)
    }

    async fn all_records(&self) -> Result<Vec<LeaderboardRecord>> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "SELECT * FROM leaderboard_entries ORDER BY score DESC, updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch leaderboard records")?;

        Ok(rows.into_iter().map(LeaderboardRecord::from).collect())
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM leaderboard_entries")
            .execute(&self.pool)
            .await
            .context("Failed to clear leaderboard")?;

        info!("Cleared {} leaderboard records", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}
