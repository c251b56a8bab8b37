//! LeaderboardWriter - background sink for leaderboard records
//!
//! Request handlers enqueue records and move on; this task drains the channel
//! and upserts each record with a bounded timeout.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::wrapped::metrics::{self, MetricsCollector};
use crate::wrapped::storage::{LeaderboardRecord, LeaderboardStorage};
use crate::wrapped::types::{LeaderboardRecordReceiver, LeaderboardRecordSender};

/// Drains queued records into a [`LeaderboardStorage`].
pub struct LeaderboardWriter {
    storage: Arc<dyn LeaderboardStorage>,
    record_receiver: LeaderboardRecordReceiver,
    write_timeout: Duration,
    metrics: MetricsCollector,
}

impl LeaderboardWriter {
    pub fn new(
        storage: Arc<dyn LeaderboardStorage>,
        record_receiver: LeaderboardRecordReceiver,
        write_timeout: Duration,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            storage,
            record_receiver,
            write_timeout,
            metrics,
        }
    }

    /// Main execution loop; returns once every sender is dropped.
    pub async fn run(mut self) {
        info!("LeaderboardWriter is running...");
        while let Some(record) = self.record_receiver.recv().await {
            self.write(&record).await;
        }
        info!("LeaderboardWriter channel closed. Shutting down.");
    }

    async fn write(&self, record: &LeaderboardRecord) {
        match tokio::time::timeout(self.write_timeout, self.storage.upsert_record(record)).await {
            Ok(Ok(())) => {
                self.metrics.increment_counter(metrics::LEADERBOARD_WRITES).await;
            }
            Ok(Err(e)) => {
                error!("Failed to upsert leaderboard record for {}: {:?}", record.address, e);
                self.metrics.increment_counter(metrics::LEADERBOARD_WRITE_FAILURES).await;
            }
            Err(_) => {
                error!(
                    "Leaderboard upsert for {} timed out after {:?}",
                    record.address, self.write_timeout
                );
                self.metrics.increment_counter(metrics::LEADERBOARD_WRITE_FAILURES).await;
            }
        }
    }
}

/// Enqueue a record without waiting. Returns `false` if it was dropped
/// because the queue is full or the writer has stopped.
pub async fn submit_record(
    sender: &LeaderboardRecordSender,
    record: LeaderboardRecord,
    metrics: &MetricsCollector,
) -> bool {
    match sender.try_send(record) {
        Ok(()) => true,
        Err(e) => {
            warn!("Dropping leaderboard record: {}", e);
            metrics.increment_counter(metrics::LEADERBOARD_DROPPED).await;
            false
        }
    }
}
