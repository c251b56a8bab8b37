//! Summary builder: raw address and year to a [`YearlySummary`].
//!
//! Invalid input is the only failure this layer reports. A degraded detection
//! produces a normal-looking summary for a low-activity address.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::types::YearlySummary;
use crate::wrapped::address::normalize;
use crate::wrapped::detector::ProtocolDetector;
use crate::wrapped::metrics::{self, MetricsCollector};
use crate::wrapped::scoring;

/// Errors returned by [`SummaryBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Invalid Sui address: {input:?}")]
    InvalidAddress { input: String },
}

/// A personality entry, selected by minimum protocol count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Personality {
    pub min_protocols: usize,
    pub tag: &'static str,
    pub sentence: &'static str,
}

/// Highest threshold first; the last entry matches everything.
pub const PERSONALITIES: &[Personality] = &[
    Personality {
        min_protocols: 7,
        tag: "Ecosystem Native",
        sentence: "You roamed the whole Sui ecosystem this year.",
    },
    Personality {
        min_protocols: 4,
        tag: "Power User",
        sentence: "You were a true Bucket power user this year.",
    },
    Personality {
        min_protocols: 2,
        tag: "Active User",
        sentence: "You actively used Bucket throughout the year.",
    },
    Personality {
        min_protocols: 0,
        tag: "Quiet Observer",
        sentence: "You quietly explored Bucket this year.",
    },
];

pub fn personality_for(protocol_count: usize) -> &'static Personality {
    PERSONALITIES
        .iter()
        .find(|p| protocol_count >= p.min_protocols)
        .unwrap_or(&PERSONALITIES[PERSONALITIES.len() - 1])
}

/// Orchestrates normalize, detect, score and assemble.
pub struct SummaryBuilder {
    detector: Arc<ProtocolDetector>,
    metrics: MetricsCollector,
}

impl SummaryBuilder {
    pub fn new(detector: Arc<ProtocolDetector>, metrics: MetricsCollector) -> Self {
        Self { detector, metrics }
    }

    /// Build the summary of `raw_address` for `year`.
    #[instrument(skip(self))]
    pub async fn build(&self, raw_address: &str, year: i32) -> Result<YearlySummary, SummaryError> {
        let address = match normalize(raw_address) {
            Some(address) => address,
            None => {
                self.metrics.increment_counter(metrics::INVALID_ADDRESSES).await;
                return Err(SummaryError::InvalidAddress {
                    input: raw_address.to_string(),
                });
            }
        };

        let protocols = self.detector.detect(&address).await;
        let protocol_count = protocols.len();
        let score = scoring::score(protocol_count, address.as_str());
        let personality = personality_for(protocol_count);

        info!(
            "Built summary for {}: {} protocol(s), score {} ({})",
            address, protocol_count, score.score, score.rank_title
        );
        self.metrics.increment_counter(metrics::SUMMARIES_BUILT).await;

        Ok(YearlySummary {
            address,
            year,
            protocols,
            protocol_count,
            score: score.score,
            rank_title: score.rank_title,
            rank_description: score.rank_description,
            multiplier: score.multiplier,
            personality_tags: vec![personality.tag.to_string()],
            og_sentence: personality.sentence.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personality_thresholds() {
        assert_eq!(personality_for(0).tag, "Quiet Observer");
        assert_eq!(personality_for(1).sentence, "You quietly explored Bucket this year.");
        assert_eq!(personality_for(2).tag, "Active User");
        assert_eq!(personality_for(4).tag, "Power User");
        assert_eq!(personality_for(9).tag, "Ecosystem Native");
    }

    #[test]
    fn test_error_message_names_input() {
        let err = SummaryError::InvalidAddress {
            input: "0xzz".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid Sui address: \"0xzz\"");
    }
}
