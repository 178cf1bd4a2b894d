//! Per-source health as observed by the aggregator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::artwork::SourceTag;
use crate::source::Tier;

/// How the last call to a source ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// Returned at least one artwork.
    Success,
    /// Answered, but nothing usable.
    Empty,
    /// Error from the source.
    Failed,
    /// Deadline passed before it answered.
    Timeout,
    /// Not called (no credential).
    Skipped,
}

impl CallOutcome {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Empty => "empty",
            CallOutcome::Failed => "failed",
            CallOutcome::Timeout => "timeout",
            CallOutcome::Skipped => "skipped",
        }
    }
}

/// Status of a single source, for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: SourceTag,
    /// Museum display name.
    pub name: String,
    pub tier: Tier,
    /// False when a required credential is missing.
    pub configured: bool,
    pub requires_credential: bool,
    pub supports_search: bool,
    pub deadline_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<CallOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Latest observation for one source.
#[derive(Debug, Clone)]
pub(crate) struct Observation {
    pub last_used: DateTime<Utc>,
    pub outcome: CallOutcome,
    pub count: usize,
    pub error: Option<String>,
}

/// Shared record of the latest call to each source.
///
/// Cloned into detached slow-tier tasks, so results that arrive after the
/// caller stopped waiting are still recorded.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusBoard {
    inner: Arc<RwLock<HashMap<SourceTag, Observation>>>,
}

impl StatusBoard {
    pub async fn record(&self, tag: SourceTag, observation: Observation) {
        self.inner.write().await.insert(tag, observation);
    }

    pub async fn get(&self, tag: SourceTag) -> Option<Observation> {
        self.inner.read().await.get(&tag).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_board_keeps_latest_observation() {
        let board = StatusBoard::default();
        assert!(board.get(SourceTag::Met).await.is_none());

        board
            .record(
                SourceTag::Met,
                Observation {
                    last_used: Utc::now(),
                    outcome: CallOutcome::Timeout,
                    count: 0,
                    error: Some("timed out".to_string()),
                },
            )
            .await;
        board
            .record(
                SourceTag::Met,
                Observation {
                    last_used: Utc::now(),
                    outcome: CallOutcome::Success,
                    count: 4,
                    error: None,
                },
            )
            .await;

        let latest = board.get(SourceTag::Met).await.unwrap();
        assert_eq!(latest.outcome, CallOutcome::Success);
        assert_eq!(latest.count, 4);
        assert!(latest.error.is_none());
    }

    #[test]
    fn test_status_serialization_omits_unknowns() {
        let status = SourceStatus {
            source: SourceTag::Rijks,
            name: "Rijksmuseum".to_string(),
            tier: Tier::Slow,
            configured: false,
            requires_credential: true,
            supports_search: false,
            deadline_ms: 15_000,
            last_used: None,
            last_outcome: None,
            last_count: None,
            last_error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["source"], "rijks");
        assert_eq!(json["tier"], "slow");
        assert!(json.get("last_used").is_none());
    }
}
