use serde::{Deserialize, Serialize};

use crate::config::AggregatorConfig;

/// When to stop waiting for the slow tier on an initial fetch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TieringPolicy {
    /// Off means every initial fetch waits for all sources.
    pub enabled: bool,
    /// Fast-tier artworks that make the slow tier unnecessary.
    pub fast_threshold: usize,
}

impl Default for TieringPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            fast_threshold: 10,
        }
    }
}

/// Outcome of [`TieringPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierDecision {
    /// Enough fast results: answer now, leave the slow tier running.
    ReturnFast,
    /// Too few fast results: wait for the slow tier and merge.
    AwaitSlow,
}

impl TierDecision {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierDecision::ReturnFast => "fast_only",
            TierDecision::AwaitSlow => "waited_slow",
        }
    }
}

impl TieringPolicy {
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self {
            enabled: config.enable_tiering,
            fast_threshold: config.fast_tier_threshold,
        }
    }

    /// Decide from the number of artworks the fast tier produced.
    pub fn decide(&self, fast_count: usize) -> TierDecision {
        if fast_count >= self.fast_threshold {
            TierDecision::ReturnFast
        } else {
            TierDecision::AwaitSlow
        }
    }
}
