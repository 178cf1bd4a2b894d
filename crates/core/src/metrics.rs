//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Source adapters (requests by outcome, latency, rejected records)
//! - Aggregator (tier decisions, artworks returned)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Source Metrics
// =============================================================================

/// Source calls by outcome.
pub static SOURCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("advisor_source_requests_total", "Total source calls"),
        &["source", "outcome"], // "success", "empty", "failed", "timeout", "skipped"
    )
    .unwrap()
});

/// Source call duration in seconds (only calls that were attempted).
pub static SOURCE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "advisor_source_duration_seconds",
            "Duration of source calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 20.0, 30.0]),
        &["source"],
    )
    .unwrap()
});

/// Upstream records dropped during normalization.
pub static RECORDS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "advisor_records_rejected_total",
            "Upstream records dropped during normalization",
        ),
        &["source", "reason"], // "missing_image", "missing_title", "missing_id", "malformed"
    )
    .unwrap()
});

// =============================================================================
// Aggregator Metrics
// =============================================================================

/// How initial fetches were answered.
pub static TIER_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("advisor_tier_decisions_total", "Tiering decisions"),
        &["decision"], // "fast_only", "waited_slow", "untiered"
    )
    .unwrap()
});

/// Artworks returned per aggregator call.
pub static ARTWORKS_RETURNED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "advisor_artworks_returned",
            "Number of artworks returned per call",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 30.0, 50.0, 100.0]),
        &["operation"], // "initial", "more", "search"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SOURCE_REQUESTS.clone()),
        Box::new(SOURCE_DURATION.clone()),
        Box::new(RECORDS_REJECTED.clone()),
        Box::new(TIER_DECISIONS.clone()),
        Box::new(ARTWORKS_RETURNED.clone()),
    ]
}
