//! Fan-out over every configured source.
//!
//! The aggregator splits a requested count into per-source quotas, calls
//! sources concurrently (each under its own soft deadline), and merges what
//! comes back. A failing or slow source only costs its own share.
//!
//! Initial fetches are tiered: fast sources are awaited first, and the slow
//! tier is only waited for when the fast tier came back short.

mod status;
mod tiering;

pub use status::{CallOutcome, SourceStatus};
pub use tiering::{TierDecision, TieringPolicy};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::artwork::{Artwork, SourceTag};
use crate::config::Config;
use crate::deadline::{with_deadline, DeadlineError};
use crate::metrics::{ARTWORKS_RETURNED, SOURCE_DURATION, SOURCE_REQUESTS, TIER_DECISIONS};
use crate::source::{build_sources, log_source_error, ArtSource, SourceError, Tier};
use status::{Observation, StatusBoard};

/// A source together with how long the aggregator waits for it.
#[derive(Clone)]
pub struct SourceSlot {
    pub source: Arc<dyn ArtSource>,
    pub deadline: Duration,
}

impl SourceSlot {
    pub fn new(source: Arc<dyn ArtSource>, deadline: Duration) -> Self {
        Self { source, deadline }
    }
}

/// What to ask each source for.
#[derive(Debug, Clone)]
enum Call {
    Fetch { quota: usize },
    Search { query: Arc<str>, limit: usize },
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Call::Fetch { .. } => "fetch",
            Call::Search { .. } => "search",
        }
    }
}

/// Artworks one source contributed to a fan-out.
struct SourceResult {
    tag: SourceTag,
    artworks: Vec<Artwork>,
}

/// Multi-source artwork fetcher.
pub struct Aggregator {
    slots: Vec<SourceSlot>,
    policy: TieringPolicy,
    board: StatusBoard,
}

impl Aggregator {
    pub fn new(slots: Vec<SourceSlot>, policy: TieringPolicy) -> Self {
        Self {
            slots,
            policy,
            board: StatusBoard::default(),
        }
    }

    /// Build every enabled source from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let slots = build_sources(config)?
            .into_iter()
            .map(|source| {
                let deadline = config.deadline_for(source.tag(), source.tier());
                SourceSlot::new(source, deadline)
            })
            .collect();
        Ok(Self::new(
            slots,
            TieringPolicy::from_config(&config.aggregator),
        ))
    }

    pub fn policy(&self) -> TieringPolicy {
        self.policy
    }

    /// Number of sources that would be called right now.
    pub fn configured_sources(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.source.is_configured())
            .count()
    }

    fn active_slots(&self) -> Vec<SourceSlot> {
        self.slots
            .iter()
            .filter(|slot| {
                let configured = slot.source.is_configured();
                if !configured {
                    debug!(source = %slot.source.tag(), "Skipping unconfigured source");
                }
                configured
            })
            .cloned()
            .collect()
    }

    /// Fetch a fresh batch of up to `total` artworks.
    pub async fn fetch_initial(&self, total: usize) -> Vec<Artwork> {
        if total == 0 {
            return Vec::new();
        }
        let active = self.active_slots();
        if active.is_empty() {
            warn!("No configured sources");
            return Vec::new();
        }

        let quota = per_source_quota(total, active.len());
        let (fast, slow): (Vec<_>, Vec<_>) = active
            .into_iter()
            .partition(|slot| slot.source.tier() == Tier::Fast);
        debug!(
            total,
            quota,
            fast = fast.len(),
            slow = slow.len(),
            "Initial fetch"
        );

        let call = Call::Fetch { quota };
        let artworks = if !self.policy.enabled || fast.is_empty() || slow.is_empty() {
            TIER_DECISIONS.with_label_values(&["untiered"]).inc();
            let all = fast.into_iter().chain(slow).collect();
            merge(fan_out(all, call, self.board.clone()).await)
        } else {
            // Started alongside the fast tier; may outlive this call
            let slow_task = tokio::spawn(fan_out(slow, call.clone(), self.board.clone()));
            let fast_artworks = merge(fan_out(fast, call, self.board.clone()).await);

            let decision = self.policy.decide(fast_artworks.len());
            TIER_DECISIONS.with_label_values(&[decision.as_str()]).inc();

            match decision {
                TierDecision::ReturnFast => {
                    debug!(
                        fast_count = fast_artworks.len(),
                        "Fast tier sufficient, slow tier left running"
                    );
                    drop(slow_task);
                    fast_artworks
                }
                TierDecision::AwaitSlow => {
                    debug!(
                        fast_count = fast_artworks.len(),
                        threshold = self.policy.fast_threshold,
                        "Fast tier short, waiting for slow tier"
                    );
                    let slow_artworks = match slow_task.await {
                        Ok(results) => merge(results),
                        Err(e) => {
                            warn!(error = %e, "Slow tier task failed");
                            Vec::new()
                        }
                    };
                    collapse_duplicates(fast_artworks.into_iter().chain(slow_artworks))
                }
            }
        };

        finish("initial", artworks, total)
    }

    /// Fetch up to `total` artworks whose ids are not in `seen`.
    ///
    /// Not tiered: every configured source is awaited (up to its deadline).
    pub async fn fetch_more(&self, seen: &HashSet<String>, total: usize) -> Vec<Artwork> {
        if total == 0 {
            return Vec::new();
        }
        let active = self.active_slots();
        if active.is_empty() {
            warn!("No configured sources");
            return Vec::new();
        }

        let quota = per_source_quota(total, active.len());
        debug!(total, quota, seen = seen.len(), "Fetching more");

        let merged = merge(fan_out(active, Call::Fetch { quota }, self.board.clone()).await);
        let fetched = merged.len();
        let unseen: Vec<Artwork> = merged
            .into_iter()
            .filter(|artwork| !seen.contains(&artwork.id))
            .collect();
        debug!(fetched, unseen = unseen.len(), "Filtered seen artworks");

        finish("more", unseen, total)
    }

    /// Free-text search across every source that supports it.
    ///
    /// Results are interleaved source by source, not shuffled.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<Artwork> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let slots: Vec<SourceSlot> = self
            .active_slots()
            .into_iter()
            .filter(|slot| slot.source.supports_search())
            .collect();
        if slots.is_empty() {
            warn!("No configured source supports search");
            return Vec::new();
        }

        let call = Call::Search {
            query: Arc::from(query),
            limit,
        };
        let results = fan_out(slots, call, self.board.clone()).await;

        let mut artworks =
            collapse_duplicates(interleave(results.into_iter().map(|r| r.artworks).collect()));
        artworks.truncate(limit);

        ARTWORKS_RETURNED
            .with_label_values(&["search"])
            .observe(artworks.len() as f64);
        info!(query, count = artworks.len(), "Search complete");
        artworks
    }

    /// Configuration and last observed call for every source.
    pub async fn source_status(&self) -> Vec<SourceStatus> {
        let mut statuses = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let source = &slot.source;
            let tag = source.tag();
            let observation = self.board.get(tag).await;

            statuses.push(SourceStatus {
                source: tag,
                name: tag.display_name().to_string(),
                tier: source.tier(),
                configured: source.is_configured(),
                requires_credential: source.requires_credential(),
                supports_search: source.supports_search(),
                deadline_ms: u64::try_from(slot.deadline.as_millis()).unwrap_or(u64::MAX),
                last_used: observation.as_ref().map(|o| o.last_used),
                last_outcome: observation.as_ref().map(|o| o.outcome),
                last_count: observation.as_ref().map(|o| o.count),
                last_error: observation.and_then(|o| o.error),
            });
        }
        statuses
    }
}

/// Per-source share of `total`, rounded up.
pub fn per_source_quota(total: usize, sources: usize) -> usize {
    total.div_ceil(sources.max(1))
}

/// Call every slot concurrently and wait for all of them.
///
/// Every source call is converted into a [`SourceResult`], so this never
/// fails; an unusable source simply contributes nothing.
async fn fan_out(slots: Vec<SourceSlot>, call: Call, board: StatusBoard) -> Vec<SourceResult> {
    join_all(
        slots
            .into_iter()
            .map(|slot| call_source(slot, call.clone(), board.clone())),
    )
    .await
}

async fn call_source(slot: SourceSlot, call: Call, board: StatusBoard) -> SourceResult {
    let source = slot.source;
    let tag = source.tag();
    let operation = call.name();
    let started = Instant::now();

    let result = with_deadline(
        async move {
            match call {
                Call::Fetch { quota } => source.try_fetch(quota).await,
                Call::Search { query, limit } => source.try_search(&query, limit).await,
            }
        },
        slot.deadline,
    )
    .await;
    let elapsed = started.elapsed();

    let (outcome, artworks, error) = match result {
        Ok(Ok(artworks)) if artworks.is_empty() => (CallOutcome::Empty, artworks, None),
        Ok(Ok(artworks)) => (CallOutcome::Success, artworks, None),
        Ok(Err(e)) => {
            log_source_error(tag, operation, &e);
            if e.is_missing_credential() {
                (CallOutcome::Skipped, Vec::new(), None)
            } else {
                (CallOutcome::Failed, Vec::new(), Some(e.to_string()))
            }
        }
        Err(e @ DeadlineError::Elapsed { .. }) => {
            warn!(source = %tag, operation, error = %e, "Source timed out");
            (CallOutcome::Timeout, Vec::new(), Some(e.to_string()))
        }
        Err(e) => {
            warn!(source = %tag, operation, error = %e, "Source task failed");
            (CallOutcome::Failed, Vec::new(), Some(e.to_string()))
        }
    };

    SOURCE_REQUESTS
        .with_label_values(&[tag.as_str(), outcome.as_str()])
        .inc();
    if outcome != CallOutcome::Skipped {
        SOURCE_DURATION
            .with_label_values(&[tag.as_str()])
            .observe(elapsed.as_secs_f64());
    }
    debug!(
        source = %tag,
        operation,
        outcome = outcome.as_str(),
        count = artworks.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Source call finished"
    );

    board
        .record(
            tag,
            Observation {
                last_used: Utc::now(),
                outcome,
                count: artworks.len(),
                error,
            },
        )
        .await;

    SourceResult { tag, artworks }
}

fn merge(results: Vec<SourceResult>) -> Vec<Artwork> {
    for result in &results {
        debug!(source = %result.tag, count = result.artworks.len(), "Merging");
    }
    collapse_duplicates(results.into_iter().flat_map(|r| r.artworks))
}

/// Keep the first artwork for each id.
fn collapse_duplicates(artworks: impl IntoIterator<Item = Artwork>) -> Vec<Artwork> {
    let mut seen = HashSet::new();
    artworks
        .into_iter()
        // Artwork fields are public; never hand out one without an image
        .filter(|artwork| !artwork.image_url.is_empty())
        .filter(|artwork| seen.insert(artwork.id.clone()))
        .collect()
}

/// Round-robin across per-source batches.
fn interleave(batches: Vec<Vec<Artwork>>) -> Vec<Artwork> {
    let capacity = batches.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = batches.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::with_capacity(capacity);

    loop {
        let before = out.len();
        for iter in iters.iter_mut() {
            if let Some(artwork) = iter.next() {
                out.push(artwork);
            }
        }
        if out.len() == before {
            break;
        }
    }
    out
}

/// Shuffle, cap at `total`, and record the result size.
fn finish(operation: &str, mut artworks: Vec<Artwork>, total: usize) -> Vec<Artwork> {
    artworks.shuffle(&mut rand::thread_rng());
    artworks.truncate(total);

    ARTWORKS_RETURNED
        .with_label_values(&[operation])
        .observe(artworks.len() as f64);
    info!(operation, count = artworks.len(), requested = total, "Artworks ready");
    artworks
}
