//! Mock source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::artwork::{Artwork, SourceTag};
use crate::source::{ArtSource, SourceError, Tier};

/// A recorded call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// "fetch" or "search".
    pub operation: &'static str,
    /// Quota for fetches, limit for searches.
    pub amount: usize,
    pub query: Option<String>,
    pub timestamp: Instant,
}

/// How a mock call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Upstream answered 503.
    Unavailable,
    /// Upstream answered 429.
    RateLimited,
    /// Body was not the expected JSON.
    Malformed,
    /// The adapter panicked.
    Panic,
}

impl MockFailure {
    fn into_error(self) -> SourceError {
        match self {
            MockFailure::Unavailable => SourceError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            },
            MockFailure::RateLimited => SourceError::RateLimited,
            MockFailure::Malformed => {
                SourceError::Parse("expected value at line 1 column 1".to_string())
            }
            MockFailure::Panic => panic!("mock source panicked"),
        }
    }
}

/// Mock implementation of the ArtSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable artworks (the quota is recorded, not enforced)
/// - Simulate latency, failures, panics and missing credentials
/// - Track calls for assertions
///
/// # Example
///
/// ```rust,ignore
/// use advisor_core::testing::{MockSource, MockFailure, fixtures};
///
/// let source = MockSource::new(SourceTag::Harvard)
///     .with_artworks(fixtures::artworks(SourceTag::Harvard, 3))
///     .with_delay(Duration::from_millis(50));
///
/// source.set_failure(Some(MockFailure::Unavailable)).await;
/// assert!(source.fetch(10).await.is_empty());
/// assert_eq!(source.call_count().await, 1);
/// ```
pub struct MockSource {
    tag: SourceTag,
    tier: Tier,
    requires_credential: bool,
    configured: bool,
    search_supported: bool,
    artworks: RwLock<Vec<Artwork>>,
    delay: RwLock<Option<Duration>>,
    failure: RwLock<Option<MockFailure>>,
    calls: RwLock<Vec<RecordedCall>>,
    /// Calls that ran to the end, including ones nobody waited for.
    completed: AtomicUsize,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("tag", &self.tag)
            .field("tier", &self.tier)
            .field("configured", &self.configured)
            .field("artworks", &"<artworks>")
            .finish()
    }
}

impl MockSource {
    /// Create a mock for `tag`, in that source's usual tier, returning nothing.
    pub fn new(tag: SourceTag) -> Self {
        Self {
            tag,
            tier: Tier::of(tag),
            requires_credential: false,
            configured: true,
            search_supported: false,
            artworks: RwLock::new(Vec::new()),
            delay: RwLock::new(None),
            failure: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_artworks(mut self, artworks: Vec<Artwork>) -> Self {
        *self.artworks.get_mut() = artworks;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        *self.delay.get_mut() = Some(delay);
        self
    }

    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        *self.failure.get_mut() = Some(failure);
        self
    }

    /// Credential-gated, with the credential missing.
    pub fn without_credential(mut self) -> Self {
        self.requires_credential = true;
        self.configured = false;
        self
    }

    pub fn with_search(mut self) -> Self {
        self.search_supported = true;
        self
    }

    /// Set the artworks to return for subsequent calls.
    pub async fn set_artworks(&self, artworks: Vec<Artwork>) {
        *self.artworks.write().await = artworks;
    }

    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Make subsequent calls fail (or succeed again with `None`).
    pub async fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.write().await = failure;
    }

    /// Get recorded calls.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Calls that finished, whether or not anyone was still waiting.
    pub fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        operation: &'static str,
        amount: usize,
        query: Option<&str>,
    ) -> Result<Vec<Artwork>, SourceError> {
        self.calls.write().await.push(RecordedCall {
            operation,
            amount,
            query: query.map(str::to_string),
            timestamp: Instant::now(),
        });

        if !self.configured {
            return Err(SourceError::MissingCredential("mock credential"));
        }

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = *self.failure.read().await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }

        let artworks = self.artworks.read().await;
        Ok(match query {
            Some(q) => {
                let q = q.to_lowercase();
                artworks
                    .iter()
                    .filter(|a| {
                        a.title.to_lowercase().contains(&q) || a.artist.to_lowercase().contains(&q)
                    })
                    .take(amount)
                    .cloned()
                    .collect()
            }
            None => artworks.clone(),
        })
    }
}

#[async_trait]
impl ArtSource for MockSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requires_credential(&self) -> bool {
        self.requires_credential
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn supports_search(&self) -> bool {
        self.search_supported
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        self.respond("fetch", quota, None).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.respond("search", limit, Some(query)).await
    }
}
