//! Museum catalog adapters.
//!
//! Each adapter wraps one open-access API and maps its records into
//! [`Artwork`]s. Adapters are stateless: every call picks a fresh random
//! query term or page so repeated calls surface different artworks.
//!
//! Failures are reported through [`SourceError`] by `try_fetch`/`try_search`.
//! The provided `fetch`/`search` methods swallow them into an empty result,
//! which is what callers outside the aggregator should use.

mod artic;
mod cleveland;
mod europeana;
mod harvard;
pub(crate) mod http;
mod met;
mod nypl;
mod rijks;
mod smithsonian;
mod vam;

pub use artic::ArticSource;
pub use cleveland::ClevelandSource;
pub use europeana::EuropeanaSource;
pub use harvard::HarvardSource;
pub use met::MetSource;
pub use nypl::NyplSource;
pub use rijks::{RijksDetail, RijksSource};
pub use smithsonian::SmithsonianSource;
pub use vam::VamSource;

use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::artwork::{Artwork, Rejected, SourceTag};
use crate::config::Config;
use crate::metrics::RECORDS_REJECTED;

/// Most catalogs cap page sizes at 100.
pub(crate) const MAX_PAGE_SIZE: usize = 100;

/// Errors that can occur when talking to a museum API.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Required credential is not configured. No request was made.
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

impl SourceError {
    /// Whether this is the expected "not configured" case rather than an outage.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, SourceError::MissingCredential(_))
    }
}

/// Latency class of a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// No credential, usually answers quickly.
    Fast,
    /// Credential-gated or multi-call, usually slow.
    Slow,
}

impl Tier {
    /// The tier a built-in source belongs to.
    pub fn of(tag: SourceTag) -> Tier {
        match tag {
            SourceTag::Met | SourceTag::Artic | SourceTag::Cleveland | SourceTag::Vam => {
                Tier::Fast
            }
            SourceTag::Rijks
            | SourceTag::Harvard
            | SourceTag::Smithsonian
            | SourceTag::Europeana
            | SourceTag::Nypl => Tier::Slow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Slow => "slow",
        }
    }
}

/// One museum catalog.
#[async_trait]
pub trait ArtSource: Send + Sync {
    /// Which museum this adapter talks to.
    fn tag(&self) -> SourceTag;

    fn tier(&self) -> Tier {
        Tier::of(self.tag())
    }

    /// Whether the API needs a key or token.
    fn requires_credential(&self) -> bool {
        false
    }

    /// False when a required credential is missing.
    fn is_configured(&self) -> bool {
        true
    }

    fn supports_search(&self) -> bool {
        false
    }

    /// Fetch up to roughly `quota` artworks. The quota is advisory.
    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError>;

    /// Free-text search.
    async fn try_search(&self, _query: &str, _limit: usize) -> Result<Vec<Artwork>, SourceError> {
        Ok(Vec::new())
    }

    /// Like [`ArtSource::try_fetch`], but any failure yields an empty result.
    async fn fetch(&self, quota: usize) -> Vec<Artwork> {
        match self.try_fetch(quota).await {
            Ok(artworks) => artworks,
            Err(e) => {
                log_source_error(self.tag(), "fetch", &e);
                Vec::new()
            }
        }
    }

    /// Like [`ArtSource::try_search`], but any failure yields an empty result.
    async fn search(&self, query: &str, limit: usize) -> Vec<Artwork> {
        match self.try_search(query, limit).await {
            Ok(artworks) => artworks,
            Err(e) => {
                log_source_error(self.tag(), "search", &e);
                Vec::new()
            }
        }
    }
}

/// Log a source failure. A missing credential is expected and stays quiet.
pub fn log_source_error(tag: SourceTag, operation: &str, error: &SourceError) {
    if error.is_missing_credential() {
        debug!(source = %tag, operation, error = %error, "Source skipped");
    } else {
        warn!(source = %tag, operation, error = %error, "Source request failed");
    }
}

/// Create every enabled source from configuration.
///
/// Credential-gated sources are created even without a credential; they
/// report `is_configured() == false` and never touch the network.
pub fn build_sources(config: &Config) -> Result<Vec<Arc<dyn ArtSource>>, SourceError> {
    let client = http::build_client(&config.http)?;
    let mut sources: Vec<Arc<dyn ArtSource>> = Vec::new();

    for tag in SourceTag::ALL {
        let source_config = config.sources.get(tag);
        if !source_config.enabled {
            info!(source = %tag, "Source disabled in config");
            continue;
        }

        let client = client.clone();
        let source: Arc<dyn ArtSource> = match tag {
            SourceTag::Met => Arc::new(MetSource::new(client, source_config)),
            SourceTag::Artic => Arc::new(ArticSource::new(client, source_config)),
            SourceTag::Cleveland => Arc::new(ClevelandSource::new(client, source_config)),
            SourceTag::Vam => Arc::new(VamSource::new(client, source_config)),
            SourceTag::Rijks => Arc::new(RijksSource::new(client, source_config)),
            SourceTag::Harvard => Arc::new(HarvardSource::new(client, source_config)),
            SourceTag::Smithsonian => Arc::new(SmithsonianSource::new(client, source_config)),
            SourceTag::Europeana => Arc::new(EuropeanaSource::new(client, source_config)),
            SourceTag::Nypl => Arc::new(NyplSource::new(client, source_config)),
        };

        if !source.is_configured() {
            info!(source = %tag, "No credential configured, source will be skipped");
        }
        sources.push(source);
    }

    Ok(sources)
}

// ============================================================================
// Shared helpers for adapters
// ============================================================================

/// Pick one term from a fixed vocabulary.
pub(crate) fn pick_query(vocabulary: &[&'static str]) -> &'static str {
    vocabulary
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// Pick `n` distinct terms from a fixed vocabulary.
pub(crate) fn pick_queries(vocabulary: &[&'static str], n: usize) -> Vec<&'static str> {
    vocabulary
        .choose_multiple(&mut rand::thread_rng(), n)
        .copied()
        .collect()
}

/// Pick a page or offset uniformly from `range`.
pub(crate) fn random_in(range: RangeInclusive<u32>) -> u32 {
    rand::thread_rng().gen_range(range)
}

/// Clamp a quota to what one upstream page can return.
pub(crate) fn page_size(quota: usize) -> usize {
    quota.clamp(1, MAX_PAGE_SIZE)
}

/// Decode and normalize raw records, dropping the ones that cannot become an
/// artwork.
///
/// Records are decoded one at a time so a single record with an unexpected
/// shape is rejected on its own instead of failing the whole page.
pub(crate) fn keep_valid<R: DeserializeOwned>(
    tag: SourceTag,
    records: impl IntoIterator<Item = Value>,
    normalize: impl Fn(R) -> Result<Artwork, Rejected>,
) -> Vec<Artwork> {
    records
        .into_iter()
        .filter_map(|record| {
            let result = serde_json::from_value::<R>(record)
                .map_err(|e| {
                    trace!(source = %tag, error = %e, "Record does not decode");
                    Rejected::Malformed
                })
                .and_then(&normalize);
            match result {
                Ok(artwork) => Some(artwork),
                Err(reason) => {
                    note_rejection(tag, reason);
                    None
                }
            }
        })
        .collect()
}

/// Count and trace a rejected record.
pub(crate) fn note_rejection(tag: SourceTag, reason: Rejected) {
    trace!(source = %tag, reason = %reason, "Record rejected");
    RECORDS_REJECTED
        .with_label_values(&[tag.as_str(), reason.as_str()])
        .inc();
}

/// Resolve an API root from config, falling back to the public endpoint.
pub(crate) fn base_url(config_value: Option<&str>, default: &str) -> String {
    config_value
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkBuilder;

    #[test]
    fn test_tier_of_builtin_sources() {
        assert_eq!(Tier::of(SourceTag::Met), Tier::Fast);
        assert_eq!(Tier::of(SourceTag::Vam), Tier::Fast);
        assert_eq!(Tier::of(SourceTag::Harvard), Tier::Slow);
        assert_eq!(Tier::of(SourceTag::Nypl), Tier::Slow);
    }

    #[test]
    fn test_pick_query_stays_in_vocabulary() {
        let vocab = ["painting", "sculpture", "print"];
        for _ in 0..50 {
            assert!(vocab.contains(&pick_query(&vocab)));
        }
    }

    #[test]
    fn test_pick_queries_are_distinct() {
        let vocab = ["painting", "sculpture", "print", "drawing"];
        let picked = pick_queries(&vocab, 2);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn test_random_in_range() {
        for _ in 0..50 {
            let page = random_in(1..=10);
            assert!((1..=10).contains(&page));
        }
    }

    #[test]
    fn test_page_size_clamps() {
        assert_eq!(page_size(0), 1);
        assert_eq!(page_size(25), 25);
        assert_eq!(page_size(500), MAX_PAGE_SIZE);
    }

    #[derive(Deserialize)]
    struct Record {
        id: u32,
        image: Option<String>,
    }

    fn normalize_record(record: Record) -> Result<Artwork, Rejected> {
        ArtworkBuilder::new(SourceTag::Artic, record.id.to_string())
            .image_url(record.image)
            .build()
    }

    #[test]
    fn test_keep_valid_drops_rejections() {
        let records = vec![
            serde_json::json!({"id": 0, "image": "a.jpg"}),
            serde_json::json!({"id": 1, "image": null}),
            serde_json::json!({"id": 2, "image": "c.jpg"}),
        ];
        let kept = keep_valid(SourceTag::Artic, records, normalize_record);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "artic-0");
        assert_eq!(kept[1].id, "artic-2");
    }

    #[test]
    fn test_keep_valid_drops_only_the_undecodable_record() {
        let records = vec![
            serde_json::json!({"id": "not-a-number", "image": "a.jpg"}),
            serde_json::json!({"id": 7, "image": "b.jpg"}),
        ];
        let before = RECORDS_REJECTED
            .with_label_values(&["artic", "malformed"])
            .get();

        let kept = keep_valid(SourceTag::Artic, records, normalize_record);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "artic-7");
        let after = RECORDS_REJECTED
            .with_label_values(&["artic", "malformed"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        assert_eq!(
            base_url(Some("http://localhost:1234/api/"), "https://x"),
            "http://localhost:1234/api"
        );
        assert_eq!(base_url(None, "https://x/v1"), "https://x/v1");
    }

    #[test]
    fn test_build_sources_respects_enabled_flag() {
        let mut config = Config::default();
        config.sources.vam.enabled = false;

        let sources = build_sources(&config).unwrap();
        assert_eq!(sources.len(), 8);
        assert!(sources.iter().all(|s| s.tag() != SourceTag::Vam));

        // Credential-gated sources exist but are not configured
        let harvard = sources
            .iter()
            .find(|s| s.tag() == SourceTag::Harvard)
            .unwrap();
        assert!(harvard.requires_credential());
        assert!(!harvard.is_configured());
    }
}
