//! Metropolitan Museum of Art adapter.
//!
//! The Met search endpoint only returns object ids, so every artwork costs a
//! second request for the object record. Object fetches run with bounded
//! concurrency and stop as soon as the quota is filled.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::get_json;
use super::{base_url, note_rejection, pick_queries, ArtSource, SourceError};
use crate::artwork::{present, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1";

const VOCABULARY: &[&str] = &[
    "painting",
    "impressionism",
    "modern art",
    "portrait",
    "landscape",
    "sculpture",
    "abstract",
    "renaissance",
];

/// Search terms tried per fetch.
const QUERIES_PER_FETCH: usize = 2;
/// Ids kept from each search response.
const IDS_PER_QUERY: usize = 100;
/// Object requests in flight at once.
const DETAIL_CONCURRENCY: usize = 6;

/// The Met collection API.
pub struct MetSource {
    client: Client,
    base_url: String,
}

impl MetSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
        }
    }

    /// Object ids matching `query` that have images.
    async fn search_ids(&self, query: &str) -> Result<Vec<u64>, SourceError> {
        let url = format!("{}/search", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("hasImages", "true"), ("q", query)]);

        let response: MetSearchResponse = get_json(SourceTag::Met, request).await?;
        debug!(
            source = "met",
            query,
            total = response.total.unwrap_or(0),
            "Search complete"
        );
        Ok(response.object_ids.unwrap_or_default())
    }

    /// One object record. Failures drop the object.
    async fn object(&self, id: u64) -> Option<Artwork> {
        let url = format!("{}/objects/{}", self.base_url, id);
        let raw: MetObject = match get_json(SourceTag::Met, self.client.get(&url)).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(source = "met", object_id = id, error = %e, "Object fetch failed");
                return None;
            }
        };

        match normalize(raw) {
            Ok(artwork) => Some(artwork),
            Err(reason) => {
                note_rejection(SourceTag::Met, reason);
                None
            }
        }
    }
}

#[async_trait]
impl ArtSource for MetSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Met
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let terms = pick_queries(VOCABULARY, QUERIES_PER_FETCH);
        let results = join_all(terms.iter().map(|term| self.search_ids(term))).await;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut last_error = None;
        for (term, result) in terms.iter().zip(results) {
            match result {
                Ok(found) => ids.extend(
                    found
                        .into_iter()
                        .take(IDS_PER_QUERY)
                        .filter(|id| seen.insert(*id)),
                ),
                Err(e) => {
                    warn!(source = "met", query = %term, error = %e, "Search failed");
                    last_error = Some(e);
                }
            }
        }

        // Every search failed: report it instead of an empty success
        if ids.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
            return Ok(Vec::new());
        }

        ids.shuffle(&mut rand::thread_rng());

        let artworks: Vec<Artwork> = stream::iter(ids)
            .map(|id| self.object(id))
            .buffer_unordered(DETAIL_CONCURRENCY)
            .filter_map(|artwork| async move { artwork })
            .take(quota)
            .collect()
            .await;
        Ok(artworks)
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        let ids = self.search_ids(query).await?;

        // Keep relevance order
        let artworks: Vec<Artwork> = stream::iter(ids.into_iter().take(IDS_PER_QUERY))
            .map(|id| self.object(id))
            .buffered(DETAIL_CONCURRENCY)
            .filter_map(|artwork| async move { artwork })
            .take(limit)
            .collect()
            .await;
        Ok(artworks)
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MetSearchResponse {
    total: Option<u64>,
    #[serde(rename = "objectIDs")]
    object_ids: Option<Vec<u64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetObject {
    #[serde(rename = "objectID")]
    object_id: Option<u64>,
    title: Option<String>,
    artist_display_name: Option<String>,
    artist_display_bio: Option<String>,
    object_date: Option<String>,
    medium: Option<String>,
    primary_image: Option<String>,
    primary_image_small: Option<String>,
    department: Option<String>,
    culture: Option<String>,
    classification: Option<String>,
    dimensions: Option<String>,
    credit_line: Option<String>,
    #[serde(rename = "objectURL")]
    object_url: Option<String>,
}

fn normalize(raw: MetObject) -> Result<Artwork, Rejected> {
    let native_id = raw.object_id.map(|id| id.to_string()).unwrap_or_default();
    let description = describe(&raw);

    ArtworkBuilder::new(SourceTag::Met, native_id)
        .require_title()
        .title(raw.title)
        .artist(raw.artist_display_name)
        .year(raw.object_date)
        .medium(raw.medium)
        .image_url(raw.primary_image)
        .thumbnail_url(raw.primary_image_small)
        .source_url(raw.object_url)
        .department(raw.department)
        .culture(raw.culture)
        .classification(raw.classification)
        .description(description)
        .dimensions(raw.dimensions)
        .credit_line(raw.credit_line)
        .build()
}

/// Artist bio, cultural context and department line, space separated.
fn describe(raw: &MetObject) -> Option<String> {
    let department = present(raw.department.as_deref());
    let mut parts = Vec::new();

    if let Some(bio) = present(raw.artist_display_bio.as_deref()) {
        parts.push(bio);
    }
    if let Some(culture) = present(raw.culture.as_deref()) {
        if department.as_deref() != Some(culture.as_str()) {
            let kind = present(raw.classification.as_deref())
                .unwrap_or_else(|| "work".to_string());
            parts.push(format!(
                "This {} represents {} artistic traditions.",
                kind, culture
            ));
        }
    }
    if let Some(department) = department {
        parts.push(format!("Part of the Met's {} collection.", department));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
