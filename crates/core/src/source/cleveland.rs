//! Cleveland Museum of Art adapter (open access, CC0 only).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{strip_html, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://openaccess-api.clevelandart.org/api";
const SITE_URL: &str = "https://www.clevelandart.org/art";

const VOCABULARY: &[&str] = &[
    "impressionism",
    "portrait",
    "landscape",
    "renaissance",
    "modern",
    "abstract",
    "sculpture",
];

/// Cleveland Museum of Art open access API.
pub struct ClevelandSource {
    client: Client,
    base_url: String,
}

impl ClevelandSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
        }
    }

    async fn search_page(
        &self,
        query: &str,
        limit: usize,
        skip: u32,
    ) -> Result<Vec<Artwork>, SourceError> {
        let url = format!("{}/artworks/", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query), ("has_image", "1"), ("cc0", "1")])
            .query(&[("limit", page_size(limit)), ("skip", skip as usize)]);

        let response: ClevelandResponse = get_json(SourceTag::Cleveland, request).await?;
        Ok(keep_valid(SourceTag::Cleveland, response.data, normalize))
    }
}

#[async_trait]
impl ArtSource for ClevelandSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Cleveland
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let term = pick_query(VOCABULARY);
        let skip = random_in(0..=99);
        debug!(source = "cleveland", query = term, skip, quota, "Fetching artworks");
        self.search_page(term, quota, skip).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.search_page(query, limit, 0).await
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ClevelandResponse {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ClevelandArtwork {
    id: Option<u64>,
    accession_number: Option<String>,
    title: Option<String>,
    creation_date: Option<String>,
    technique: Option<String>,
    department: Option<String>,
    #[serde(default)]
    culture: Vec<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
    measurements: Option<String>,
    creditline: Option<String>,
    #[serde(default)]
    creators: Vec<ClevelandCreator>,
    images: Option<ClevelandImages>,
}

#[derive(Debug, Deserialize)]
struct ClevelandCreator {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClevelandImages {
    web: Option<ClevelandImage>,
}

#[derive(Debug, Deserialize)]
struct ClevelandImage {
    url: Option<String>,
}

fn normalize(raw: ClevelandArtwork) -> Result<Artwork, Rejected> {
    let native_id = raw.id.map(|id| id.to_string()).unwrap_or_default();
    let image = raw.images.and_then(|i| i.web).and_then(|w| w.url);
    let source_url = raw
        .accession_number
        .as_deref()
        .map(|accession| format!("{}/{}", SITE_URL, accession));

    ArtworkBuilder::new(SourceTag::Cleveland, native_id)
        .title(raw.title)
        .artist(raw.creators.into_iter().next().and_then(|c| c.description))
        .year(raw.creation_date)
        .medium(raw.technique)
        .image_url(image)
        .source_url(source_url)
        .department(raw.department)
        .culture(raw.culture.into_iter().next())
        .classification(raw.kind)
        .description(raw.description.as_deref().and_then(strip_html))
        .dimensions(raw.measurements)
        .credit_line(raw.creditline)
        .build()
}
