//! Smithsonian Open Access adapter. Requires an api.data.gov key.
//!
//! Records are deeply nested; images are resolved from the hashed asset id
//! of the first online media entry through the IDS delivery service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{present, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.si.edu/openaccess/api/v1.0";
const DELIVERY_URL: &str = "https://ids.si.edu/ids/deliveryService";
const SITE_URL: &str = "https://www.si.edu/object";
const CREDENTIAL: &str = "sources.smithsonian.api_key";

const VOCABULARY: &[&str] = &[
    "painting art",
    "portrait",
    "landscape",
    "sculpture",
    "american art",
    "photograph",
    "asian art",
    "modern art",
];

/// Smithsonian Open Access API.
pub struct SmithsonianSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SmithsonianSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            api_key: config.credential().map(str::to_string),
        }
    }

    async fn search_page(
        &self,
        query: &str,
        rows: usize,
        start: u32,
    ) -> Result<Vec<Artwork>, SourceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(CREDENTIAL))?;

        let url = format!("{}/category/art_design/search", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("api_key", key), ("q", query)])
            .query(&[("rows", page_size(rows)), ("start", start as usize)]);

        let response: SiResponse = get_json(SourceTag::Smithsonian, request).await?;
        Ok(keep_valid(
            SourceTag::Smithsonian,
            response.response.rows,
            normalize,
        ))
    }
}

#[async_trait]
impl ArtSource for SmithsonianSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Smithsonian
    }

    fn requires_credential(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let term = pick_query(VOCABULARY);
        let start = random_in(0..=99);
        debug!(source = "smithsonian", query = term, start, quota, "Fetching artworks");
        self.search_page(term, quota, start).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.search_page(query, limit, 0).await
    }
}

/// Unit codes mapped to museum names.
fn unit_name(code: &str) -> &'static str {
    match code {
        "SAAM" => "Smithsonian American Art Museum",
        "NPG" => "National Portrait Gallery",
        "HMSG" => "Hirshhorn Museum and Sculpture Garden",
        "FSG" => "Freer Gallery of Art and Arthur M. Sackler Gallery",
        "ACM" => "Anacostia Community Museum",
        "NMAAHC" => "National Museum of African American History and Culture",
        "CHNDM" => "Cooper Hewitt, Smithsonian Design Museum",
        _ => "Smithsonian",
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SiResponse {
    #[serde(default)]
    response: SiResult,
}

#[derive(Debug, Default, Deserialize)]
struct SiResult {
    #[serde(default)]
    rows: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiRow {
    id: Option<String>,
    title: Option<String>,
    unit_code: Option<String>,
    #[serde(default)]
    content: SiContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiContent {
    #[serde(default)]
    descriptive_non_repeating: SiDescriptive,
    #[serde(default)]
    indexed_structured: SiIndexed,
    #[serde(default)]
    freetext: SiFreetext,
}

#[derive(Debug, Default, Deserialize)]
struct SiDescriptive {
    record_link: Option<String>,
    online_media: Option<SiOnlineMedia>,
}

#[derive(Debug, Default, Deserialize)]
struct SiOnlineMedia {
    #[serde(default)]
    media: Vec<SiMedia>,
}

#[derive(Debug, Deserialize)]
struct SiMedia {
    #[serde(rename = "idsId")]
    ids_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SiIndexed {
    #[serde(default)]
    name: Vec<String>,
    #[serde(default)]
    date: Vec<String>,
    #[serde(default)]
    culture: Vec<String>,
    #[serde(default)]
    object_type: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiFreetext {
    #[serde(default)]
    name: Vec<SiText>,
    #[serde(default)]
    physical_description: Vec<SiText>,
    #[serde(default)]
    notes: Vec<SiText>,
    #[serde(default)]
    credit_line: Vec<SiText>,
}

#[derive(Debug, Deserialize)]
struct SiText {
    content: Option<String>,
}

fn first_text(values: Vec<SiText>) -> Option<String> {
    values.into_iter().next().and_then(|t| t.content)
}

fn normalize(raw: SiRow) -> Result<Artwork, Rejected> {
    let native_id = raw.id.unwrap_or_default();
    let SiContent {
        descriptive_non_repeating: descriptive,
        indexed_structured: indexed,
        freetext,
    } = raw.content;

    let image = descriptive
        .online_media
        .and_then(|m| m.media.into_iter().next())
        .and_then(|m| present(m.ids_id.as_deref()))
        .map(|hash| format!("{}?id={}", DELIVERY_URL, hash));
    let source_url = descriptive
        .record_link
        .or_else(|| Some(format!("{}/{}", SITE_URL, native_id)));
    let artist = indexed
        .name
        .into_iter()
        .next()
        .or_else(|| first_text(freetext.name));
    let department = raw.unit_code.as_deref().map(unit_name).unwrap_or("Smithsonian");

    ArtworkBuilder::new(SourceTag::Smithsonian, native_id)
        .title(raw.title)
        .artist(artist)
        .year(indexed.date.into_iter().next())
        .medium(first_text(freetext.physical_description))
        .image_url(image)
        .source_url(source_url)
        .department(Some(department.to_string()))
        .culture(indexed.culture.into_iter().next())
        .classification(indexed.object_type.into_iter().next())
        .description(first_text(freetext.notes))
        .credit_line(first_text(freetext.credit_line))
        .build()
}
