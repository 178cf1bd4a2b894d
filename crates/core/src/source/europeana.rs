//! Europeana adapter. Requires a `wskey`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.europeana.eu/record/v2";
const SITE_URL: &str = "https://www.europeana.eu/item";
const CREDENTIAL: &str = "sources.europeana.api_key";

const VOCABULARY: &[&str] = &[
    "painting",
    "portrait",
    "landscape",
    "sculpture",
    "impressionism",
    "renaissance",
    "baroque",
    "photograph",
];

/// Europeana search API.
pub struct EuropeanaSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EuropeanaSource {
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

        let url = format!("{}/search.json", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[
                ("wskey", key),
                ("query", query),
                ("qf", "TYPE:IMAGE"),
                ("qf", "MEDIA:true"),
                ("profile", "rich"),
            ])
            .query(&[("rows", page_size(rows)), ("start", start as usize)]);

        let response: EuropeanaResponse = get_json(SourceTag::Europeana, request).await?;
        Ok(keep_valid(SourceTag::Europeana, response.items, normalize))
    }
}

#[async_trait]
impl ArtSource for EuropeanaSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Europeana
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
        let start = random_in(1..=100);
        debug!(source = "europeana", query = term, start, quota, "Fetching artworks");
        self.search_page(term, quota, start).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.search_page(query, limit, 1).await
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct EuropeanaResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EuropeanaItem {
    id: Option<String>,
    title: Vec<String>,
    dc_creator: Vec<String>,
    dc_creator_lang_aware: BTreeMap<String, Vec<String>>,
    year: Vec<String>,
    dc_format: Vec<String>,
    dc_type: Vec<String>,
    edm_is_shown_by: Vec<String>,
    edm_is_shown_at: Vec<String>,
    edm_preview: Vec<String>,
    data_provider: Vec<String>,
    country: Vec<String>,
    dc_description: Vec<String>,
    dcterms_extent: Vec<String>,
    rights: Vec<String>,
}

fn first(values: Vec<String>) -> Option<String> {
    values.into_iter().next()
}

/// Language-neutral creator first, then English, then any language.
fn lang_aware_creator(mut values: BTreeMap<String, Vec<String>>) -> Option<String> {
    for lang in ["def", "en"] {
        if let Some(names) = values.remove(lang) {
            if let Some(name) = first(names) {
                return Some(name);
            }
        }
    }
    values.into_values().flatten().next()
}

fn normalize(raw: EuropeanaItem) -> Result<Artwork, Rejected> {
    let record_id = raw.id.unwrap_or_default();
    let native_id = record_id.trim_start_matches('/').replace('/', "-");
    let preview = first(raw.edm_preview);
    let image = first(raw.edm_is_shown_by).or_else(|| preview.clone());
    let source_url = first(raw.edm_is_shown_at)
        .or_else(|| Some(format!("{}{}", SITE_URL, record_id)));
    let artist = first(raw.dc_creator).or_else(|| lang_aware_creator(raw.dc_creator_lang_aware));
    let medium = first(raw.dc_format).or_else(|| first(raw.dc_type));

    ArtworkBuilder::new(SourceTag::Europeana, native_id)
        .title(first(raw.title))
        .artist(artist)
        .year(first(raw.year))
        .medium(medium)
        .image_url(image)
        .thumbnail_url(preview)
        .source_url(source_url)
        .department(first(raw.data_provider))
        .culture(first(raw.country))
        .description(first(raw.dc_description))
        .dimensions(first(raw.dcterms_extent))
        .credit_line(first(raw.rights))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_item() {
        let json = r#"{
            "success": true,
            "items": [{
                "id": "/90402/SK_A_2344",
                "title": ["The Milkmaid"],
                "dcCreatorLangAware": {"def": ["Johannes Vermeer"]},
                "year": ["1660"],
                "dcType": ["painting"],
                "edmIsShownBy": ["https://lh3.googleusercontent.com/milkmaid"],
                "edmPreview": ["https://api.europeana.eu/thumbnail/v2/url.json?uri=milkmaid"],
                "edmIsShownAt": ["http://hdl.handle.net/10934/RM0001.COLLECT.5216"],
                "dataProvider": ["Rijksmuseum"],
                "country": ["Netherlands"]
            }]
        }"#;
        let response: EuropeanaResponse = serde_json::from_str(json).unwrap();
        let artworks = keep_valid(SourceTag::Europeana, response.items, normalize);
        assert_eq!(artworks.len(), 1);

        let artwork = &artworks[0];
        assert_eq!(artwork.id, "europeana-90402-SK_A_2344");
        assert_eq!(artwork.artist, "Johannes Vermeer");
        assert_eq!(artwork.medium, "painting");
        assert_eq!(artwork.image_url, "https://lh3.googleusercontent.com/milkmaid");
        assert!(artwork.thumbnail_url.contains("thumbnail"));
        assert_eq!(artwork.department.as_deref(), Some("Rijksmuseum"));
        assert_eq!(artwork.culture.as_deref(), Some("Netherlands"));
    }

    #[test]
    fn test_image_falls_back_to_preview() {
        let item = EuropeanaItem {
            id: Some("/1/abc".to_string()),
            edm_preview: vec!["https://example.org/preview.jpg".to_string()],
            ..Default::default()
        };
        let artwork = normalize(item).unwrap();
        assert_eq!(artwork.image_url, "https://example.org/preview.jpg");
        assert_eq!(artwork.source_url, "https://www.europeana.eu/item/1/abc");
    }

    #[test]
    fn test_no_image_is_rejected() {
        let item = EuropeanaItem {
            id: Some("/1/abc".to_string()),
            title: vec!["Text only".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(item).unwrap_err(), Rejected::MissingImage);
    }

    #[test]
    fn test_lang_aware_creator_order() {
        let mut values = BTreeMap::new();
        values.insert("fr".to_string(), vec!["Auteur".to_string()]);
        values.insert("en".to_string(), vec!["Author".to_string()]);
        assert_eq!(lang_aware_creator(values).as_deref(), Some("Author"));

        let mut values = BTreeMap::new();
        values.insert("nl".to_string(), vec!["Maker".to_string()]);
        assert_eq!(lang_aware_creator(values).as_deref(), Some("Maker"));
    }
}
