//! Art Institute of Chicago adapter.
//!
//! Images are served through the museum's IIIF endpoint and are built from
//! the record's `image_id`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, random_in, ArtSource, SourceError};
use crate::artwork::{
    present, strip_html, truncate_chars, Artwork, ArtworkBuilder, Rejected, SourceTag,
};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1";
const IIIF_BASE_URL: &str = "https://www.artic.edu/iiif/2";
const SITE_URL: &str = "https://www.artic.edu/artworks";

const FIELDS: &str = "id,title,artist_display,date_display,medium_display,image_id,\
department_title,place_of_origin,classification_title,short_description,description,\
dimensions,credit_line";

const DESCRIPTION_MAX_CHARS: usize = 500;

/// Art Institute of Chicago collection API.
pub struct ArticSource {
    client: Client,
    base_url: String,
}

impl ArticSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
        }
    }
}

#[async_trait]
impl ArtSource for ArticSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Artic
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let url = format!("{}/artworks", self.base_url);
        let page = random_in(1..=100);

        debug!(source = "artic", page, quota, "Fetching artworks");

        let request = self
            .client
            .get(&url)
            .query(&[("fields", FIELDS), ("query[term][is_public_domain]", "true")])
            .query(&[("limit", page_size(quota)), ("page", page as usize)]);

        let response: ArticResponse = get_json(SourceTag::Artic, request).await?;
        Ok(keep_valid(SourceTag::Artic, response.data, normalize))
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        let url = format!("{}/artworks/search", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query), ("fields", FIELDS)])
            .query(&[("limit", page_size(limit))]);

        let response: ArticResponse = get_json(SourceTag::Artic, request).await?;
        Ok(keep_valid(SourceTag::Artic, response.data, normalize))
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArticResponse {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticArtwork {
    id: Option<u64>,
    title: Option<String>,
    artist_display: Option<String>,
    date_display: Option<String>,
    medium_display: Option<String>,
    image_id: Option<String>,
    department_title: Option<String>,
    place_of_origin: Option<String>,
    classification_title: Option<String>,
    short_description: Option<String>,
    description: Option<String>,
    dimensions: Option<String>,
    credit_line: Option<String>,
}

fn iiif_url(image_id: &str, width: u32) -> String {
    format!("{}/{}/full/{},/0/default.jpg", IIIF_BASE_URL, image_id, width)
}

fn normalize(raw: ArticArtwork) -> Result<Artwork, Rejected> {
    let native_id = raw.id.map(|id| id.to_string()).unwrap_or_default();
    let description = describe(&raw);
    let image_id = raw
        .image_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    ArtworkBuilder::new(SourceTag::Artic, native_id.as_str())
        .title(raw.title)
        .artist(raw.artist_display)
        .year(raw.date_display)
        .medium(raw.medium_display)
        .image_url(image_id.map(|id| iiif_url(id, 843)))
        .thumbnail_url(image_id.map(|id| iiif_url(id, 400)))
        .source_url(Some(format!("{}/{}", SITE_URL, native_id)))
        .department(raw.department_title)
        .culture(raw.place_of_origin)
        .classification(raw.classification_title)
        .description(description)
        .dimensions(raw.dimensions)
        .credit_line(raw.credit_line)
        .build()
}

/// Short description, then the long one cut down, then a summary line.
fn describe(raw: &ArticArtwork) -> Option<String> {
    if let Some(short) = raw.short_description.as_deref().and_then(strip_html) {
        return Some(short);
    }
    if let Some(long) = raw.description.as_deref().and_then(strip_html) {
        return Some(truncate_chars(&long, DESCRIPTION_MAX_CHARS));
    }

    let mut parts = Vec::new();
    if let Some(artist) = present(raw.artist_display.as_deref()) {
        parts.push(artist);
    }
    if let Some(place) = present(raw.place_of_origin.as_deref()) {
        parts.push(format!("Origin: {}", place));
    }
    if let Some(dept) = present(raw.department_title.as_deref()) {
        parts.push(format!("Part of the Art Institute's {} collection.", dept));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> ArticArtwork {
        ArticArtwork {
            id: Some(27992),
            title: Some("A Sunday on La Grande Jatte".to_string()),
            artist_display: Some("Georges Seurat\nFrench, 1859-1891".to_string()),
            date_display: Some("1884-86".to_string()),
            medium_display: Some("Oil on canvas".to_string()),
            image_id: Some("2d484387-2509-5e8e-2c43-22f9981972eb".to_string()),
            department_title: Some("Painting and Sculpture of Europe".to_string()),
            place_of_origin: Some("France".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_builds_iiif_urls() {
        let artwork = normalize(raw()).unwrap();
        assert_eq!(artwork.id, "artic-27992");
        assert_eq!(
            artwork.image_url,
            "https://www.artic.edu/iiif/2/2d484387-2509-5e8e-2c43-22f9981972eb/full/843,/0/default.jpg"
        );
        assert!(artwork.thumbnail_url.contains("/full/400,/"));
        assert_eq!(artwork.source_url, "https://www.artic.edu/artworks/27992");
        assert_eq!(artwork.culture.as_deref(), Some("France"));
    }

    #[test]
    fn test_normalize_without_image_is_rejected() {
        let mut record = raw();
        record.image_id = None;
        assert_eq!(normalize(record).unwrap_err(), Rejected::MissingImage);

        let mut record = raw();
        record.image_id = Some("  ".to_string());
        assert_eq!(normalize(record).unwrap_err(), Rejected::MissingImage);
    }

    #[test]
    fn test_normalize_sentinels() {
        let record = ArticArtwork {
            id: Some(1),
            image_id: Some("abc".to_string()),
            ..Default::default()
        };
        let artwork = normalize(record).unwrap();
        assert_eq!(artwork.title, "Untitled");
        assert_eq!(artwork.artist, "Unknown Artist");
        assert_eq!(artwork.year, "Date unknown");
        assert_eq!(artwork.medium, "Unknown medium");
        assert!(artwork.description.is_none());
    }

    #[test]
    fn test_describe_prefers_short_description() {
        let mut record = raw();
        record.short_description = Some("<p>A <em>pointillist</em> park scene.</p>".to_string());
        record.description = Some("<p>Long text</p>".to_string());
        assert_eq!(
            describe(&record).as_deref(),
            Some("A pointillist park scene.")
        );
    }

    #[test]
    fn test_describe_truncates_long_description() {
        let mut record = raw();
        record.description = Some(format!("<p>{}</p>", "x".repeat(800)));
        let description = describe(&record).unwrap();
        assert_eq!(description.chars().count(), 500);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_describe_falls_back_to_summary() {
        let description = describe(&raw()).unwrap();
        assert_eq!(
            description,
            "Georges Seurat\nFrench, 1859-1891. Origin: France. \
             Part of the Art Institute's Painting and Sculpture of Europe collection."
        );
    }

    #[test]
    fn test_parse_response_with_missing_fields() {
        let json = r#"{"data": [{"id": 5, "title": null, "image_id": "x"}, {"id": 6}]}"#;
        let response: ArticResponse = serde_json::from_str(json).unwrap();
        let artworks = keep_valid(SourceTag::Artic, response.data, normalize);
        assert_eq!(artworks.len(), 1);
        assert_eq!(artworks[0].id, "artic-5");
    }
}
