//! Harvard Art Museums adapter. Requires an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.harvardartmuseums.org";
const SITE_URL: &str = "https://harvardartmuseums.org/collections/object";
const CREDENTIAL: &str = "sources.harvard.api_key";

const VOCABULARY: &[&str] = &[
    "painting",
    "sculpture",
    "photograph",
    "print",
    "asian",
    "european",
    "american",
    "ancient",
];

/// Harvard Art Museums API.
pub struct HarvardSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HarvardSource {
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
        limit: usize,
        page: u32,
        random_order: bool,
    ) -> Result<Vec<Artwork>, SourceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(CREDENTIAL))?;

        let url = format!("{}/object", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("apikey", key), ("q", query), ("hasimage", "1")])
            .query(&[("size", page_size(limit)), ("page", page as usize)]);
        if random_order {
            request = request.query(&[("sort", "random")]);
        }

        let response: HarvardResponse = get_json(SourceTag::Harvard, request).await?;
        Ok(keep_valid(SourceTag::Harvard, response.records, normalize))
    }
}

#[async_trait]
impl ArtSource for HarvardSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Harvard
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
        let page = random_in(1..=10);
        debug!(source = "harvard", query = term, page, quota, "Fetching artworks");
        self.search_page(term, quota, page, true).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.search_page(query, limit, 1, false).await
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct HarvardResponse {
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
struct HarvardObject {
    objectid: Option<u64>,
    title: Option<String>,
    dated: Option<String>,
    medium: Option<String>,
    technique: Option<String>,
    primaryimageurl: Option<String>,
    url: Option<String>,
    department: Option<String>,
    culture: Option<String>,
    classification: Option<String>,
    description: Option<String>,
    dimensions: Option<String>,
    creditline: Option<String>,
    #[serde(default)]
    people: Vec<HarvardPerson>,
}

#[derive(Debug, Deserialize)]
struct HarvardPerson {
    name: Option<String>,
    role: Option<String>,
}

/// The person credited as "Artist", else whoever is listed first.
fn artist(people: Vec<HarvardPerson>) -> Option<String> {
    let index = people
        .iter()
        .position(|p| p.role.as_deref() == Some("Artist"))
        .unwrap_or(0);
    people.into_iter().nth(index).and_then(|p| p.name)
}

fn normalize(raw: HarvardObject) -> Result<Artwork, Rejected> {
    let native_id = raw.objectid.map(|id| id.to_string()).unwrap_or_default();
    let thumbnail = raw
        .primaryimageurl
        .as_deref()
        .map(|url| url.replace("full/full", "full/400,"));
    let source_url = raw
        .url
        .or_else(|| Some(format!("{}/{}", SITE_URL, native_id)));

    ArtworkBuilder::new(SourceTag::Harvard, native_id)
        .title(raw.title)
        .artist(artist(raw.people))
        .year(raw.dated)
        .medium(raw.medium.or(raw.technique))
        .image_url(raw.primaryimageurl)
        .thumbnail_url(thumbnail)
        .source_url(source_url)
        .department(raw.department)
        .culture(raw.culture)
        .classification(raw.classification)
        .description(raw.description)
        .dimensions(raw.dimensions)
        .credit_line(raw.creditline)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, role: &str) -> HarvardPerson {
        HarvardPerson {
            name: Some(name.to_string()),
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn test_artist_prefers_artist_role() {
        let people = vec![person("Jane Donor", "Donor"), person("Kitagawa Utamaro", "Artist")];
        assert_eq!(artist(people).as_deref(), Some("Kitagawa Utamaro"));

        let people = vec![person("Unknown Workshop", "Maker")];
        assert_eq!(artist(people).as_deref(), Some("Unknown Workshop"));

        assert_eq!(artist(Vec::new()), None);
    }

    #[test]
    fn test_normalize_record() {
        let json = r#"{
            "records": [{
                "objectid": 299843,
                "title": "Self-Portrait Dedicated to Paul Gauguin",
                "dated": "1888",
                "medium": "Oil on canvas",
                "primaryimageurl": "https://nrs.harvard.edu/urn-3:HUAM:DDC251942/full/full/0/default.jpg",
                "department": "Department of Modern and Contemporary Art",
                "culture": "Dutch",
                "classification": "Paintings",
                "creditline": "Bequest from the Collection of Maurice Wertheim",
                "people": [{"name": "Vincent van Gogh", "role": "Artist"}]
            }]
        }"#;
        let response: HarvardResponse = serde_json::from_str(json).unwrap();
        let artworks = keep_valid(SourceTag::Harvard, response.records, normalize);
        assert_eq!(artworks.len(), 1);

        let artwork = &artworks[0];
        assert_eq!(artwork.id, "harvard-299843");
        assert_eq!(artwork.artist, "Vincent van Gogh");
        assert!(artwork.thumbnail_url.ends_with("/full/400,/0/default.jpg"));
        assert_eq!(
            artwork.source_url,
            "https://harvardartmuseums.org/collections/object/299843"
        );
    }

    #[test]
    fn test_normalize_without_image_is_rejected() {
        let raw = HarvardObject {
            objectid: Some(1),
            title: Some("Lost".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize(raw).unwrap_err(), Rejected::MissingImage);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let config = SourceConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let source = HarvardSource::new(Client::new(), &config);
        assert!(!source.is_configured());
        assert!(source.try_search("gogh", 5).await.unwrap_err().is_missing_credential());
    }
}
