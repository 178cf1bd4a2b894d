//! Rijksmuseum adapter. Requires an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{present, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://www.rijksmuseum.nl/api/en";
const CREDENTIAL: &str = "sources.rijks.api_key";

const VOCABULARY: &[&str] = &[
    "rembrandt",
    "vermeer",
    "van gogh",
    "landscape",
    "portrait",
    "still life",
    "night watch",
    "golden age",
];

/// Rijksmuseum collection API.
pub struct RijksSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Fields only present on the per-object detail document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RijksDetail {
    pub year: Option<String>,
    pub medium: Option<String>,
    pub description: Option<String>,
    pub dimensions: Option<String>,
    pub credit_line: Option<String>,
    pub classification: Option<String>,
}

impl RijksSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            api_key: config.credential().map(str::to_string),
        }
    }

    fn key(&self) -> Result<&str, SourceError> {
        self.api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(CREDENTIAL))
    }

    /// Fetch the detail document for one object.
    pub async fn detail(&self, object_number: &str) -> Result<RijksDetail, SourceError> {
        let key = self.key()?;
        let url = format!("{}/collection/{}", self.base_url, object_number);
        let request = self.client.get(&url).query(&[("key", key)]);

        let response: RijksDetailResponse = get_json(SourceTag::Rijks, request).await?;
        Ok(response.art_object.into())
    }
}

#[async_trait]
impl ArtSource for RijksSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Rijks
    }

    fn requires_credential(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let key = self.key()?;
        let term = pick_query(VOCABULARY);
        let page = random_in(1..=10);
        debug!(source = "rijks", query = term, page, quota, "Fetching artworks");

        let url = format!("{}/collection", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("key", key), ("q", term), ("imgonly", "True")])
            .query(&[("ps", page_size(quota)), ("p", page as usize)]);

        let response: RijksResponse = get_json(SourceTag::Rijks, request).await?;
        Ok(keep_valid(SourceTag::Rijks, response.art_objects, normalize))
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksResponse {
    #[serde(default)]
    art_objects: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksObject {
    object_number: Option<String>,
    title: Option<String>,
    long_title: Option<String>,
    principal_or_first_maker: Option<String>,
    web_image: Option<RijksImage>,
    header_image: Option<RijksImage>,
    links: Option<RijksLinks>,
}

#[derive(Debug, Deserialize)]
struct RijksImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RijksLinks {
    web: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksDetailResponse {
    art_object: RijksDetailObject,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksDetailObject {
    dating: Option<RijksDating>,
    physical_medium: Option<String>,
    label: Option<RijksLabel>,
    sc_label_line: Option<String>,
    #[serde(default)]
    dimensions: Vec<RijksDimension>,
    acquisition: Option<RijksAcquisition>,
    classification: Option<RijksClassification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksDating {
    presenting_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RijksLabel {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RijksDimension {
    #[serde(rename = "type")]
    kind: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksAcquisition {
    credit_line: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RijksClassification {
    #[serde(default)]
    icon_class_description: Vec<String>,
}

fn normalize(raw: RijksObject) -> Result<Artwork, Rejected> {
    let image = raw.web_image.and_then(|i| i.url);
    let thumbnail = raw.header_image.and_then(|i| i.url);

    ArtworkBuilder::new(SourceTag::Rijks, raw.object_number.unwrap_or_default())
        .title(raw.title)
        .artist(raw.principal_or_first_maker)
        .image_url(image)
        .thumbnail_url(thumbnail)
        .source_url(raw.links.and_then(|l| l.web))
        .description(raw.long_title)
        .build()
}

impl From<RijksDetailObject> for RijksDetail {
    fn from(raw: RijksDetailObject) -> Self {
        let description = raw
            .label
            .and_then(|l| present(l.description.as_deref()))
            .or_else(|| present(raw.sc_label_line.as_deref()));

        let dimensions: Vec<String> = raw
            .dimensions
            .into_iter()
            .filter_map(|d| match (d.kind, d.value) {
                (Some(kind), Some(value)) => Some(format!("{}: {}", kind, value)),
                _ => None,
            })
            .collect();

        Self {
            year: raw
                .dating
                .and_then(|d| present(d.presenting_date.as_deref())),
            medium: present(raw.physical_medium.as_deref()),
            description,
            dimensions: (!dimensions.is_empty()).then(|| dimensions.join(", ")),
            credit_line: raw
                .acquisition
                .and_then(|a| present(a.credit_line.as_deref())),
            classification: raw
                .classification
                .and_then(|c| c.icon_class_description.into_iter().next()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collection_item() {
        let json = r#"{
            "artObjects": [
                {
                    "objectNumber": "SK-C-5",
                    "title": "The Night Watch",
                    "longTitle": "The Night Watch, Rembrandt van Rijn, 1642",
                    "principalOrFirstMaker": "Rembrandt van Rijn",
                    "webImage": {"url": "https://lh3.googleusercontent.com/nightwatch=s0"},
                    "headerImage": {"url": "https://lh3.googleusercontent.com/nightwatch-header=s0"},
                    "links": {"web": "http://www.rijksmuseum.nl/en/collection/SK-C-5"}
                },
                {
                    "objectNumber": "SK-A-1",
                    "title": "No image",
                    "webImage": null
                }
            ]
        }"#;
        let response: RijksResponse = serde_json::from_str(json).unwrap();
        let artworks = keep_valid(SourceTag::Rijks, response.art_objects, normalize);
        assert_eq!(artworks.len(), 1);

        let artwork = &artworks[0];
        assert_eq!(artwork.id, "rijks-SK-C-5");
        assert_eq!(artwork.artist, "Rembrandt van Rijn");
        assert_eq!(artwork.year, "Date unknown");
        assert!(artwork.thumbnail_url.contains("nightwatch-header"));
        assert_eq!(
            artwork.description.as_deref(),
            Some("The Night Watch, Rembrandt van Rijn, 1642")
        );
    }

    #[test]
    fn test_detail_conversion() {
        let json = r#"{
            "artObject": {
                "dating": {"presentingDate": "1642"},
                "physicalMedium": "oil on canvas",
                "label": {"description": null},
                "scLabelLine": "Rembrandt van Rijn (1606-1669), oil on canvas, 1642",
                "dimensions": [
                    {"type": "height", "value": "379.5", "unit": "cm"},
                    {"type": "width", "value": "453.5", "unit": "cm"}
                ],
                "acquisition": {"creditLine": "On loan from the City of Amsterdam"},
                "classification": {"iconClassDescription": ["militia", "captain"]}
            }
        }"#;
        let response: RijksDetailResponse = serde_json::from_str(json).unwrap();
        let detail = RijksDetail::from(response.art_object);

        assert_eq!(detail.year.as_deref(), Some("1642"));
        assert_eq!(detail.medium.as_deref(), Some("oil on canvas"));
        assert_eq!(
            detail.description.as_deref(),
            Some("Rembrandt van Rijn (1606-1669), oil on canvas, 1642")
        );
        assert_eq!(
            detail.dimensions.as_deref(),
            Some("height: 379.5, width: 453.5")
        );
        assert_eq!(
            detail.credit_line.as_deref(),
            Some("On loan from the City of Amsterdam")
        );
        assert_eq!(detail.classification.as_deref(), Some("militia"));
    }

    #[test]
    fn test_detail_conversion_empty() {
        assert_eq!(
            RijksDetail::from(RijksDetailObject::default()),
            RijksDetail::default()
        );
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let source = RijksSource::new(Client::new(), &SourceConfig::default());
        assert!(!source.is_configured());

        let err = source.try_fetch(10).await.unwrap_err();
        assert!(err.is_missing_credential());
        assert!(source.fetch(10).await.is_empty());
        assert!(source.detail("SK-C-5").await.unwrap_err().is_missing_credential());
    }
}
