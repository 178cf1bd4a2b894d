//! Victoria and Albert Museum adapter.
//!
//! Search hits carry no direct image URL. The image is resolved from, in
//! order: the IIIF image base, the primary thumbnail rewritten to a larger
//! size, or the primary image id on the framemark IIIF host.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::get_json;
use super::{base_url, keep_valid, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{present, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.vam.ac.uk/v2";
const FRAMEMARK_URL: &str = "https://framemark.vam.ac.uk/collections";
const SITE_URL: &str = "https://collections.vam.ac.uk/item";

const IIIF_SIZE: &str = "full/!800,800/0/default.jpg";

const VOCABULARY: &[&str] = &[
    "painting",
    "sculpture",
    "portrait",
    "landscape",
    "textile",
    "ceramic",
    "photograph",
    "print",
];

/// V&A collections API.
pub struct VamSource {
    client: Client,
    base_url: String,
}

impl VamSource {
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
        page: u32,
    ) -> Result<Vec<Artwork>, SourceError> {
        let url = format!("{}/objects/search", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query), ("images_exist", "true")])
            .query(&[("page_size", page_size(limit)), ("page", page as usize)]);

        let response: VamResponse = get_json(SourceTag::Vam, request).await?;
        Ok(keep_valid(SourceTag::Vam, response.records, normalize))
    }
}

#[async_trait]
impl ArtSource for VamSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Vam
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let term = pick_query(VOCABULARY);
        let page = random_in(1..=50);
        debug!(source = "vam", query = term, page, quota, "Fetching artworks");
        self.search_page(term, quota, page).await
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Artwork>, SourceError> {
        self.search_page(query, limit, 1).await
    }
}

// ============================================================================
// Raw API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct VamResponse {
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VamRecord {
    system_number: Option<String>,
    object_type: Option<String>,
    materials_and_techniques: Option<String>,
    physical_description: Option<String>,
    #[serde(rename = "_primaryTitle")]
    primary_title: Option<String>,
    #[serde(rename = "_primaryMaker")]
    primary_maker: Option<VamMaker>,
    #[serde(rename = "_primaryDate")]
    primary_date: Option<String>,
    #[serde(rename = "_primaryPlace")]
    primary_place: Option<String>,
    #[serde(rename = "_primaryImageId")]
    primary_image_id: Option<String>,
    #[serde(rename = "_images")]
    images: Option<VamImages>,
}

#[derive(Debug, Deserialize)]
struct VamMaker {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VamImages {
    #[serde(rename = "_primary_thumbnail")]
    primary_thumbnail: Option<String>,
    #[serde(rename = "_iiif_image_base_url")]
    iiif_image_base_url: Option<String>,
}

/// Resolve the display image for a record.
fn image_url(raw: &VamRecord) -> Option<String> {
    let images = raw.images.as_ref();

    if let Some(base) = present(images.and_then(|i| i.iiif_image_base_url.as_deref())) {
        let separator = if base.ends_with('/') { "" } else { "/" };
        return Some(format!("{}{}{}", base, separator, IIIF_SIZE));
    }
    if let Some(thumb) = present(images.and_then(|i| i.primary_thumbnail.as_deref())) {
        return Some(thumb.replace("!100,100", "!800,800"));
    }
    present(raw.primary_image_id.as_deref())
        .map(|id| format!("{}/{}/{}", FRAMEMARK_URL, id, IIIF_SIZE))
}

fn normalize(raw: VamRecord) -> Result<Artwork, Rejected> {
    let image = image_url(&raw);
    let thumbnail = raw.images.as_ref().and_then(|i| i.primary_thumbnail.clone());
    let native_id = raw.system_number.unwrap_or_default();
    let source_url = format!("{}/{}", SITE_URL, native_id);

    ArtworkBuilder::new(SourceTag::Vam, native_id)
        .title(raw.primary_title)
        .artist(raw.primary_maker.and_then(|m| m.name))
        .year(raw.primary_date)
        .medium(raw.materials_and_techniques)
        .image_url(image)
        .thumbnail_url(thumbnail)
        .source_url(Some(source_url))
        .department(raw.object_type)
        .culture(raw.primary_place)
        .description(raw.physical_description)
        .build()
}
